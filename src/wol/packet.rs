//! Magic packet construction: 6 synchronization bytes of 0xFF followed by
//! the target MAC repeated 16 times, 102 bytes total. NIC firmware matches
//! this layout byte-for-byte; anything else is silently ignored.

use super::mac::MacAddress;

pub const MAGIC_PACKET_LEN: usize = 102;

const SYNC_STREAM: [u8; 6] = [0xff; 6];
const MAC_REPEAT_COUNT: usize = 16;

/// Build the 102-byte Wake-on-LAN payload for a validated MAC address.
pub fn magic_packet(mac: &MacAddress) -> [u8; MAGIC_PACKET_LEN] {
    let mut packet = [0u8; MAGIC_PACKET_LEN];
    packet[..6].copy_from_slice(&SYNC_STREAM);

    let octets = mac.octets();
    for i in 0..MAC_REPEAT_COUNT {
        let start = 6 + i * 6;
        packet[start..start + 6].copy_from_slice(&octets);
    }

    packet
}
