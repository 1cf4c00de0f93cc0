//! Magic packet dispatch. One ephemeral broadcast socket per send; the
//! socket is released on every exit path. Success means the datagram was
//! handed to the network stack, not that the device woke up (WoL has no
//! acknowledgement).

use std::net::UdpSocket;

use log::{info, warn};
use serde::Serialize;

use super::mac::MacAddress;
use super::packet::magic_packet;

/// Subnet-limited broadcast, used when a device has no broadcast configured.
pub const DEFAULT_BROADCAST: &str = "255.255.255.255";

/// Conventional Wake-on-LAN destination port (discard).
pub const DEFAULT_WOL_PORT: u16 = 9;

/// Outcome of a single wake attempt. `device` is empty for raw-MAC wakes.
#[derive(Debug, Clone, Serialize)]
pub struct WakeResult {
    pub success: bool,
    pub device: String,
    pub mac: String,
    pub message: String,
}

/// Sends magic packets. Holds the fallback broadcast address and port for
/// devices that do not configure their own.
pub struct WakeDispatcher {
    broadcast: String,
    port: u16,
}

impl WakeDispatcher {
    pub fn new(broadcast: impl Into<String>, port: u16) -> Self {
        Self {
            broadcast: broadcast.into(),
            port,
        }
    }

    /// Parse, build and send a magic packet for one target. Validation and
    /// transport failures both fold into the result; this never panics and
    /// never aborts a sibling send.
    pub fn wake_mac(
        &self,
        device: &str,
        mac: &str,
        broadcast: Option<&str>,
        port: Option<u16>,
    ) -> WakeResult {
        let parsed = match mac.parse::<MacAddress>() {
            Ok(parsed) => parsed,
            Err(e) => {
                return WakeResult {
                    success: false,
                    device: device.to_string(),
                    mac: mac.to_string(),
                    message: e.to_string(),
                };
            }
        };

        let normalized = parsed.to_string();
        let target_broadcast = broadcast.unwrap_or(&self.broadcast);
        let target_port = port.unwrap_or(self.port);

        match Self::send(&parsed, target_broadcast, target_port) {
            Ok(()) => {
                info!(
                    "Sent magic packet for {} to {}:{}",
                    normalized, target_broadcast, target_port
                );
                WakeResult {
                    success: true,
                    device: device.to_string(),
                    mac: normalized.clone(),
                    message: format!(
                        "Magic packet sent to {}:{}",
                        target_broadcast, target_port
                    ),
                }
            }
            Err(e) => {
                warn!("Failed to send magic packet for {}: {}", normalized, e);
                WakeResult {
                    success: false,
                    device: device.to_string(),
                    mac: normalized,
                    message: format!("Failed to send magic packet: {}", e),
                }
            }
        }
    }

    /// Send one datagram. No retries; retry policy belongs to the caller.
    fn send(mac: &MacAddress, broadcast: &str, port: u16) -> std::io::Result<()> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_broadcast(true)?;
        socket.send_to(&magic_packet(mac), (broadcast, port))?;
        Ok(())
    }
}

impl Default for WakeDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_BROADCAST, DEFAULT_WOL_PORT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Bind a loopback listener so a send is observable without touching
    /// the real network.
    fn loopback_listener() -> (UdpSocket, u16) {
        let socket = UdpSocket::bind("127.0.0.1:0").expect("Failed to bind listener");
        let port = socket.local_addr().expect("Failed to read local addr").port();
        (socket, port)
    }

    #[test]
    fn test_wake_mac_delivers_magic_packet() {
        let (listener, port) = loopback_listener();
        let dispatcher = WakeDispatcher::new("127.0.0.1", port);

        let result = dispatcher.wake_mac("server", "00:11:22:33:44:55", None, None);
        assert!(result.success, "unexpected failure: {}", result.message);
        assert_eq!(result.device, "server");
        assert_eq!(result.mac, "00:11:22:33:44:55");

        let mut buf = [0u8; 256];
        let (len, _) = listener.recv_from(&mut buf).expect("Failed to receive datagram");
        assert_eq!(len, 102);
        assert_eq!(&buf[..6], &[0xff; 6]);
        assert_eq!(&buf[6..12], &[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
    }

    #[test]
    fn test_wake_mac_explicit_broadcast_overrides_default() {
        let (listener, port) = loopback_listener();
        // Dispatcher defaults point nowhere useful; the per-call override wins.
        let dispatcher = WakeDispatcher::default();

        let result = dispatcher.wake_mac("", "aa:bb:cc:dd:ee:ff", Some("127.0.0.1"), Some(port));
        assert!(result.success, "unexpected failure: {}", result.message);
        assert_eq!(result.device, "");
        assert_eq!(result.mac, "AA:BB:CC:DD:EE:FF");

        let mut buf = [0u8; 256];
        let (len, _) = listener.recv_from(&mut buf).expect("Failed to receive datagram");
        assert_eq!(len, 102);
    }

    #[test]
    fn test_wake_mac_invalid_mac_never_sends() {
        let dispatcher = WakeDispatcher::default();
        let result = dispatcher.wake_mac("server", "not-a-mac", None, None);
        assert!(!result.success);
        assert_eq!(result.mac, "not-a-mac");
        assert!(result.message.contains("invalid MAC address"));
    }

    #[test]
    fn test_wake_mac_unresolvable_broadcast_reports_failure() {
        let dispatcher = WakeDispatcher::default();
        let result =
            dispatcher.wake_mac("server", "00:11:22:33:44:55", Some("wol.invalid"), None);
        assert!(!result.success);
        assert!(result.message.contains("Failed to send magic packet"));
    }
}
