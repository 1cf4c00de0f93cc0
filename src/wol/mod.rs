//! Wake-on-LAN core: MAC parsing, magic packet construction, UDP dispatch
//! and batch fan-out.

mod batch;
mod dispatch;
mod mac;
mod packet;

pub use batch::{WakeMultipleResponse, WakeSummary, wake_all, wake_named};
pub use dispatch::{DEFAULT_BROADCAST, DEFAULT_WOL_PORT, WakeDispatcher, WakeResult};
pub use mac::{InvalidMacAddress, MacAddress};
pub use packet::{MAGIC_PACKET_LEN, magic_packet};
