mod code;
mod header;
#[allow(clippy::module_inception)]
mod packet;

pub use code::{FLAG_SINGLE_CONNECT, FLAG_UNENCRYPTED, MAJOR_VERSION, PacketType, Version};
pub use header::Header;
pub use packet::{Body, Packet, PacketError};
