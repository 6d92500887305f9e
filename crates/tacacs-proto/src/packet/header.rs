use super::code::{FLAG_SINGLE_CONNECT, FLAG_UNENCRYPTED, MAJOR_VERSION, PacketType, Version};
use super::PacketError;

/// TACACS+ packet header as defined in RFC 8907 Section 4.1
///
/// ```text
///  1 2 3 4 5 6 7 8  1 2 3 4 5 6 7 8  1 2 3 4 5 6 7 8  1 2 3 4 5 6 7 8
/// +----------------+----------------+----------------+----------------+
/// |major  | minor  |                |                |                |
/// |version| version|      type      |     seq_no     |   flags        |
/// +----------------+----------------+----------------+----------------+
/// |                                                                   |
/// |                            session_id                             |
/// +----------------+----------------+----------------+----------------+
/// |                                                                   |
/// |                              length                               |
/// +----------------+----------------+----------------+----------------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Major/minor protocol version
    pub version: Version,
    /// Packet type (authentication, authorization, accounting)
    pub packet_type: PacketType,
    /// Sequence number within the session, starting at 1
    pub seq_no: u8,
    /// Flag bits (`FLAG_UNENCRYPTED`, `FLAG_SINGLE_CONNECT`)
    pub flags: u8,
    /// Random session identifier shared by every packet of one session
    pub session_id: u32,
    /// Length of the body in bytes, excluding this header
    pub length: u32,
}

impl Header {
    /// Fixed header size on the wire
    pub const SIZE: usize = 12;

    /// Encode the header to its fixed 12-byte form
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut buffer = [0u8; Self::SIZE];
        buffer[0] = self.version.as_u8();
        buffer[1] = self.packet_type.as_u8();
        buffer[2] = self.seq_no;
        buffer[3] = self.flags;
        buffer[4..8].copy_from_slice(&self.session_id.to_be_bytes());
        buffer[8..12].copy_from_slice(&self.length.to_be_bytes());
        buffer
    }

    /// Decode a header from the first 12 bytes of `data`
    pub fn decode(data: &[u8]) -> Result<Self, PacketError> {
        if data.len() < Self::SIZE {
            return Err(PacketError::InvalidLength(data.len()));
        }

        let version = Version::from_u8(data[0]);
        if version.major() != MAJOR_VERSION {
            return Err(PacketError::InvalidVersion(data[0]));
        }

        let packet_type =
            PacketType::from_u8(data[1]).ok_or(PacketError::InvalidPacketType(data[1]))?;

        Ok(Header {
            version,
            packet_type,
            seq_no: data[2],
            flags: data[3],
            session_id: u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
            length: u32::from_be_bytes([data[8], data[9], data[10], data[11]]),
        })
    }

    /// True unless the unencrypted flag is set
    pub fn is_encrypted(&self) -> bool {
        self.flags & FLAG_UNENCRYPTED == 0
    }

    pub fn single_connect(&self) -> bool {
        self.flags & FLAG_SINGLE_CONNECT != 0
    }
}
