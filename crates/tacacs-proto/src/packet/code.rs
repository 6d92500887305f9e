/// Major protocol version carried in the high nibble of the version byte
pub const MAJOR_VERSION: u8 = 0xc;

/// Header flag: the body is sent in the clear (never set by this client)
pub const FLAG_UNENCRYPTED: u8 = 0x01;

/// Header flag: the sender supports several sessions on one connection
pub const FLAG_SINGLE_CONNECT: u8 = 0x04;

/// TACACS+ packet types as defined in RFC 8907 Section 4.1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
    /// Authentication (1)
    Authentication = 1,
    /// Authorization (2)
    Authorization = 2,
    /// Accounting (3)
    Accounting = 3,
}

impl PacketType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(PacketType::Authentication),
            2 => Some(PacketType::Authorization),
            3 => Some(PacketType::Accounting),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Protocol version byte, split into major and minor nibbles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    major: u8,
    minor: u8,
}

impl Version {
    /// Default minor version, used by ASCII login and the other packet types
    pub const DEFAULT: Version = Version {
        major: MAJOR_VERSION,
        minor: 0,
    };

    /// Minor version one, required for PAP, CHAP and MS-CHAP authentication
    pub const ONE: Version = Version {
        major: MAJOR_VERSION,
        minor: 1,
    };

    pub fn new(major: u8, minor: u8) -> Self {
        Version {
            major: major & 0x0f,
            minor: minor & 0x0f,
        }
    }

    pub fn major(self) -> u8 {
        self.major
    }

    pub fn minor(self) -> u8 {
        self.minor
    }

    pub fn from_u8(value: u8) -> Self {
        Version {
            major: value >> 4,
            minor: value & 0x0f,
        }
    }

    pub fn as_u8(self) -> u8 {
        (self.major << 4) | self.minor
    }
}
