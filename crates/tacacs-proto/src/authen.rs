//! Authentication bodies (RFC 8907 Section 5)
//!
//! Only the START and REPLY bodies are modelled; CONTINUE belongs to the
//! multi-round ASCII/CHAP flows this crate does not drive.

use crate::packet::PacketError;
use std::io::{Cursor, Read, Write};

/// Reply flag: the client should not echo user input
pub const REPLY_FLAG_NOECHO: u8 = 0x01;

/// Authentication action requested by a START
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AuthenAction {
    /// Login (1)
    Login = 1,
    /// Change password (2)
    ChangePass = 2,
    /// Send authentication (4)
    SendAuth = 4,
}

impl AuthenAction {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(AuthenAction::Login),
            2 => Some(AuthenAction::ChangePass),
            4 => Some(AuthenAction::SendAuth),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Authentication method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AuthenType {
    Ascii = 1,
    /// Password authentication: the password travels once in the START data field
    Pap = 2,
    Chap = 3,
    MsChap = 5,
    MsChapV2 = 6,
}

impl AuthenType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(AuthenType::Ascii),
            2 => Some(AuthenType::Pap),
            3 => Some(AuthenType::Chap),
            5 => Some(AuthenType::MsChap),
            6 => Some(AuthenType::MsChapV2),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Service requesting authentication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AuthenService {
    None = 0,
    Login = 1,
    Enable = 2,
    Ppp = 3,
    Pt = 5,
    Rcmd = 6,
    X25 = 7,
    Nasi = 8,
    FwProxy = 9,
}

impl AuthenService {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(AuthenService::None),
            1 => Some(AuthenService::Login),
            2 => Some(AuthenService::Enable),
            3 => Some(AuthenService::Ppp),
            5 => Some(AuthenService::Pt),
            6 => Some(AuthenService::Rcmd),
            7 => Some(AuthenService::X25),
            8 => Some(AuthenService::Nasi),
            9 => Some(AuthenService::FwProxy),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Authentication REPLY status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AuthenStatus {
    /// Pass (1)
    Pass = 1,
    /// Fail (2)
    Fail = 2,
    /// GetData (3) - server wants another round with arbitrary data
    GetData = 3,
    /// GetUser (4) - server wants another round with the username
    GetUser = 4,
    /// GetPass (5) - server wants another round with the password
    GetPass = 5,
    /// Restart (6)
    Restart = 6,
    /// Error (7)
    Error = 7,
    /// Follow (0x21) - client should use another server
    Follow = 0x21,
}

impl AuthenStatus {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(AuthenStatus::Pass),
            2 => Some(AuthenStatus::Fail),
            3 => Some(AuthenStatus::GetData),
            4 => Some(AuthenStatus::GetUser),
            5 => Some(AuthenStatus::GetPass),
            6 => Some(AuthenStatus::Restart),
            7 => Some(AuthenStatus::Error),
            0x21 => Some(AuthenStatus::Follow),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// True for statuses asking the client for another CONTINUE round
    pub fn requests_continuation(self) -> bool {
        matches!(
            self,
            AuthenStatus::GetData | AuthenStatus::GetUser | AuthenStatus::GetPass
        )
    }
}

/// Authentication START body
///
/// ```text
/// +----------------+----------------+----------------+----------------+
/// |    action      |    priv_lvl    |  authen_type   | authen_service |
/// +----------------+----------------+----------------+----------------+
/// |    user_len    |    port_len    |  rem_addr_len  |    data_len    |
/// +----------------+----------------+----------------+----------------+
/// |    user ...    |    port ...    |  rem_addr ...  |    data ...    |
/// +----------------+----------------+----------------+----------------+
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenStart {
    pub action: AuthenAction,
    pub priv_lvl: u8,
    pub authen_type: AuthenType,
    pub authen_service: AuthenService,
    pub user: String,
    pub port: String,
    pub rem_addr: String,
    pub data: Vec<u8>,
}

impl AuthenStart {
    /// Size of the fixed part preceding the variable fields
    pub const FIXED_SIZE: usize = 8;

    /// Build a single-round PAP login START at privilege level 0
    pub fn pap_login(user: &str, port: &str, rem_addr: &str, password: Vec<u8>) -> Self {
        AuthenStart {
            action: AuthenAction::Login,
            priv_lvl: 0,
            authen_type: AuthenType::Pap,
            authen_service: AuthenService::Login,
            user: user.to_string(),
            port: port.to_string(),
            rem_addr: rem_addr.to_string(),
            data: password,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, PacketError> {
        let fields: [(&'static str, &[u8]); 4] = [
            ("user", self.user.as_bytes()),
            ("port", self.port.as_bytes()),
            ("rem_addr", self.rem_addr.as_bytes()),
            ("data", &self.data),
        ];

        let mut lengths = [0u8; 4];
        for (slot, &(field, value)) in lengths.iter_mut().zip(fields.iter()) {
            *slot = u8::try_from(value.len()).map_err(|_| PacketError::FieldTooLong {
                field,
                length: value.len(),
                max: u8::MAX as usize,
            })?;
        }

        let total: usize = fields.iter().map(|(_, value)| value.len()).sum();
        let mut buffer = Vec::with_capacity(Self::FIXED_SIZE + total);
        buffer.write_all(&[
            self.action.as_u8(),
            self.priv_lvl,
            self.authen_type.as_u8(),
            self.authen_service.as_u8(),
        ])?;
        buffer.write_all(&lengths)?;
        for (_, value) in fields {
            buffer.write_all(value)?;
        }

        Ok(buffer)
    }

    pub fn decode(data: &[u8]) -> Result<Self, PacketError> {
        if data.len() < Self::FIXED_SIZE {
            return Err(PacketError::InvalidLength(data.len()));
        }

        let mut cursor = Cursor::new(data);
        let mut fixed = [0u8; Self::FIXED_SIZE];
        cursor.read_exact(&mut fixed)?;

        let action = AuthenAction::from_u8(fixed[0]).ok_or(PacketError::InvalidCode {
            field: "action",
            value: fixed[0],
        })?;
        let authen_type = AuthenType::from_u8(fixed[2]).ok_or(PacketError::InvalidCode {
            field: "authen_type",
            value: fixed[2],
        })?;
        let authen_service = AuthenService::from_u8(fixed[3]).ok_or(PacketError::InvalidCode {
            field: "authen_service",
            value: fixed[3],
        })?;

        let declared: usize = fixed[4..].iter().map(|&len| len as usize).sum();
        let actual = data.len() - Self::FIXED_SIZE;
        if declared != actual {
            return Err(PacketError::FieldLengthMismatch { declared, actual });
        }

        Ok(AuthenStart {
            action,
            priv_lvl: fixed[1],
            authen_type,
            authen_service,
            user: read_string(&mut cursor, fixed[4] as usize, "user")?,
            port: read_string(&mut cursor, fixed[5] as usize, "port")?,
            rem_addr: read_string(&mut cursor, fixed[6] as usize, "rem_addr")?,
            data: read_field(&mut cursor, fixed[7] as usize)?,
        })
    }
}

/// Authentication REPLY body
///
/// ```text
/// +----------------+----------------+----------------+----------------+
/// |     status     |      flags     |        server_msg_len           |
/// +----------------+----------------+----------------+----------------+
/// |           data_len              |        server_msg ...
/// +----------------+----------------+----------------+----------------+
/// |           data ...
/// +----------------+----------------+
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenReply {
    pub status: AuthenStatus,
    pub flags: u8,
    pub server_msg: String,
    pub data: Vec<u8>,
}

impl AuthenReply {
    /// Size of the fixed part preceding the variable fields
    pub const FIXED_SIZE: usize = 6;

    pub fn new(status: AuthenStatus) -> Self {
        AuthenReply {
            status,
            flags: 0,
            server_msg: String::new(),
            data: Vec::new(),
        }
    }

    pub fn with_server_msg(mut self, message: &str) -> Self {
        self.server_msg = message.to_string();
        self
    }

    pub fn encode(&self) -> Result<Vec<u8>, PacketError> {
        let msg_len = u16_length("server_msg", self.server_msg.len())?;
        let data_len = u16_length("data", self.data.len())?;

        let mut buffer =
            Vec::with_capacity(Self::FIXED_SIZE + self.server_msg.len() + self.data.len());
        buffer.write_all(&[self.status.as_u8(), self.flags])?;
        buffer.write_all(&msg_len.to_be_bytes())?;
        buffer.write_all(&data_len.to_be_bytes())?;
        buffer.write_all(self.server_msg.as_bytes())?;
        buffer.write_all(&self.data)?;

        Ok(buffer)
    }

    pub fn decode(data: &[u8]) -> Result<Self, PacketError> {
        if data.len() < Self::FIXED_SIZE {
            return Err(PacketError::InvalidLength(data.len()));
        }

        let mut cursor = Cursor::new(data);
        let mut fixed = [0u8; Self::FIXED_SIZE];
        cursor.read_exact(&mut fixed)?;

        let status = AuthenStatus::from_u8(fixed[0]).ok_or(PacketError::InvalidCode {
            field: "status",
            value: fixed[0],
        })?;
        let msg_len = u16::from_be_bytes([fixed[2], fixed[3]]) as usize;
        let data_len = u16::from_be_bytes([fixed[4], fixed[5]]) as usize;

        let actual = data.len() - Self::FIXED_SIZE;
        if msg_len + data_len != actual {
            return Err(PacketError::FieldLengthMismatch {
                declared: msg_len + data_len,
                actual,
            });
        }

        // Server messages are operator-facing text; tolerate odd encodings
        let server_msg = String::from_utf8_lossy(&read_field(&mut cursor, msg_len)?).into_owned();

        Ok(AuthenReply {
            status,
            flags: fixed[1],
            server_msg,
            data: read_field(&mut cursor, data_len)?,
        })
    }
}

fn u16_length(field: &'static str, length: usize) -> Result<u16, PacketError> {
    u16::try_from(length).map_err(|_| PacketError::FieldTooLong {
        field,
        length,
        max: u16::MAX as usize,
    })
}

fn read_field(cursor: &mut Cursor<&[u8]>, length: usize) -> Result<Vec<u8>, PacketError> {
    let mut buffer = vec![0u8; length];
    cursor.read_exact(&mut buffer)?;
    Ok(buffer)
}

fn read_string(
    cursor: &mut Cursor<&[u8]>,
    length: usize,
    field: &'static str,
) -> Result<String, PacketError> {
    String::from_utf8(read_field(cursor, length)?).map_err(|_| PacketError::InvalidUtf8(field))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pap_login_defaults() {
        let start = AuthenStart::pap_login("test", "probe", "10.0.0.1", b"password".to_vec());
        assert_eq!(start.action, AuthenAction::Login);
        assert_eq!(start.priv_lvl, 0);
        assert_eq!(start.authen_type, AuthenType::Pap);
        assert_eq!(start.authen_service, AuthenService::Login);
        assert_eq!(start.data, b"password");
    }

    #[test]
    fn test_authen_start_layout() {
        let start = AuthenStart::pap_login("ab", "p", "", b"xyz".to_vec());
        let encoded = start.encode().unwrap();
        assert_eq!(
            encoded,
            vec![1, 0, 2, 1, 2, 1, 0, 3, b'a', b'b', b'p', b'x', b'y', b'z']
        );
        assert_eq!(AuthenStart::decode(&encoded).unwrap(), start);
    }

    #[test]
    fn test_authen_start_field_too_long() {
        let long_user = "u".repeat(256);
        let start = AuthenStart::pap_login(&long_user, "probe", "", Vec::new());
        assert!(matches!(
            start.encode(),
            Err(PacketError::FieldTooLong { field: "user", .. })
        ));
    }

    #[test]
    fn test_authen_start_length_mismatch() {
        let start = AuthenStart::pap_login("test", "probe", "", b"pw".to_vec());
        let mut encoded = start.encode().unwrap();
        encoded.push(0);
        assert!(matches!(
            AuthenStart::decode(&encoded),
            Err(PacketError::FieldLengthMismatch {
                declared: 11,
                actual: 12
            })
        ));
    }

    #[test]
    fn test_authen_start_invalid_action() {
        let mut encoded = AuthenStart::pap_login("a", "b", "c", Vec::new())
            .encode()
            .unwrap();
        encoded[0] = 3;
        assert!(matches!(
            AuthenStart::decode(&encoded),
            Err(PacketError::InvalidCode {
                field: "action",
                value: 3
            })
        ));
    }

    #[test]
    fn test_authen_reply_layout() {
        let mut reply = AuthenReply::new(AuthenStatus::Fail).with_server_msg("no");
        reply.flags = REPLY_FLAG_NOECHO;
        reply.data = vec![9];

        let encoded = reply.encode().unwrap();
        assert_eq!(encoded, vec![2, 1, 0, 2, 0, 1, b'n', b'o', 9]);
        assert_eq!(AuthenReply::decode(&encoded).unwrap(), reply);
    }

    #[test]
    fn test_authen_reply_short_body() {
        assert!(matches!(
            AuthenReply::decode(&[1, 0, 0]),
            Err(PacketError::InvalidLength(3))
        ));
    }

    #[test]
    fn test_authen_reply_length_mismatch() {
        // Declares a 4-byte server message but carries 2 bytes
        let data = [1, 0, 0, 4, 0, 0, b'h', b'i'];
        assert!(matches!(
            AuthenReply::decode(&data),
            Err(PacketError::FieldLengthMismatch { .. })
        ));
    }

    #[test]
    fn test_authen_reply_unknown_status() {
        let data = [0x22, 0, 0, 0, 0, 0];
        assert!(matches!(
            AuthenReply::decode(&data),
            Err(PacketError::InvalidCode {
                field: "status",
                value: 0x22
            })
        ));
    }

    #[test]
    fn test_status_codes() {
        let known = [1u8, 2, 3, 4, 5, 6, 7, 0x21];
        for code in known {
            let status = AuthenStatus::from_u8(code).unwrap();
            assert_eq!(status.as_u8(), code);
        }
        assert!(AuthenStatus::from_u8(0).is_none());
        assert!(AuthenStatus::from_u8(8).is_none());

        assert!(AuthenStatus::GetPass.requests_continuation());
        assert!(!AuthenStatus::Pass.requests_continuation());
        assert!(!AuthenStatus::Follow.requests_continuation());
    }
}
