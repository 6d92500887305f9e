use super::{Header, PacketType, Version};
use crate::authen::{AuthenReply, AuthenStart};
use crate::obfuscation::obfuscate_body;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PacketError {
    #[error("Invalid packet length: {0}")]
    InvalidLength(usize),
    #[error("Unsupported version byte: {0:#04x}")]
    InvalidVersion(u8),
    #[error("Invalid packet type: {0}")]
    InvalidPacketType(u8),
    #[error("Invalid {field} value: {value}")]
    InvalidCode { field: &'static str, value: u8 },
    #[error("Header declares {declared} body bytes but {actual} are present")]
    BodyLengthMismatch { declared: usize, actual: usize },
    #[error("Field lengths declare {declared} bytes but {actual} remain")]
    FieldLengthMismatch { declared: usize, actual: usize },
    #[error("Field {field} too long: {length} bytes (max {max})")]
    FieldTooLong {
        field: &'static str,
        length: usize,
        max: usize,
    },
    #[error("Field {0} is not valid UTF-8")]
    InvalidUtf8(&'static str),
    #[error("Packet body too large: {0} bytes")]
    BodyTooLarge(usize),
    #[error("Shared secret must not be empty")]
    EmptySecret,
    #[error("Unexpected packet: {0}")]
    UnexpectedPacket(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Typed packet body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Authentication START, sent by the client with sequence number 1
    AuthenStart(AuthenStart),
    /// Authentication REPLY, sent by the server with an even sequence number
    AuthenReply(AuthenReply),
}

impl Body {
    pub fn packet_type(&self) -> PacketType {
        match self {
            Body::AuthenStart(_) | Body::AuthenReply(_) => PacketType::Authentication,
        }
    }

    /// Encode the body in the clear
    pub fn encode(&self) -> Result<Vec<u8>, PacketError> {
        match self {
            Body::AuthenStart(start) => start.encode(),
            Body::AuthenReply(reply) => reply.encode(),
        }
    }

    /// Decode a clear body, picking the body type from the header
    ///
    /// Within an authentication session the client sends odd sequence
    /// numbers and the server even ones; sequence 1 is always the START.
    fn decode(header: &Header, data: &[u8]) -> Result<Self, PacketError> {
        match header.packet_type {
            PacketType::Authentication => match header.seq_no {
                1 => Ok(Body::AuthenStart(AuthenStart::decode(data)?)),
                n if n % 2 == 0 => Ok(Body::AuthenReply(AuthenReply::decode(data)?)),
                n => Err(PacketError::UnexpectedPacket(format!(
                    "authentication CONTINUE with sequence {} is not supported",
                    n
                ))),
            },
            other => Err(PacketError::UnexpectedPacket(format!(
                "{:?} packets are not supported",
                other
            ))),
        }
    }
}

/// A complete TACACS+ packet: header plus typed body
///
/// The header's `length` always matches the encoded size of `body`; both
/// constructors enforce it and `encode` rejects packets where it was changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub header: Header,
    pub body: Body,
}

impl Packet {
    /// Largest body this implementation accepts from the wire
    pub const MAX_BODY_LENGTH: usize = 1 << 18;

    /// Build a packet, deriving the header type and length from the body
    pub fn new(
        version: Version,
        seq_no: u8,
        flags: u8,
        session_id: u32,
        body: Body,
    ) -> Result<Self, PacketError> {
        let length = body.encode()?.len();
        if length > Self::MAX_BODY_LENGTH {
            return Err(PacketError::BodyTooLarge(length));
        }

        Ok(Packet {
            header: Header {
                version,
                packet_type: body.packet_type(),
                seq_no,
                flags,
                session_id,
                length: length as u32,
            },
            body,
        })
    }

    /// Encode header and obfuscated body to wire bytes
    pub fn encode(&self, secret: &[u8]) -> Result<Vec<u8>, PacketError> {
        let mut body = self.body.encode()?;

        if self.header.length as usize != body.len() {
            return Err(PacketError::BodyLengthMismatch {
                declared: self.header.length as usize,
                actual: body.len(),
            });
        }

        if self.header.is_encrypted() {
            obfuscate_body(&mut body, &self.header, secret)?;
        }

        let mut buffer = Vec::with_capacity(Header::SIZE + body.len());
        buffer.extend_from_slice(&self.header.encode());
        buffer.extend_from_slice(&body);
        Ok(buffer)
    }

    /// Decode a complete packet (header followed by exactly one body)
    pub fn decode(data: &[u8], secret: &[u8]) -> Result<Self, PacketError> {
        let header = Header::decode(data)?;
        Self::from_parts(header, data[Header::SIZE..].to_vec(), secret)
    }

    /// Decode a packet whose header was already read off the wire
    pub fn from_parts(header: Header, mut body: Vec<u8>, secret: &[u8]) -> Result<Self, PacketError> {
        let declared = header.length as usize;
        if declared > Self::MAX_BODY_LENGTH {
            return Err(PacketError::BodyTooLarge(declared));
        }
        if declared != body.len() {
            return Err(PacketError::BodyLengthMismatch {
                declared,
                actual: body.len(),
            });
        }

        if header.is_encrypted() {
            obfuscate_body(&mut body, &header, secret)?;
        }

        let body = Body::decode(&header, &body)?;
        Ok(Packet { header, body })
    }
}
