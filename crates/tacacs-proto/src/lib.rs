//! TACACS+ Protocol Implementation
//!
//! This crate provides the client-side pieces of TACACS+ (RFC 8907) needed
//! for a single-round password authentication.
//!
//! # Features
//!
//! - 12-byte packet header encoding and decoding
//! - Authentication START and REPLY bodies with length validation
//! - MD5 pseudo-pad body obfuscation
//! - Random session identifier generation
//!
//! # Example
//!
//! ```rust
//! use tacacs_proto::{AuthenStart, Body, Packet, Version};
//! use tacacs_proto::obfuscation::generate_session_id;
//!
//! // Build a PAP login START for sequence number 1
//! let start = AuthenStart::pap_login("alice", "probe", "192.0.2.10", b"password".to_vec());
//! let packet = Packet::new(Version::ONE, 1, 0, generate_session_id(), Body::AuthenStart(start)).unwrap();
//!
//! // Encode with the shared secret; the body is obfuscated on the wire
//! let bytes = packet.encode(b"secret").unwrap();
//! assert_eq!(Packet::decode(&bytes, b"secret").unwrap(), packet);
//! ```

pub mod authen;
pub mod obfuscation;
pub mod packet;

pub use authen::{
    AuthenAction, AuthenReply, AuthenService, AuthenStart, AuthenStatus, AuthenType,
    REPLY_FLAG_NOECHO,
};
pub use obfuscation::{apply_pad, generate_session_id, pseudo_pad};
pub use packet::{
    Body, FLAG_SINGLE_CONNECT, FLAG_UNENCRYPTED, Header, MAJOR_VERSION, Packet, PacketError,
    PacketType, Version,
};
