//! Client error types

use tacacs_proto::PacketError;
use thiserror::Error;

/// Errors raised while talking to a TACACS+ server
#[derive(Error, Debug)]
pub enum ClientError {
    /// TCP connection could not be established
    #[error("Failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// The probe deadline fired during the named stage
    #[error("Timed out during {0}")]
    Timeout(&'static str),

    /// IO error on an established connection
    #[error("Exchange error: {0}")]
    Exchange(#[from] std::io::Error),

    /// Reply does not fit the exchange (wrong session, sequence or body)
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Packet could not be encoded or decoded
    #[error("Malformed packet: {0}")]
    Format(#[from] PacketError),

    /// The one-byte sequence number would wrap
    #[error("Sequence number space exhausted")]
    SequenceExhausted,

    /// Session was already closed
    #[error("Session is closed")]
    Closed,
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
