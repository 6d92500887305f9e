//! TACACS+ client
//!
//! A [`TcpSession`] owns one connection and its session state; an
//! [`AuthenExchange`] drives a single-round PAP login over any
//! [`Transport`].

pub mod error;
pub mod exchange;
pub mod session;

pub use error::{ClientError, ClientResult};
pub use exchange::{AuthenExchange, AuthenOutcome, ExchangeState};
pub use session::{ConnectMode, DEFAULT_PORT, SessionOptions, TcpSession, Transport};
