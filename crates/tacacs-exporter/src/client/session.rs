//! Session transport over TCP

use crate::client::error::{ClientError, ClientResult};
use crate::config::Module;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tacacs_proto::{FLAG_SINGLE_CONNECT, Header, Packet, PacketError, generate_session_id};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, trace};

/// Well-known TACACS+ port
pub const DEFAULT_PORT: u16 = 49;

/// `start + limit`, saturating at roughly thirty years out
pub(crate) fn deadline_after(start: Instant, limit: Duration) -> Instant {
    start
        .checked_add(limit)
        .unwrap_or_else(|| start + Duration::from_secs(86_400 * 365 * 30))
}

/// Connection reuse mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectMode {
    /// One session per connection
    #[default]
    Single,
    /// Request single-connect; reusable once the server echoes the flag
    Multiplex,
    /// Request single-connect and assume the server honours it
    LegacyMultiplex,
}

/// Session-scoped settings taken from a module
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub secret: Vec<u8>,
    pub mode: ConnectMode,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

impl SessionOptions {
    pub fn from_module(module: &Module) -> Self {
        SessionOptions {
            secret: module.secret.clone(),
            mode: module.connect_mode,
            read_timeout: module.timeout,
            write_timeout: module.timeout,
        }
    }
}

/// Packet transport capability used by the authentication exchange
#[async_trait]
pub trait Transport: Send {
    /// Session identifier stamped on every packet of the session
    fn session_id(&self) -> u32;

    /// Flags for outgoing packet headers
    fn header_flags(&self) -> u8;

    /// Next sequence number: 1 on the first call, then +1 per call
    fn next_sequence(&mut self) -> ClientResult<u8>;

    /// Write one packet with an obfuscated body
    async fn send(&mut self, packet: &Packet) -> ClientResult<()>;

    /// Read and decode one packet
    async fn receive(&mut self) -> ClientResult<Packet>;

    /// Whether the connection may carry another exchange
    fn is_reusable(&self) -> bool;

    /// Release the connection; safe to call more than once
    async fn close(&mut self);
}

/// One TCP connection plus the state of the session it carries
///
/// Every read, write and the initial connect is bounded by the earlier of
/// the per-operation timeout and the session deadline.
pub struct TcpSession {
    stream: Option<TcpStream>,
    peer: SocketAddr,
    options: SessionOptions,
    deadline: Instant,
    session_id: u32,
    sequence: u8,
    reusable: bool,
}

impl TcpSession {
    /// Connect to `address` and start a fresh session
    pub async fn open(
        address: &str,
        options: SessionOptions,
        deadline: Instant,
    ) -> ClientResult<Self> {
        let stream = match timeout_at(deadline, TcpStream::connect(address)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(ClientError::Connect {
                    address: address.to_string(),
                    source,
                });
            }
            Err(_) => return Err(ClientError::Timeout("connect")),
        };
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr()?;

        let mut session = TcpSession {
            stream: Some(stream),
            peer,
            options,
            deadline,
            session_id: 0,
            sequence: 0,
            reusable: false,
        };
        session.assign_session();

        debug!(
            peer = %peer,
            session_id = session.session_id,
            mode = ?session.options.mode,
            "TACACS+ connection opened"
        );

        Ok(session)
    }

    /// Start a new session on this connection: random non-zero id, sequence reset
    pub fn assign_session(&mut self) -> u32 {
        self.session_id = generate_session_id();
        self.sequence = 0;
        self.session_id
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    pub fn mode(&self) -> ConnectMode {
        self.options.mode
    }

    fn io_deadline(&self, limit: Duration) -> Instant {
        std::cmp::min(deadline_after(Instant::now(), limit), self.deadline)
    }
}

#[async_trait]
impl Transport for TcpSession {
    fn session_id(&self) -> u32 {
        self.session_id
    }

    fn header_flags(&self) -> u8 {
        match self.options.mode {
            ConnectMode::Single => 0,
            ConnectMode::Multiplex | ConnectMode::LegacyMultiplex => FLAG_SINGLE_CONNECT,
        }
    }

    fn next_sequence(&mut self) -> ClientResult<u8> {
        self.sequence = self
            .sequence
            .checked_add(1)
            .ok_or(ClientError::SequenceExhausted)?;
        Ok(self.sequence)
    }

    async fn send(&mut self, packet: &Packet) -> ClientResult<()> {
        let bytes = packet.encode(&self.options.secret)?;
        let deadline = self.io_deadline(self.options.write_timeout);
        let stream = self.stream.as_mut().ok_or(ClientError::Closed)?;

        timeout_at(deadline, stream.write_all(&bytes))
            .await
            .map_err(|_| ClientError::Timeout("write"))??;

        trace!(
            session_id = packet.header.session_id,
            seq_no = packet.header.seq_no,
            length = packet.header.length,
            "Packet sent"
        );
        Ok(())
    }

    async fn receive(&mut self) -> ClientResult<Packet> {
        let deadline = self.io_deadline(self.options.read_timeout);
        let stream = self.stream.as_mut().ok_or(ClientError::Closed)?;

        let mut header_buf = [0u8; Header::SIZE];
        timeout_at(deadline, stream.read_exact(&mut header_buf))
            .await
            .map_err(|_| ClientError::Timeout("read"))??;

        let header = Header::decode(&header_buf)?;
        let length = header.length as usize;
        if length > Packet::MAX_BODY_LENGTH {
            return Err(PacketError::BodyTooLarge(length).into());
        }

        let mut body = vec![0u8; length];
        timeout_at(deadline, stream.read_exact(&mut body))
            .await
            .map_err(|_| ClientError::Timeout("read"))??;

        let packet = Packet::from_parts(header, body, &self.options.secret)?;

        match self.options.mode {
            ConnectMode::Single => {}
            ConnectMode::Multiplex => self.reusable = packet.header.single_connect(),
            ConnectMode::LegacyMultiplex => self.reusable = true,
        }

        trace!(
            session_id = packet.header.session_id,
            seq_no = packet.header.seq_no,
            length = packet.header.length,
            "Packet received"
        );
        Ok(packet)
    }

    fn is_reusable(&self) -> bool {
        self.stream.is_some() && self.reusable
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                debug!(peer = %self.peer, error = %e, "Error shutting down TACACS+ connection");
            }
            debug!(peer = %self.peer, session_id = self.session_id, "TACACS+ connection closed");
        }
    }
}
