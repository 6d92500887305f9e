//! Single-round authentication exchange
//!
//! ```text
//! INIT --send START--> AWAIT_REPLY --receive REPLY--> DONE
//!   \________________________\__________any error___> FAILED
//! ```
//!
//! Only PAP is driven: exactly one REPLY is read after the START. A reply
//! asking for more data ends the exchange; its status is reported as-is.

use crate::client::error::{ClientError, ClientResult};
use crate::client::session::Transport;
use crate::config::Module;
use tacacs_proto::{AuthenStart, AuthenStatus, Body, Packet, Version};
use tracing::debug;

/// Exchange progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    /// Nothing sent yet
    Init,
    /// START sent, waiting for the REPLY
    AwaitReply,
    /// REPLY received and accepted
    Done,
    /// Aborted by an error or timeout
    Failed,
}

/// Result of a completed exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenOutcome {
    /// Reply status, reported verbatim
    pub status: AuthenStatus,
    /// Server message for the user, possibly empty
    pub server_msg: String,
}

/// Authentication exchange state machine
pub struct AuthenExchange {
    state: ExchangeState,
    start: AuthenStart,
}

impl AuthenExchange {
    pub fn new(start: AuthenStart) -> Self {
        AuthenExchange {
            state: ExchangeState::Init,
            start,
        }
    }

    /// PAP login for the module's user, sent from `remote_addr`
    pub fn pap_login(module: &Module, remote_addr: &str) -> Self {
        Self::new(AuthenStart::pap_login(
            &module.username,
            &module.port,
            remote_addr,
            module.password.as_bytes().to_vec(),
        ))
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }

    /// Run the exchange once over `transport`
    pub async fn run<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
    ) -> ClientResult<AuthenOutcome> {
        if self.state != ExchangeState::Init {
            return Err(ClientError::Protocol(format!(
                "exchange cannot run from state {:?}",
                self.state
            )));
        }

        match self.drive(transport).await {
            Ok(outcome) => {
                self.state = ExchangeState::Done;
                Ok(outcome)
            }
            Err(e) => {
                self.state = ExchangeState::Failed;
                Err(e)
            }
        }
    }

    async fn drive<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
    ) -> ClientResult<AuthenOutcome> {
        let session_id = transport.session_id();
        let seq_no = transport.next_sequence()?;

        let start = Packet::new(
            Version::ONE,
            seq_no,
            transport.header_flags(),
            session_id,
            Body::AuthenStart(self.start.clone()),
        )?;
        transport.send(&start).await?;
        self.state = ExchangeState::AwaitReply;

        let expected_seq = transport.next_sequence()?;
        let reply = transport.receive().await?;

        if reply.header.session_id != session_id {
            return Err(ClientError::Protocol(format!(
                "reply session id {:#010x} does not match {:#010x}",
                reply.header.session_id, session_id
            )));
        }
        if reply.header.seq_no != expected_seq {
            return Err(ClientError::Protocol(format!(
                "reply sequence {} but expected {}",
                reply.header.seq_no, expected_seq
            )));
        }

        let reply = match reply.body {
            Body::AuthenReply(reply) => reply,
            other => {
                return Err(ClientError::Protocol(format!(
                    "expected authentication REPLY, got {:?}",
                    other
                )));
            }
        };

        if reply.status.requests_continuation() {
            debug!(
                session_id = session_id,
                status = ?reply.status,
                "Server requested another round; not continuing"
            );
        }

        Ok(AuthenOutcome {
            status: reply.status,
            server_msg: reply.server_msg,
        })
    }
}
