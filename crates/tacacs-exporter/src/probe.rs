//! Probe orchestration
//!
//! One probe owns one connection, one deadline and one outcome. Nothing is
//! retried: a second attempt would distort the measured latency.

use crate::client::session::deadline_after;
use crate::client::{
    AuthenExchange, AuthenOutcome, ClientResult, DEFAULT_PORT, SessionOptions, TcpSession,
    Transport,
};
use crate::config::Module;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tacacs_proto::AuthenStatus;
use tokio::time::Instant;
use tracing::{debug, error};

/// Outcome of a single probe
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    /// Exchange time on success, time until failure otherwise
    pub duration: Duration,
    /// Reply status; `None` when the probe failed
    pub status: Option<AuthenStatus>,
    pub success: bool,
}

impl ProbeResult {
    pub fn status_code(&self) -> Option<u8> {
        self.status.map(AuthenStatus::as_u8)
    }
}

/// A single probe invocation
#[derive(Debug, Clone, Copy)]
pub struct ProbeRequest<'a> {
    /// Server address, `host` or `host:port`
    pub target: &'a str,
    /// Caller's address, sent as the START remote address
    pub remote_addr: &'a str,
    pub module: &'a Module,
}

impl ProbeRequest<'_> {
    /// Run the probe under the module's timeout
    pub async fn execute(self) -> ProbeResult {
        let started = Instant::now();
        let deadline = deadline_after(started, self.module.timeout);

        match self.run(deadline).await {
            Ok((outcome, elapsed)) => {
                debug!(
                    target_addr = %self.target,
                    username = %self.module.username,
                    status = ?outcome.status,
                    server_msg = %outcome.server_msg,
                    "TACACS+ reply received"
                );
                ProbeResult {
                    duration: elapsed,
                    status: Some(outcome.status),
                    success: true,
                }
            }
            Err(e) => {
                error!(
                    target_addr = %self.target,
                    username = %self.module.username,
                    error = %e,
                    "Error sending TACACS+ authentication start"
                );
                ProbeResult {
                    duration: started.elapsed(),
                    status: None,
                    success: false,
                }
            }
        }
    }

    async fn run(&self, deadline: Instant) -> ClientResult<(AuthenOutcome, Duration)> {
        let address = resolve_target(self.target);
        let mut session =
            TcpSession::open(&address, SessionOptions::from_module(self.module), deadline).await?;

        let mut exchange = AuthenExchange::pap_login(self.module, self.remote_addr);
        let begin = Instant::now();
        let result = exchange.run(&mut session).await;
        let elapsed = begin.elapsed();

        session.close().await;
        result.map(|outcome| (outcome, elapsed))
    }
}

/// Probe `target` once with `module`
pub async fn probe(target: &str, remote_addr: &str, module: &Module) -> ProbeResult {
    ProbeRequest {
        target,
        remote_addr,
        module,
    }
    .execute()
    .await
}

/// Append the well-known port to targets given without one
pub fn resolve_target(target: &str) -> String {
    if target.parse::<SocketAddr>().is_ok() {
        return target.to_string();
    }
    if let Ok(ip) = target.parse::<IpAddr>() {
        return SocketAddr::new(ip, DEFAULT_PORT).to_string();
    }
    if let Some(inner) = target.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
        if let Ok(ip) = inner.parse::<IpAddr>() {
            return SocketAddr::new(ip, DEFAULT_PORT).to_string();
        }
    }
    if target.contains(':') {
        target.to_string()
    } else {
        format!("{}:{}", target, DEFAULT_PORT)
    }
}
