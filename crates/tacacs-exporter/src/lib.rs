//! TACACS+ Exporter
//!
//! Black-box probing of TACACS+ servers: every scrape performs one live PAP
//! authentication and reports its latency and reply status as Prometheus
//! gauges.
//!
//! # Features
//!
//! - Async TCP client built on Tokio with a single deadline per probe
//! - Single-round PAP authentication over the `tacacs-proto` codec
//! - YAML configuration of named probe modules
//! - Fresh metrics per scrape, no state shared between requests
//!
//! # Example
//!
//! ```rust,no_run
//! use tacacs_exporter::{Config, probe};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config.yml")?;
//!     let module = config.module("default").ok_or("no such module")?;
//!
//!     let result = probe("192.0.2.1:49", "192.0.2.10", module).await;
//!     println!("success={} status={:?}", result.success, result.status_code());
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod metrics;
pub mod probe;
pub mod server;

pub use client::{AuthenExchange, AuthenOutcome, ClientError, ConnectMode, TcpSession, Transport};
pub use config::{Config, ConfigError, Module, ModuleConfig};
pub use metrics::{Gauge, ProbeGauges, PrometheusMetrics};
pub use probe::{ProbeRequest, ProbeResult, probe};
pub use server::{ExporterServer, ServerError, create_router, parse_listen_address};
