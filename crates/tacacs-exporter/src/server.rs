//! HTTP endpoint serving probe results
//!
//! `GET <telemetry path>?target=<host[:port]>&module=<name>` runs one probe
//! and answers with its gauges in the Prometheus text format.

use crate::config::Config;
use crate::metrics::PrometheusMetrics;
use crate::probe::probe;
use axum::{
    Router,
    extract::{ConnectInfo, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to listen on {address}: {source}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid listen address: {0}")]
    InvalidAddress(String),
    #[error("Invalid telemetry path: {0}")]
    InvalidPath(String),
}

/// Shared, read-only handler state
#[derive(Clone)]
pub struct ExporterState {
    config: Arc<Config>,
    telemetry_path: Arc<str>,
}

/// Query parameters of a probe request
#[derive(Debug, Deserialize)]
pub struct ProbeParams {
    pub target: Option<String>,
    pub module: Option<String>,
}

/// Probe endpoint handler
async fn probe_handler(
    State(state): State<ExporterState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    Query(params): Query<ProbeParams>,
) -> Response {
    let target = match params.target.as_deref().filter(|t| !t.is_empty()) {
        Some(target) => target,
        None => return (StatusCode::BAD_REQUEST, "no target specified").into_response(),
    };

    let module_name = match params.module.as_deref().filter(|m| !m.is_empty()) {
        Some(name) => name,
        None => return (StatusCode::BAD_REQUEST, "no module specified").into_response(),
    };

    let module = match state.config.module(module_name) {
        Some(module) => module,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                format!("unknown module {:?}", module_name),
            )
                .into_response();
        }
    };

    debug!(target_addr = %target, module = %module_name, remote = %remote, "Probe requested");

    let remote_addr = remote.to_string();
    let result = probe(target, &remote_addr, module).await;
    let metrics = PrometheusMetrics::from_probe(&result);

    (
        StatusCode::OK,
        [("Content-Type", "text/plain; version=0.0.4; charset=utf-8")],
        metrics.into_content(),
    )
        .into_response()
}

/// Landing page handler
async fn landing_handler(State(state): State<ExporterState>) -> Html<String> {
    Html(format!(
        "<html>
<head><title>TACACS Exporter</title></head>
<body>
<h1>TACACS Exporter</h1>
<a href=\"{path}\">Metrics</a>
</body>
</html>
",
        path = state.telemetry_path
    ))
}

/// Create the exporter router
pub fn create_router(config: Arc<Config>, telemetry_path: &str) -> Router {
    let state = ExporterState {
        config,
        telemetry_path: Arc::from(telemetry_path),
    };

    Router::new()
        .route("/", get(landing_handler))
        .route(telemetry_path, get(probe_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Parse a listen address; a bare `:port` binds every IPv4 interface
pub fn parse_listen_address(address: &str) -> Result<SocketAddr, ServerError> {
    if let Some(port) = address.strip_prefix(':') {
        let port: u16 = port
            .parse()
            .map_err(|_| ServerError::InvalidAddress(address.to_string()))?;
        return Ok(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port));
    }

    address
        .parse()
        .map_err(|_| ServerError::InvalidAddress(address.to_string()))
}

fn validate_telemetry_path(path: &str) -> Result<(), ServerError> {
    if !path.starts_with('/') || path == "/" {
        return Err(ServerError::InvalidPath(format!(
            "{:?} must start with '/' and must not be the root path",
            path
        )));
    }
    Ok(())
}

/// HTTP server bound to its listening socket
pub struct ExporterServer {
    listener: TcpListener,
    router: Router,
}

impl ExporterServer {
    /// Validate the telemetry path and bind the listener
    pub async fn bind(
        config: Arc<Config>,
        address: SocketAddr,
        telemetry_path: &str,
    ) -> Result<Self, ServerError> {
        validate_telemetry_path(telemetry_path)?;

        let listener = TcpListener::bind(address)
            .await
            .map_err(|source| ServerError::Bind { address, source })?;

        Ok(ExporterServer {
            listener,
            router: create_router(config, telemetry_path),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve requests until `shutdown` completes
    pub async fn run<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!(address = %self.local_addr()?, "Listening for probe requests");

        axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await?;

        Ok(())
    }
}
