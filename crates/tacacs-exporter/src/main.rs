use clap::Parser;
use std::process;
use std::sync::Arc;
use tacacs_exporter::{Config, ExporterServer, parse_listen_address};
use tracing::{error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// TACACS+ Exporter - probes TACACS+ servers with a live PAP authentication
#[derive(Parser, Debug)]
#[command(author, about, long_about = None)]
#[command(name = "tacacs_exporter")]
struct Cli {
    /// Path to the configuration file
    #[arg(long = "config", value_name = "FILE", default_value = "config.yml")]
    config_path: String,

    /// HTTP server listen address
    #[arg(long = "web.listen-address", value_name = "ADDR", default_value = ":9949")]
    listen_address: String,

    /// Path under which to expose metrics
    #[arg(long = "web.telemetry-path", value_name = "PATH", default_value = "/metrics")]
    telemetry_path: String,

    /// Log level: trace, debug, info, warn, error
    #[arg(long = "log.level", value_name = "LEVEL", default_value = "info")]
    log_level: String,

    /// Validate configuration and exit (doesn't start server)
    #[arg(long)]
    validate: bool,

    /// Print version information and exit
    #[arg(short = 'V', long)]
    version: bool,
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => warn!("Received interrupt signal, shutting down"),
        Err(e) => {
            error!("Failed to listen for interrupt signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.version {
        println!("TACACS Exporter v{}", env!("CARGO_PKG_VERSION"));
        process::exit(0);
    }

    let level: LevelFilter = match cli.log_level.parse() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Invalid log level {:?}: {}", cli.log_level, e);
            process::exit(1);
        }
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string())))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting TACACS Exporter v{}", env!("CARGO_PKG_VERSION"));

    let config = match Config::from_file(&cli.config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Error loading config from {}: {}", cli.config_path, e);
            process::exit(1);
        }
    };

    if cli.validate {
        println!("✓ Configuration validated successfully!");
        println!();
        println!("Modules:");
        for name in config.module_names() {
            if let Some(module) = config.module(name) {
                println!(
                    "  {} - user {}, port {}, timeout {}s, mode {:?}",
                    name,
                    module.username,
                    module.port,
                    module.timeout.as_secs(),
                    module.connect_mode
                );
            }
        }
        process::exit(0);
    }

    let address = match parse_listen_address(&cli.listen_address) {
        Ok(addr) => addr,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    let server = match ExporterServer::bind(Arc::new(config), address, &cli.telemetry_path).await {
        Ok(srv) => srv,
        Err(e) => {
            error!("HTTP server failed to start: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = server.run(shutdown_signal()).await {
        error!("HTTP server error: {}", e);
        process::exit(1);
    }

    info!("Server stopped");
}
