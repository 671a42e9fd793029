//! cors-relay
//!
//! A forwarding relay that lets browser code call third-party HTTP APIs.
//!
//! # Architecture Overview
//!
//! ```text
//!     Browser                         ┌──────────────────────────────────────────┐
//!     GET /https://api.example.com/x  │                CORS RELAY                │
//!     ────────────────────────────────┼─▶ request id ─▶ trace ─▶ cors ─▶ limit  │
//!                                     │                                   │      │
//!                                     │                                   ▼      │
//!                                     │       target ─▶ allow-list ─▶ sanitize   │
//!                                     │                                   │      │
//!     ◀── upstream body + CORS ───────┼──────── streamed response ◀── reqwest ◀─┼── Upstream
//!                                     └──────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;

use cors_relay::config::load_config;
use cors_relay::lifecycle::startup;
use cors_relay::observability::logging;

#[derive(Parser)]
#[command(name = "cors-relay")]
#[command(version, about = "Forwarding HTTP relay that adds CORS headers", long_about = None)]
struct Cli {
    /// Optional TOML config file. Environment variables override its values.
    #[arg(short, long, env = "CORS_RELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Listening port (overrides PORT and the config file).
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.listener.port = port;
    }

    logging::init(&config.observability.log_level);

    tracing::info!("cors-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.socket_address(),
        allowed_origins = ?config.cors.allowed_origins,
        allowed_target_hosts = ?config.targets.allowed_hosts,
        response_timeout_secs = config.upstream.response_timeout_secs,
        max_body_bytes = config.limits.max_body_bytes,
        "Configuration loaded"
    );

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
