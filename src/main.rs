//! Alecton server daemon.
//!
//! ```text
//!                 ┌──────────────────────────────────────────────┐
//!   alectonctl ──▶│ rpc listener ──▶ api router ──▶ Applications │
//!                 │                                              │
//!   probes ──────▶│ http listener ──▶ /healthz /readyz /metrics  │
//!                 │                                              │
//!   SIGTERM ─────▶│ Server::stop: rpc drain → http (deadline)    │
//!                 │               → cancel process token         │
//!                 └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use alecton::api::UnimplementedApplications;
use alecton::config::{load_config, ServerConfig};
use alecton::lifecycle::{self, shutdown_requested};
use alecton::observability::{logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "alecton", version, about = "Alecton deployment-orchestration server")]
struct Args {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "ALECTON_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };

    logging::init_logging(&config.observability).context("failed to initialize logging")?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "alecton starting");
    tracing::info!(
        rpc_address = %config.rpc.bind_address,
        http_address = %config.http.bind_address,
        http_shutdown_timeout_secs = config.shutdown.http_timeout_secs,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let token = CancellationToken::new();

    let metrics_handle = if config.observability.metrics_enabled {
        let handle = metrics::install_recorder().context("failed to install metrics recorder")?;
        metrics::spawn_upkeep(handle.clone(), token.clone());
        Some(handle)
    } else {
        None
    };

    let server = lifecycle::start(&config, UnimplementedApplications, metrics_handle, token)
        .await
        .context("failed to start server")?;

    shutdown_requested().await;

    let report = server.stop().await;
    if report.is_clean() {
        tracing::info!(elapsed_ms = report.elapsed.as_millis() as u64, "Shutdown complete");
    } else {
        tracing::warn!(
            elapsed_ms = report.elapsed.as_millis() as u64,
            rpc = ?report.rpc,
            http = ?report.http,
            "Shutdown completed with errors"
        );
    }

    Ok(())
}
