//! OS signal handling.
//!
//! # Responsibilities
//! - Wait for SIGTERM or SIGINT (Ctrl-C elsewhere)
//! - Report which signal arrived
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - A handler that cannot be installed degrades to Ctrl-C instead of
//!   aborting startup

/// Resolve once the process has been asked to stop.
pub async fn shutdown_requested() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut terminate), Ok(mut interrupt)) => {
                tokio::select! {
                    _ = terminate.recv() => tracing::info!(signal = "SIGTERM", "Shutdown signal received"),
                    _ = interrupt.recv() => tracing::info!(signal = "SIGINT", "Shutdown signal received"),
                }
                return;
            }
            (Err(error), _) | (_, Err(error)) => {
                tracing::warn!(%error, "Failed to install signal handlers, falling back to Ctrl-C");
            }
        }
    }

    ctrl_c().await;
}

async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!(signal = "ctrl-c", "Shutdown signal received"),
        Err(error) => {
            tracing::error!(%error, "Failed to listen for Ctrl-C, only an external kill will stop the process");
            std::future::pending::<()>().await;
        }
    }
}
