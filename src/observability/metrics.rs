//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define server metrics (remote calls, shutdown timing, forced closes)
//! - Install the Prometheus recorder rendered by the HTTP listener
//! - Keep the recorder's histograms trimmed until the process stops
//!
//! # Metrics
//! - `alecton_rpc_requests_total` (counter): remote calls by method, status code
//! - `alecton_rpc_request_duration_seconds` (histogram): remote call latency by method
//! - `alecton_shutdown_duration_seconds` (histogram): time spent in `Server::stop`
//! - `alecton_listener_forced_closes_total` (counter): connections dropped at a shutdown deadline
//!
//! # Design Decisions
//! - Low-overhead metric updates through the `metrics` facade
//! - Labels limited to listener, method and status code

use std::time::{Duration, Instant};

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Install the process-wide Prometheus recorder.
///
/// Can only succeed once per process.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Run recorder upkeep until the process token is cancelled.
pub fn spawn_upkeep(handle: PrometheusHandle, token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(UPKEEP_INTERVAL);
        loop {
            tokio::select! {
                () = token.cancelled() => break,
                _ = interval.tick() => handle.run_upkeep(),
            }
        }
        tracing::debug!("Metrics upkeep stopped");
    })
}

/// Record a completed remote call.
pub fn record_rpc(method: &'static str, code: &'static str, start: Instant) {
    metrics::counter!("alecton_rpc_requests_total", "method" => method, "code" => code)
        .increment(1);
    metrics::histogram!("alecton_rpc_request_duration_seconds", "method" => method)
        .record(start.elapsed().as_secs_f64());
}

/// Record how long a full server stop took.
pub fn record_shutdown(elapsed: Duration) {
    metrics::histogram!("alecton_shutdown_duration_seconds").record(elapsed.as_secs_f64());
}

/// Record connections closed forcibly when a listener's deadline ran out.
pub fn record_forced_closes(listener: &'static str, count: usize) {
    metrics::counter!("alecton_listener_forced_closes_total", "listener" => listener)
        .increment(count as u64);
}
