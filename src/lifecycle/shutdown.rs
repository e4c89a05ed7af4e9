//! Shutdown coordination for the server.
//!
//! # Responsibilities
//! - Own the remote-call listener, the HTTP listener and the process token
//! - Stop both listeners in a fixed order, the HTTP one within a deadline
//! - Cancel the process token once both listeners are down
//!
//! # Design Decisions
//! - Sequential, not concurrent: the remote-call drain finishes before the
//!   HTTP listener is touched, so health and metrics stay reachable while
//!   remote calls are still completing
//! - The remote-call drain is unbounded; only the HTTP shutdown has a deadline
//! - Listener failures are logged and reported, never short-circuit the sequence
//! - `stop` consumes the server, so it runs at most once

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::DEFAULT_HTTP_SHUTDOWN_TIMEOUT_SECS;
use crate::lifecycle::deadline::Deadline;
use crate::net::{ListenerError, ServingListener};
use crate::observability::metrics;

/// Default bound on the HTTP listener's graceful shutdown.
pub const DEFAULT_HTTP_SHUTDOWN_TIMEOUT: Duration =
    Duration::from_secs(DEFAULT_HTTP_SHUTDOWN_TIMEOUT_SECS);

/// The primary remote-call listener.
pub trait RpcListener: Send {
    /// Stop accepting new calls, let in-flight calls finish, and return once
    /// fully drained. No timeout.
    fn graceful_stop(&mut self) -> impl Future<Output = Result<(), ListenerError>> + Send;
}

/// The auxiliary HTTP listener.
pub trait HttpListener: Send {
    /// Stop accepting connections and wait for in-flight requests until
    /// `deadline`; remaining connections are closed forcibly after that.
    fn shutdown(
        &mut self,
        deadline: &Deadline,
    ) -> impl Future<Output = Result<(), ListenerError>> + Send;
}

/// A running server: two listeners plus the process-wide cancellation token.
#[derive(Debug)]
pub struct Server<R = ServingListener, H = ServingListener> {
    rpc: R,
    http: H,
    token: CancellationToken,
    http_shutdown_timeout: Duration,
}

/// Outcome of [`Server::stop`].
#[derive(Debug)]
pub struct ShutdownReport {
    pub rpc: Result<(), ListenerError>,
    pub http: Result<(), ListenerError>,
    pub elapsed: Duration,
}

impl ShutdownReport {
    /// True when both listeners stopped without error.
    pub fn is_clean(&self) -> bool {
        self.rpc.is_ok() && self.http.is_ok()
    }
}

impl<R: RpcListener, H: HttpListener> Server<R, H> {
    pub fn new(rpc: R, http: H, token: CancellationToken) -> Self {
        Self {
            rpc,
            http,
            token,
            http_shutdown_timeout: DEFAULT_HTTP_SHUTDOWN_TIMEOUT,
        }
    }

    /// Override the HTTP listener's shutdown bound.
    pub fn with_http_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.http_shutdown_timeout = timeout;
        self
    }

    pub fn rpc(&self) -> &R {
        &self.rpc
    }

    pub fn http(&self) -> &H {
        &self.http
    }

    /// The process-wide token; cancelled when [`stop`](Self::stop) completes.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn http_shutdown_timeout(&self) -> Duration {
        self.http_shutdown_timeout
    }

    /// Stop the server.
    ///
    /// 1. Drain the remote-call listener (unbounded).
    /// 2. Shut down the HTTP listener within the configured deadline.
    /// 3. Cancel the process token.
    ///
    /// Never fails; listener errors are logged and returned in the report.
    pub async fn stop(mut self) -> ShutdownReport {
        let started = Instant::now();

        tracing::info!("Stopping remote-call listener");
        let rpc = self.rpc.graceful_stop().await;
        if let Err(error) = &rpc {
            tracing::error!(%error, "Remote-call listener did not stop cleanly");
        }

        tracing::info!(
            timeout_ms = self.http_shutdown_timeout.as_millis() as u64,
            "Stopping HTTP listener"
        );
        let http = {
            let (deadline, _guard) = Deadline::after(self.http_shutdown_timeout);
            self.http.shutdown(&deadline).await
        };
        if let Err(error) = &http {
            tracing::warn!(%error, "HTTP listener did not stop cleanly");
        }

        self.token.cancel();

        let elapsed = started.elapsed();
        metrics::record_shutdown(elapsed);
        tracing::info!(
            elapsed_ms = elapsed.as_millis() as u64,
            clean = rpc.is_ok() && http.is_ok(),
            "Server stopped"
        );

        ShutdownReport { rpc, http, elapsed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        RpcStopStarted { token_cancelled: bool },
        RpcStopFinished,
        HttpShutdownStarted { token_cancelled: bool },
        HttpShutdownFinished,
        HttpForced,
    }

    #[derive(Clone, Default)]
    struct Log(Arc<Mutex<Vec<Event>>>);

    impl Log {
        fn push(&self, event: Event) {
            self.0.lock().unwrap().push(event);
        }

        fn events(&self) -> Vec<Event> {
            self.0.lock().unwrap().clone()
        }
    }

    enum RpcBehaviour {
        Drain(Duration),
        Fail,
        Hang,
    }

    struct FakeRpc {
        log: Log,
        token: CancellationToken,
        behaviour: RpcBehaviour,
    }

    impl RpcListener for FakeRpc {
        async fn graceful_stop(&mut self) -> Result<(), ListenerError> {
            self.log.push(Event::RpcStopStarted {
                token_cancelled: self.token.is_cancelled(),
            });
            match self.behaviour {
                RpcBehaviour::Drain(duration) => tokio::time::sleep(duration).await,
                RpcBehaviour::Fail => {
                    let task = tokio::spawn(std::future::pending::<()>());
                    task.abort();
                    let source = task.await.unwrap_err();
                    return Err(ListenerError::Task {
                        listener: "rpc",
                        source,
                    });
                }
                RpcBehaviour::Hang => std::future::pending::<()>().await,
            }
            self.log.push(Event::RpcStopFinished);
            Ok(())
        }
    }

    struct FakeHttp {
        log: Log,
        token: CancellationToken,
        in_flight: Duration,
        seen: Arc<Mutex<Option<Deadline>>>,
    }

    impl HttpListener for FakeHttp {
        async fn shutdown(&mut self, deadline: &Deadline) -> Result<(), ListenerError> {
            self.log.push(Event::HttpShutdownStarted {
                token_cancelled: self.token.is_cancelled(),
            });
            *self.seen.lock().unwrap() = Some(deadline.clone());
            tokio::select! {
                () = tokio::time::sleep(self.in_flight) => {
                    self.log.push(Event::HttpShutdownFinished);
                    Ok(())
                }
                () = deadline.expired() => {
                    self.log.push(Event::HttpForced);
                    Err(ListenerError::DeadlineExceeded { listener: "http", open_connections: 1 })
                }
            }
        }
    }

    struct Harness {
        log: Log,
        token: CancellationToken,
        seen: Arc<Mutex<Option<Deadline>>>,
        server: Server<FakeRpc, FakeHttp>,
    }

    fn harness(rpc: RpcBehaviour, http_in_flight: Duration) -> Harness {
        let log = Log::default();
        let token = CancellationToken::new();
        let seen = Arc::new(Mutex::new(None));
        let server = Server::new(
            FakeRpc {
                log: log.clone(),
                token: token.clone(),
                behaviour: rpc,
            },
            FakeHttp {
                log: log.clone(),
                token: token.clone(),
                in_flight: http_in_flight,
                seen: Arc::clone(&seen),
            },
            token.clone(),
        );
        Harness {
            log,
            token,
            seen,
            server,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn idle_listeners_stop_immediately() {
        let h = harness(RpcBehaviour::Drain(Duration::ZERO), Duration::ZERO);

        let report = h.server.stop().await;

        assert!(report.is_clean());
        assert!(report.elapsed < Duration::from_secs(1));
        assert!(h.token.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn rpc_drains_before_http_shutdown_begins() {
        let h = harness(
            RpcBehaviour::Drain(Duration::from_secs(3)),
            Duration::from_millis(500),
        );

        h.server.stop().await;

        assert_eq!(
            h.log.events(),
            vec![
                Event::RpcStopStarted {
                    token_cancelled: false
                },
                Event::RpcStopFinished,
                Event::HttpShutdownStarted {
                    token_cancelled: false
                },
                Event::HttpShutdownFinished,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn token_fires_only_after_both_listeners() {
        let h = harness(
            RpcBehaviour::Drain(Duration::from_secs(1)),
            Duration::from_secs(1),
        );
        let token = h.token.clone();
        let stop = tokio::spawn(h.server.stop());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!token.is_cancelled());

        stop.await.unwrap();
        assert!(token.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_http_listener_is_cut_off_at_deadline() {
        let h = harness(
            RpcBehaviour::Drain(Duration::ZERO),
            Duration::from_secs(30),
        );

        let report = h.server.stop().await;

        assert!(report.elapsed >= DEFAULT_HTTP_SHUTDOWN_TIMEOUT);
        assert!(report.elapsed < Duration::from_secs(11));
        assert!(matches!(
            report.http,
            Err(ListenerError::DeadlineExceeded { listener: "http", .. })
        ));
        assert_eq!(h.log.events().last(), Some(&Event::HttpForced));
        assert!(h.token.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn custom_http_timeout_is_honoured() {
        let mut h = harness(
            RpcBehaviour::Drain(Duration::ZERO),
            Duration::from_secs(30),
        );
        h.server = h.server.with_http_shutdown_timeout(Duration::from_secs(2));

        let report = h.server.stop().await;

        assert!(report.elapsed >= Duration::from_secs(2));
        assert!(report.elapsed < Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_http_timeout_still_stops() {
        let mut h = harness(RpcBehaviour::Drain(Duration::ZERO), Duration::from_secs(1));
        h.server = h.server.with_http_shutdown_timeout(Duration::MAX);

        let report = h.server.stop().await;

        assert!(report.is_clean());
        assert!(h.token.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_released_when_http_finishes_in_time() {
        let h = harness(RpcBehaviour::Drain(Duration::ZERO), Duration::from_secs(1));

        h.server.stop().await;

        let deadline = h.seen.lock().unwrap().clone().unwrap();
        assert!(deadline.is_released());
        assert!(!deadline.is_expired());
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_released_when_http_times_out() {
        let h = harness(
            RpcBehaviour::Drain(Duration::ZERO),
            Duration::from_secs(30),
        );

        h.server.stop().await;

        let deadline = h.seen.lock().unwrap().clone().unwrap();
        assert!(deadline.is_released());
        assert!(deadline.is_expired());
    }

    #[tokio::test(start_paused = true)]
    async fn rpc_failure_is_reported_and_shutdown_continues() {
        let h = harness(RpcBehaviour::Fail, Duration::ZERO);

        let report = h.server.stop().await;

        assert!(!report.is_clean());
        assert!(matches!(
            report.rpc,
            Err(ListenerError::Task { listener: "rpc", .. })
        ));
        assert!(report.http.is_ok());
        assert!(h.log.events().contains(&Event::HttpShutdownFinished));
        assert!(h.token.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn hung_rpc_call_blocks_stop() {
        let h = harness(RpcBehaviour::Hang, Duration::ZERO);
        let token = h.token.clone();

        let outcome = tokio::time::timeout(Duration::from_secs(600), h.server.stop()).await;

        assert!(outcome.is_err());
        assert!(!token.is_cancelled());
        assert_eq!(
            h.log.events(),
            vec![Event::RpcStopStarted {
                token_cancelled: false
            }]
        );
    }
}
