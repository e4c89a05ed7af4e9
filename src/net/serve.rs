//! Serving loop for a bound listener.
//!
//! # Responsibilities
//! - Accept connections and serve an axum `Router` over HTTP/1.1 and HTTP/2
//! - Stop accepting on request and ask every open connection to finish
//! - Either wait for the drain without bound, or abort what is left at a deadline
//!
//! # Design Decisions
//! - One task per listener owns the accept loop and a `JoinSet` of connections,
//!   so aborting the set is what "forcibly closed" means
//! - Stopping is idempotent; a second call on a stopped listener is a no-op

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use hyper_util::service::TowerToHyperService;
use tokio::net::TcpStream;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::lifecycle::deadline::Deadline;
use crate::lifecycle::shutdown::{HttpListener, RpcListener};
use crate::net::connection::{ConnectionGuard, ConnectionTracker};
use crate::net::listener::{ConnectionPermit, Listener, ListenerError};
use crate::observability::metrics;

const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// A listener that is serving requests in a background task.
#[derive(Debug)]
pub struct ServingListener {
    name: &'static str,
    local_addr: SocketAddr,
    stop: CancellationToken,
    force: CancellationToken,
    tracker: ConnectionTracker,
    task: Option<JoinHandle<()>>,
}

impl ServingListener {
    /// Start serving `router` on `listener`.
    pub fn spawn(listener: Listener, router: Router) -> Self {
        let name = listener.name();
        let local_addr = listener.local_addr();
        let stop = CancellationToken::new();
        let force = CancellationToken::new();
        let tracker = ConnectionTracker::new();

        let task = tokio::spawn(accept_loop(
            listener,
            router,
            stop.clone(),
            force.clone(),
            tracker.clone(),
        ));

        Self {
            name,
            local_addr,
            stop,
            force,
            tracker,
            task: Some(task),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Connections currently open on this listener.
    pub fn open_connections(&self) -> usize {
        self.tracker.open()
    }

    pub fn is_stopped(&self) -> bool {
        self.task.is_none()
    }

    /// Stop accepting and wait until every connection has finished.
    pub async fn graceful_stop(&mut self) -> Result<(), ListenerError> {
        let Some(task) = self.task.take() else {
            return Ok(());
        };
        self.stop.cancel();
        task.await.map_err(|source| ListenerError::Task {
            listener: self.name,
            source,
        })
    }

    /// Stop accepting and wait for connections until `deadline`, then abort
    /// the rest.
    pub async fn shutdown(&mut self, deadline: &Deadline) -> Result<(), ListenerError> {
        let Some(mut task) = self.task.take() else {
            return Ok(());
        };
        self.stop.cancel();

        tokio::select! {
            joined = &mut task => {
                return joined.map_err(|source| ListenerError::Task { listener: self.name, source });
            }
            () = deadline.expired() => {}
        }

        let open_connections = self.tracker.open();
        tracing::warn!(
            listener = self.name,
            open_connections,
            timeout_ms = deadline.timeout().as_millis() as u64,
            "Shutdown deadline reached, closing remaining connections"
        );
        metrics::record_forced_closes(self.name, open_connections);
        self.force.cancel();
        task.await.map_err(|source| ListenerError::Task {
            listener: self.name,
            source,
        })?;

        Err(ListenerError::DeadlineExceeded {
            listener: self.name,
            open_connections,
        })
    }
}

impl Drop for ServingListener {
    fn drop(&mut self) {
        if self.task.is_some() {
            self.stop.cancel();
            self.force.cancel();
        }
    }
}

impl RpcListener for ServingListener {
    async fn graceful_stop(&mut self) -> Result<(), ListenerError> {
        ServingListener::graceful_stop(self).await
    }
}

impl HttpListener for ServingListener {
    async fn shutdown(&mut self, deadline: &Deadline) -> Result<(), ListenerError> {
        ServingListener::shutdown(self, deadline).await
    }
}

async fn accept_loop(
    listener: Listener,
    router: Router,
    stop: CancellationToken,
    force: CancellationToken,
    tracker: ConnectionTracker,
) {
    let name = listener.name();
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            biased;
            () = stop.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer, permit)) => {
                    connections.spawn(serve_connection(
                        name,
                        stream,
                        peer,
                        router.clone(),
                        stop.clone(),
                        permit,
                        tracker.track(),
                    ));
                }
                Err(error) => {
                    tracing::warn!(listener = name, %error, "Failed to accept connection");
                    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                }
            },
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
        }
    }

    drop(listener);
    tracing::info!(
        listener = name,
        open_connections = tracker.open(),
        "Stopped accepting connections, draining"
    );

    tokio::select! {
        () = drain(&mut connections) => {
            tracing::info!(listener = name, "All connections drained");
        }
        () = force.cancelled() => {
            connections.shutdown().await;
            tracing::info!(listener = name, "Remaining connections aborted");
        }
    }
}

async fn drain(connections: &mut JoinSet<()>) {
    while connections.join_next().await.is_some() {}
}

async fn serve_connection(
    name: &'static str,
    stream: TcpStream,
    peer: SocketAddr,
    router: Router,
    stop: CancellationToken,
    _permit: ConnectionPermit,
    guard: ConnectionGuard,
) {
    let builder = auto::Builder::new(TokioExecutor::new());
    let conn = builder.serve_connection(TokioIo::new(stream), TowerToHyperService::new(router));
    tokio::pin!(conn);

    let result = tokio::select! {
        result = conn.as_mut() => result,
        () = stop.cancelled() => {
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    };

    if let Err(error) = result {
        tracing::debug!(
            listener = name,
            connection_id = %guard.id(),
            peer_addr = %peer,
            %error,
            "Connection ended with error"
        );
    }
}
