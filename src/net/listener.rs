//! TCP listener implementation with backpressure.
//!
//! # Responsibilities
//! - Bind to configured address
//! - Accept incoming TCP connections
//! - Enforce max_connections limit via semaphore
//!
//! # Design Decisions
//! - Permit is acquired before accept, so a full server stops pulling from the backlog
//! - The permit travels with the connection task and is released on drop, even on abort

use std::io;
use std::net::{AddrParseError, SocketAddr};
use std::sync::Arc;

use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinError;

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("{listener}: invalid bind address '{address}': {source}")]
    InvalidAddress {
        listener: &'static str,
        address: String,
        #[source]
        source: AddrParseError,
    },

    #[error("{listener}: failed to bind {address}: {source}")]
    Bind {
        listener: &'static str,
        address: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("{listener}: serving task failed: {source}")]
    Task {
        listener: &'static str,
        #[source]
        source: JoinError,
    },

    #[error("{listener}: shutdown deadline exceeded, {open_connections} connections forcibly closed")]
    DeadlineExceeded {
        listener: &'static str,
        open_connections: usize,
    },
}

/// A bounded TCP listener that limits concurrent connections.
#[derive(Debug)]
pub struct Listener {
    name: &'static str,
    inner: TcpListener,
    local_addr: SocketAddr,
    connection_limit: Arc<Semaphore>,
    max_connections: usize,
}

impl Listener {
    /// Bind to the configured address with connection limits.
    pub async fn bind(name: &'static str, config: &ListenerConfig) -> Result<Self, ListenerError> {
        let addr: SocketAddr =
            config
                .bind_address
                .parse()
                .map_err(|source| ListenerError::InvalidAddress {
                    listener: name,
                    address: config.bind_address.clone(),
                    source,
                })?;

        let bind_error = |source| ListenerError::Bind {
            listener: name,
            address: addr,
            source,
        };
        let inner = TcpListener::bind(addr).await.map_err(bind_error)?;
        let local_addr = inner.local_addr().map_err(bind_error)?;

        tracing::info!(
            listener = name,
            address = %local_addr,
            max_connections = config.max_connections,
            "Listener bound"
        );

        // Validation rejects larger limits; clamp so a hand-built config cannot panic.
        let max_connections = config.max_connections.min(Semaphore::MAX_PERMITS);
        Ok(Self {
            name,
            inner,
            local_addr,
            connection_limit: Arc::new(Semaphore::new(max_connections)),
            max_connections,
        })
    }

    /// Accept a new connection, respecting the connection limit.
    ///
    /// Waits while the limit is reached. The returned permit must be held
    /// for the connection's lifetime.
    pub async fn accept(&self) -> io::Result<(TcpStream, SocketAddr, ConnectionPermit)> {
        let permit = Arc::clone(&self.connection_limit)
            .acquire_owned()
            .await
            .map_err(|_| io::Error::other("connection limit closed"))?;

        let (stream, addr) = self.inner.accept().await?;

        tracing::debug!(
            listener = self.name,
            peer_addr = %addr,
            available_permits = self.connection_limit.available_permits(),
            "Connection accepted"
        );

        Ok((stream, addr, ConnectionPermit { _permit: permit }))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Get current available connection slots.
    pub fn available_permits(&self) -> usize {
        self.connection_limit.available_permits()
    }

    pub fn max_connections(&self) -> usize {
        self.max_connections
    }
}

/// A permit representing a connection slot.
///
/// When dropped, the connection slot is released back to the pool.
#[derive(Debug)]
pub struct ConnectionPermit {
    _permit: OwnedSemaphorePermit,
}
