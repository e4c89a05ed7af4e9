//! Alecton deployment-orchestration server library.
//!
//! The server runs two listeners: the remote-call listener carrying the
//! application API, and an auxiliary HTTP listener for health, readiness
//! and metrics. [`Server::stop`] takes both down in order and then cancels
//! the process-wide token.

// Core subsystems
pub mod api;
pub mod config;
pub mod http;
pub mod net;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::ServerConfig;
pub use lifecycle::{Deadline, HttpListener, RpcListener, Server, ShutdownReport};
pub use net::{ListenerError, ServingListener};
