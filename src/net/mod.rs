//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept, connection limits)
//!     → connection.rs (id + open-connection accounting)
//!     → serve.rs (hyper connection driving an axum Router)
//!
//! Connection States:
//!     Active → Draining (graceful shutdown requested) → Closed
//!                      ↘ Aborted (deadline passed)
//! ```
//!
//! # Design Decisions
//! - Bounded accept prevents resource exhaustion
//! - Each connection tracked so shutdown can report what it cut off
//! - The same serving loop backs both the remote-call and the HTTP listener

pub mod connection;
pub mod listener;
pub mod serve;

pub use listener::{Listener, ListenerError};
pub use serve::ServingListener;
