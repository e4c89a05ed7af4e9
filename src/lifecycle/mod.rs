//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → Bind both listeners → Install routers → Server
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → shutdown_requested() resolves
//!
//! Shutdown (shutdown.rs):
//!     Server::stop → drain remote calls → HTTP shutdown (deadline.rs) → cancel token
//! ```
//!
//! # Design Decisions
//! - Ordered startup: nothing serves until both listeners are bound
//! - Ordered shutdown: remote calls first, HTTP last, token after both
//! - Only the HTTP shutdown is bounded

pub mod deadline;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use deadline::{Deadline, DeadlineGuard};
pub use shutdown::{
    HttpListener, RpcListener, Server, ShutdownReport, DEFAULT_HTTP_SHUTDOWN_TIMEOUT,
};
pub use signals::shutdown_requested;
pub use startup::start;
