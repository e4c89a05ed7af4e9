//! Auxiliary HTTP endpoint.
//!
//! # Data Flow
//! ```text
//! HTTP listener (net::serve)
//!     → request.rs (request id, trace span)
//!     → server.rs (/healthz, /readyz, /metrics)
//! ```
//!
//! The request-id layer is shared with the remote-call router.

pub mod request;
pub mod server;

pub use request::{request_id, MakeRequestUuid, RequestIdExt, X_REQUEST_ID};
pub use server::{router, HttpState};
