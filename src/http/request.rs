//! Request identification and tracing.
//!
//! # Responsibilities
//! - Assign an `x-request-id` to every request that lacks one (UUID v4)
//! - Echo the id back on the response
//! - Open a trace span per request carrying the id
//!
//! # Design Decisions
//! - The id is set before the trace layer runs so every event in the
//!   request's span can be correlated
//! - Caller-supplied ids are kept as-is

use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Request};
use axum::Router;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use tracing::Span;
use uuid::Uuid;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates UUID v4 request ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Adds request-id assignment, propagation and per-request tracing to a router.
pub trait RequestIdExt {
    fn with_request_id(self) -> Self;
}

impl RequestIdExt for Router {
    fn with_request_id(self) -> Self {
        self.layer(TraceLayer::new_for_http().make_span_with(request_span))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
    }
}

/// The request id header value, if present and printable.
pub fn request_id<B>(request: &Request<B>) -> Option<&str> {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
}

fn request_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = request_id(request).unwrap_or("unknown"),
    )
}
