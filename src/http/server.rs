//! Auxiliary HTTP router.
//!
//! # Responsibilities
//! - Liveness (`/healthz`) and readiness (`/readyz`) probes
//! - Prometheus exposition (`/metrics`) when a recorder is installed
//! - Request-id, tracing and timeout middleware
//!
//! # Design Decisions
//! - Readiness follows the process token: once it is cancelled the
//!   process is going away and probes must fail
//! - Without a recorder `/metrics` is a plain 404

use std::time::Duration;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tower_http::timeout::TimeoutLayer;

use crate::http::request::RequestIdExt;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Shared state for the auxiliary handlers.
#[derive(Clone)]
pub struct HttpState {
    token: CancellationToken,
    metrics: Option<PrometheusHandle>,
}

impl HttpState {
    pub fn new(token: CancellationToken, metrics: Option<PrometheusHandle>) -> Self {
        Self { token, metrics }
    }
}

/// Build the auxiliary router.
#[allow(deprecated)]
pub fn router(state: HttpState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(render_metrics))
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .with_request_id()
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

async fn readyz(State(state): State<HttpState>) -> Response {
    if state.token.is_cancelled() {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "shutting_down" })),
        )
            .into_response()
    } else {
        Json(json!({ "status": "ready" })).into_response()
    }
}

async fn render_metrics(State(state): State<HttpState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}
