//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Default bound on the HTTP listener's graceful shutdown, in seconds.
pub const DEFAULT_HTTP_SHUTDOWN_TIMEOUT_SECS: u64 = 10;

/// Upper bound accepted for any timeout setting, in seconds (one day).
pub const MAX_TIMEOUT_SECS: u64 = 24 * 60 * 60;

/// Root configuration for the server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Remote-call listener (the application API).
    pub rpc: RpcConfig,

    /// Auxiliary HTTP listener (health, readiness, metrics).
    pub http: HttpConfig,

    /// Shutdown behaviour.
    pub shutdown: ShutdownConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Bind address and connection limit shared by both listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

/// Remote-call listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RpcConfig {
    pub bind_address: String,
    pub max_connections: usize,
}

impl RpcConfig {
    pub fn listener(&self) -> ListenerConfig {
        ListenerConfig {
            bind_address: self.bind_address.clone(),
            max_connections: self.max_connections,
        }
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Auxiliary HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind_address: String,
    pub max_connections: usize,
}

impl HttpConfig {
    pub fn listener(&self) -> ListenerConfig {
        ListenerConfig {
            bind_address: self.bind_address.clone(),
            max_connections: self.max_connections,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8081".to_string(),
            max_connections: 1_000,
        }
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// How long the HTTP listener may take to drain before its remaining
    /// connections are closed. The remote-call listener is never bounded.
    pub http_timeout_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: DEFAULT_HTTP_SHUTDOWN_TIMEOUT_SECS,
        }
    }
}

/// Timeout configuration for request handling.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter (e.g. "info" or "alecton=debug,tower_http=info").
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the `/metrics` endpoint on the HTTP listener.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
        }
    }
}
