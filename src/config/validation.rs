//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits > 0)
//! - Detect listeners that would bind the same address
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use tokio::sync::Semaphore;
use tracing_subscriber::EnvFilter;

use crate::config::schema::{ServerConfig, MAX_TIMEOUT_SECS};

const MAX_PERMITS: u64 = Semaphore::MAX_PERMITS as u64;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("rpc listener {rpc} and http listener {http} bind the same port")]
    AddressConflict { rpc: SocketAddr, http: SocketAddr },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} must be at most {max}")]
    TooLarge { field: &'static str, max: u64 },

    #[error("observability.log_level: invalid filter '{0}'")]
    InvalidLogLevel(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let rpc = parse_address("rpc.bind_address", &config.rpc.bind_address, &mut errors);
    let http = parse_address("http.bind_address", &config.http.bind_address, &mut errors);
    if let (Some(rpc), Some(http)) = (rpc, http) {
        if addresses_overlap(rpc, http) {
            errors.push(ValidationError::AddressConflict { rpc, http });
        }
    }

    let bounded = [
        ("rpc.max_connections", config.rpc.max_connections as u64, MAX_PERMITS),
        ("http.max_connections", config.http.max_connections as u64, MAX_PERMITS),
        ("shutdown.http_timeout_secs", config.shutdown.http_timeout_secs, MAX_TIMEOUT_SECS),
        ("timeouts.request_secs", config.timeouts.request_secs, MAX_TIMEOUT_SECS),
    ];
    for (field, value, max) in bounded {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        } else if value > max {
            errors.push(ValidationError::TooLarge { field, max });
        }
    }

    if EnvFilter::try_new(&config.observability.log_level).is_err() {
        errors.push(ValidationError::InvalidLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Two listeners overlap when they share a non-ephemeral port and either
/// binds the same IP or one of them binds every interface.
fn addresses_overlap(a: SocketAddr, b: SocketAddr) -> bool {
    a.port() == b.port()
        && a.port() != 0
        && (a.ip() == b.ip() || a.ip().is_unspecified() || b.ip().is_unspecified())
}

fn parse_address(
    field: &'static str,
    value: &str,
    errors: &mut Vec<ValidationError>,
) -> Option<SocketAddr> {
    match value.parse() {
        Ok(addr) => Some(addr),
        Err(_) => {
            errors.push(ValidationError::InvalidAddress {
                field,
                value: value.to_string(),
            });
            None
        }
    }
}
