//! Startup orchestration.
//!
//! # Responsibilities
//! - Bind the remote-call and HTTP listeners
//! - Install the application router and the auxiliary router
//! - Hand back a running [`Server`] ready to be stopped
//!
//! # Design Decisions
//! - Fail fast: a bind failure is fatal
//! - Both sockets are bound before either starts serving, so a failed
//!   second bind never leaves a half-started process

use std::sync::Arc;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusHandle;
use tokio_util::sync::CancellationToken;

use crate::api::{self, ApplicationService};
use crate::config::ServerConfig;
use crate::http::{self, HttpState};
use crate::lifecycle::shutdown::Server;
use crate::net::{Listener, ListenerError, ServingListener};

pub const RPC_LISTENER: &str = "rpc";
pub const HTTP_LISTENER: &str = "http";

/// Bind both listeners and start serving.
///
/// `token` is the process-wide cancellation signal; it is cancelled by
/// [`Server::stop`].
pub async fn start<S: ApplicationService>(
    config: &ServerConfig,
    service: S,
    metrics: Option<PrometheusHandle>,
    token: CancellationToken,
) -> Result<Server, ListenerError> {
    let rpc_listener = Listener::bind(RPC_LISTENER, &config.rpc.listener()).await?;
    let http_listener = Listener::bind(HTTP_LISTENER, &config.http.listener()).await?;

    let request_timeout = Duration::from_secs(config.timeouts.request_secs);
    let rpc = ServingListener::spawn(rpc_listener, api::router(Arc::new(service), request_timeout));
    let http = ServingListener::spawn(
        http_listener,
        http::router(HttpState::new(token.clone(), metrics), request_timeout),
    );

    tracing::info!(
        rpc_address = %rpc.local_addr(),
        http_address = %http.local_addr(),
        "Server started"
    );

    Ok(Server::new(rpc, http, token)
        .with_http_shutdown_timeout(Duration::from_secs(config.shutdown.http_timeout_secs)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::UnimplementedApplications;

    fn local_config() -> ServerConfig {
        let mut config = ServerConfig::default();
        config.rpc.bind_address = "127.0.0.1:0".into();
        config.http.bind_address = "127.0.0.1:0".into();
        config.shutdown.http_timeout_secs = 3;
        config
    }

    #[tokio::test]
    async fn starts_both_listeners() {
        let token = CancellationToken::new();
        let server = start(&local_config(), UnimplementedApplications, None, token.clone())
            .await
            .unwrap();

        assert_ne!(server.rpc().local_addr(), server.http().local_addr());
        assert_eq!(server.http_shutdown_timeout(), Duration::from_secs(3));

        let report = server.stop().await;
        assert!(report.is_clean());
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn bind_conflict_is_fatal() {
        let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut config = local_config();
        config.http.bind_address = taken.local_addr().unwrap().to_string();

        let err = start(&config, UnimplementedApplications, None, CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ListenerError::Bind { listener: HTTP_LISTENER, .. }));
    }
}
