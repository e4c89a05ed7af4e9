//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;

use alecton::api::{
    Application, ApplicationService, GetApplicationRequest, ListApplicationsRequest,
    ListApplicationsResponse, Status,
};
use alecton::config::ServerConfig;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// In-memory application store with an optional per-call delay.
#[derive(Default)]
pub struct MemoryApplications {
    applications: Mutex<BTreeMap<String, Application>>,
    delay: Duration,
}

impl MemoryApplications {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

impl ApplicationService for MemoryApplications {
    async fn list_applications(
        &self,
        _request: ListApplicationsRequest,
    ) -> Result<ListApplicationsResponse, Status> {
        self.pause().await;
        let applications = self.applications.lock().unwrap().values().cloned().collect();
        Ok(ListApplicationsResponse { applications })
    }

    async fn get_application(&self, request: GetApplicationRequest) -> Result<Application, Status> {
        self.pause().await;
        self.applications
            .lock()
            .unwrap()
            .get(&request.name)
            .cloned()
            .ok_or_else(|| Status::not_found(format!("application {} not found", request.name)))
    }

    async fn create_application(&self, application: Application) -> Result<Application, Status> {
        self.pause().await;
        let mut applications = self.applications.lock().unwrap();
        if applications.contains_key(&application.name) {
            return Err(Status::already_exists(format!(
                "application {} already exists",
                application.name
            )));
        }
        applications.insert(application.name.clone(), application.clone());
        Ok(application)
    }
}

/// Config with both listeners on ephemeral loopback ports.
pub fn local_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.rpc.bind_address = "127.0.0.1:0".into();
    config.http.bind_address = "127.0.0.1:0".into();
    config
}

pub fn base_url(addr: SocketAddr) -> String {
    format!("http://{addr}")
}

/// Send a bare HTTP/1.1 GET and return the raw response.
pub async fn raw_get(addr: SocketAddr, path: &str) -> std::io::Result<String> {
    let mut stream = TcpStream::connect(addr).await?;
    let request = format!("GET {path} HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await?;
    let mut response = String::new();
    stream.read_to_string(&mut response).await?;
    Ok(response)
}
