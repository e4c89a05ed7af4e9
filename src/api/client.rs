//! Client for the application service.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::api::router::{method_path, CREATE_APPLICATION, GET_APPLICATION, LIST_APPLICATIONS};
use crate::api::status::{Code, Status};
use crate::api::types::{
    Application, GetApplicationRequest, ListApplicationsRequest, ListApplicationsResponse,
};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid server address {0:?}: expected http:// or https://")]
    InvalidAddress(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Status(#[from] Status),
}

/// Calls the application service over HTTP.
#[derive(Debug, Clone)]
pub struct ApplicationsClient {
    client: Client,
    base_url: String,
}

impl ApplicationsClient {
    /// `address` is the server's base URL; `timeout` bounds each call.
    pub fn new(address: &str, timeout: Duration) -> Result<Self, ClientError> {
        if !(address.starts_with("http://") || address.starts_with("https://")) {
            return Err(ClientError::InvalidAddress(address.to_string()));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: address.trim_end_matches('/').to_string(),
        })
    }

    pub async fn list_applications(&self) -> Result<ListApplicationsResponse, ClientError> {
        self.call(LIST_APPLICATIONS, &ListApplicationsRequest {}).await
    }

    pub async fn get_application(&self, name: &str) -> Result<Application, ClientError> {
        self.call(GET_APPLICATION, &GetApplicationRequest::new(name)).await
    }

    pub async fn create_application(
        &self,
        application: &Application,
    ) -> Result<Application, ClientError> {
        self.call(CREATE_APPLICATION, application).await
    }

    async fn call<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        method: &str,
        request: &Req,
    ) -> Result<Resp, ClientError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, method_path(method)))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let text = response.text().await?;
        Err(decode_status(status, &text).into())
    }
}

/// Decode an error body, falling back to the HTTP status when the body is
/// not a status envelope (proxies, timeouts).
fn decode_status(status: StatusCode, body: &str) -> Status {
    serde_json::from_str(body).unwrap_or_else(|_| {
        let code = Code::from_http_status(status);
        let message = if body.trim().is_empty() {
            status.to_string()
        } else {
            format!("{status}: {}", body.trim())
        };
        Status::new(code, message)
    })
}
