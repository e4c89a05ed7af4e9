//! Remote-call router for the application service.
//!
//! # Responsibilities
//! - Expose `POST /alecton.api.Applications/{Method}` with JSON bodies
//! - Reject malformed requests before the service sees them
//! - Map [`Status`] codes onto HTTP statuses
//! - Record per-method call metrics
//!
//! # Design Decisions
//! - Generic over the service, held behind an `Arc`
//! - Unknown methods fall through to `unimplemented`, not a bare 404

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::timeout::TimeoutLayer;

use crate::api::service::ApplicationService;
use crate::api::status::Status;
use crate::api::types::{Application, GetApplicationRequest, ListApplicationsRequest};
use crate::http::RequestIdExt;
use crate::observability::metrics;

/// Path prefix shared by every application method.
pub const SERVICE_PATH: &str = "/alecton.api.Applications";

pub const LIST_APPLICATIONS: &str = "ListApplications";
pub const GET_APPLICATION: &str = "GetApplication";
pub const CREATE_APPLICATION: &str = "CreateApplication";

/// Build the remote-call router around `service`.
#[allow(deprecated)]
pub fn router<S: ApplicationService>(service: Arc<S>, request_timeout: Duration) -> Router {
    Router::new()
        .route(&method_path(LIST_APPLICATIONS), post(list_applications::<S>))
        .route(&method_path(GET_APPLICATION), post(get_application::<S>))
        .route(&method_path(CREATE_APPLICATION), post(create_application::<S>))
        .fallback(unknown_method)
        .with_state(service)
        .layer(TimeoutLayer::new(request_timeout))
        .with_request_id()
}

/// Full path of a method on the application service.
pub fn method_path(method: &str) -> String {
    format!("{SERVICE_PATH}/{method}")
}

async fn list_applications<S: ApplicationService>(
    State(service): State<Arc<S>>,
    request: Result<Json<ListApplicationsRequest>, JsonRejection>,
) -> Response {
    let start = Instant::now();
    let result = match request {
        Ok(Json(request)) => service.list_applications(request).await,
        Err(rejection) => Err(invalid_body(rejection)),
    };
    respond(LIST_APPLICATIONS, start, result)
}

async fn get_application<S: ApplicationService>(
    State(service): State<Arc<S>>,
    request: Result<Json<GetApplicationRequest>, JsonRejection>,
) -> Response {
    let start = Instant::now();
    let result = match request {
        Ok(Json(request)) if request.name.trim().is_empty() => {
            Err(Status::invalid_argument("application name must not be empty"))
        }
        Ok(Json(request)) => service.get_application(request).await,
        Err(rejection) => Err(invalid_body(rejection)),
    };
    respond(GET_APPLICATION, start, result)
}

async fn create_application<S: ApplicationService>(
    State(service): State<Arc<S>>,
    request: Result<Json<Application>, JsonRejection>,
) -> Response {
    let start = Instant::now();
    let result = match request {
        Ok(Json(application)) if application.name.trim().is_empty() => {
            Err(Status::invalid_argument("application name must not be empty"))
        }
        Ok(Json(application)) => service.create_application(application).await,
        Err(rejection) => Err(invalid_body(rejection)),
    };
    respond(CREATE_APPLICATION, start, result)
}

async fn unknown_method(uri: axum::http::Uri) -> Status {
    Status::unimplemented(format!("unknown method {}", uri.path()))
}

fn invalid_body(rejection: JsonRejection) -> Status {
    Status::invalid_argument(rejection.body_text())
}

fn respond<T: Serialize>(method: &'static str, start: Instant, result: Result<T, Status>) -> Response {
    match result {
        Ok(body) => {
            metrics::record_rpc(method, "ok", start);
            Json(body).into_response()
        }
        Err(status) => {
            tracing::debug!(method, code = %status.code, message = %status.message, "Call failed");
            metrics::record_rpc(method, status.code.as_str(), start);
            status.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::service::UnimplementedApplications;
    use crate::api::status::Code;
    use crate::api::types::ListApplicationsResponse;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    /// Serves a single fixed application and counts calls.
    #[derive(Default)]
    struct OneApplication {
        calls: AtomicUsize,
    }

    impl ApplicationService for OneApplication {
        async fn list_applications(
            &self,
            _request: ListApplicationsRequest,
        ) -> Result<ListApplicationsResponse, Status> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ListApplicationsResponse {
                applications: vec![Application::new("web")],
            })
        }

        async fn get_application(&self, request: GetApplicationRequest) -> Result<Application, Status> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if request.name == "web" {
                Ok(Application::new("web"))
            } else {
                Err(Status::not_found(format!("application {} not found", request.name)))
            }
        }

        async fn create_application(&self, application: Application) -> Result<Application, Status> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(Status::already_exists(format!(
                "application {} already exists",
                application.name
            )))
        }
    }

    fn call(method: &str, body: &'static str) -> Request<Body> {
        Request::post(method_path(method))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn json<T: serde::de::DeserializeOwned>(response: Response) -> T {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn app<S: ApplicationService>(service: S) -> Router {
        router(Arc::new(service), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn list_returns_applications() {
        let response = app(OneApplication::default())
            .oneshot(call(LIST_APPLICATIONS, "{}"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(crate::http::X_REQUEST_ID));
        let body: ListApplicationsResponse = json(response).await;
        assert_eq!(body.applications, vec![Application::new("web")]);
    }

    #[tokio::test]
    async fn not_found_maps_to_404() {
        let response = app(OneApplication::default())
            .oneshot(call(GET_APPLICATION, r#"{"name":"db"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let status: Status = json(response).await;
        assert_eq!(status.code, Code::NotFound);
    }

    #[tokio::test]
    async fn empty_name_is_rejected_before_the_service() {
        let service = Arc::new(OneApplication::default());
        let response = router(service.clone(), Duration::from_secs(5))
            .oneshot(call(CREATE_APPLICATION, r#"{"name":"  "}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn malformed_body_is_invalid_argument() {
        let response = app(OneApplication::default())
            .oneshot(call(GET_APPLICATION, "{not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let status: Status = json(response).await;
        assert_eq!(status.code, Code::InvalidArgument);
    }

    #[tokio::test]
    async fn unimplemented_service_answers_501() {
        let response = app(UnimplementedApplications)
            .oneshot(call(LIST_APPLICATIONS, "{}"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
        let status: Status = json(response).await;
        assert_eq!(status.code, Code::Unimplemented);
    }

    #[tokio::test]
    async fn unknown_method_is_unimplemented() {
        let response = app(OneApplication::default())
            .oneshot(call("DeleteApplication", "{}"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    }

    #[tokio::test]
    async fn request_id_is_propagated() {
        let request = Request::post(method_path(LIST_APPLICATIONS))
            .header(header::CONTENT_TYPE, "application/json")
            .header(crate::http::X_REQUEST_ID, "abc-123")
            .body(Body::from("{}"))
            .unwrap();

        let response = app(OneApplication::default()).oneshot(request).await.unwrap();

        assert_eq!(response.headers()[crate::http::X_REQUEST_ID], "abc-123");
    }
}
