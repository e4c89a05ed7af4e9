//! The application service seam.
//!
//! Scheduling, storage and deployment semantics live behind
//! [`ApplicationService`]; this crate only transports calls to it.

use std::future::Future;

use crate::api::status::Status;
use crate::api::types::{
    Application, GetApplicationRequest, ListApplicationsRequest, ListApplicationsResponse,
};

/// Handles application lifecycle calls arriving on the remote-call listener.
pub trait ApplicationService: Send + Sync + 'static {
    fn list_applications(
        &self,
        request: ListApplicationsRequest,
    ) -> impl Future<Output = Result<ListApplicationsResponse, Status>> + Send;

    fn get_application(
        &self,
        request: GetApplicationRequest,
    ) -> impl Future<Output = Result<Application, Status>> + Send;

    fn create_application(
        &self,
        application: Application,
    ) -> impl Future<Output = Result<Application, Status>> + Send;
}

/// Answers every call with [`Code::Unimplemented`](crate::api::Code::Unimplemented).
#[derive(Debug, Clone, Copy, Default)]
pub struct UnimplementedApplications;

impl ApplicationService for UnimplementedApplications {
    async fn list_applications(
        &self,
        _request: ListApplicationsRequest,
    ) -> Result<ListApplicationsResponse, Status> {
        Err(Status::unimplemented("ListApplications is not implemented"))
    }

    async fn get_application(&self, _request: GetApplicationRequest) -> Result<Application, Status> {
        Err(Status::unimplemented("GetApplication is not implemented"))
    }

    async fn create_application(&self, _application: Application) -> Result<Application, Status> {
        Err(Status::unimplemented("CreateApplication is not implemented"))
    }
}
