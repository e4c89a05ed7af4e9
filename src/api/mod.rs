//! Application lifecycle API served on the remote-call listener.
//!
//! # Data Flow
//! ```text
//! alectonctl / ApplicationsClient (client.rs)
//!     → POST /alecton.api.Applications/{Method} (JSON)
//!     → router.rs (decode, validate, metrics)
//!     → ApplicationService (service.rs)
//!     → Result<_, Status> (status.rs) → HTTP status + JSON body
//! ```

pub mod client;
pub mod router;
pub mod service;
pub mod status;
pub mod types;

pub use client::{ApplicationsClient, ClientError};
pub use router::{method_path, router, SERVICE_PATH};
pub use service::{ApplicationService, UnimplementedApplications};
pub use status::{Code, Status};
pub use types::{
    Application, GetApplicationRequest, ListApplicationsRequest, ListApplicationsResponse,
};
