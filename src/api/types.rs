//! Wire types for the application API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A deployable application.
///
/// Only the name is interpreted here; every other field is carried through
/// unchanged to the [`ApplicationService`](crate::api::ApplicationService).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub name: String,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Application {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Map::new(),
        }
    }

    /// Attach an extra field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Decode an application from a YAML document.
    pub fn from_yaml(document: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(document)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListApplicationsRequest {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListApplicationsResponse {
    #[serde(default)]
    pub applications: Vec<Application>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetApplicationRequest {
    pub name: String,
}

impl GetApplicationRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
