// Nexus Desktop - UI Bridge
// The complete set of host operations reachable from the webview

use crate::error::RequestError;
use crate::gateway::{HttpMethod, RequestDescriptor, RequestGateway};
use serde_json::Value;

/// Capability table handed to the UI side: backend requests and the app version.
/// Holds no process handle and no paths.
#[derive(Clone, Debug)]
pub struct Bridge {
    gateway: RequestGateway,
    version: String,
}

impl Bridge {
    pub fn new(gateway: RequestGateway, version: impl Into<String>) -> Self {
        Self {
            gateway,
            version: version.into(),
        }
    }

    pub async fn request(&self, descriptor: RequestDescriptor) -> Result<Value, RequestError> {
        validate_endpoint(&descriptor.endpoint)?;
        self.gateway.forward(&descriptor).await
    }

    pub async fn get(&self, endpoint: impl Into<String>) -> Result<Value, RequestError> {
        self.request(RequestDescriptor::new(HttpMethod::Get, endpoint, None))
            .await
    }

    pub async fn post(&self, endpoint: impl Into<String>, data: Value) -> Result<Value, RequestError> {
        self.request(RequestDescriptor::new(HttpMethod::Post, endpoint, Some(data)))
            .await
    }

    pub async fn put(&self, endpoint: impl Into<String>, data: Value) -> Result<Value, RequestError> {
        self.request(RequestDescriptor::new(HttpMethod::Put, endpoint, Some(data)))
            .await
    }

    pub async fn delete(&self, endpoint: impl Into<String>) -> Result<Value, RequestError> {
        self.request(RequestDescriptor::new(HttpMethod::Delete, endpoint, None))
            .await
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

/// Endpoints must be plain absolute paths so the request can only land on the
/// backend origin.
pub fn validate_endpoint(endpoint: &str) -> Result<(), RequestError> {
    let well_formed = endpoint.starts_with('/')
        && !endpoint.starts_with("//")
        && !endpoint.contains('\\')
        && !endpoint.chars().any(|c| c.is_whitespace() || c.is_control());

    if well_formed {
        Ok(())
    } else {
        Err(RequestError::InvalidEndpoint(endpoint.to_string()))
    }
}
