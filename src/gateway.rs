// Nexus Desktop - Request Gateway
// Forwards bridge requests to the backend over loopback HTTP

use crate::config::backend_origin;
use crate::error::RequestError;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::{Duration, Instant};

/// HTTP methods the UI may use
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    fn as_reqwest(self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_reqwest().as_str())
    }
}

/// One UI-initiated backend call: `{ method, endpoint, data? }`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    /// Path only, e.g. `/api/accounts`
    pub endpoint: String,
    #[serde(rename = "data", default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl RequestDescriptor {
    pub fn new(method: HttpMethod, endpoint: impl Into<String>, payload: Option<Value>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            payload,
        }
    }
}

/// Stateless between calls; clones share one connection pool
#[derive(Clone, Debug)]
pub struct RequestGateway {
    client: reqwest::Client,
    origin: String,
}

impl Default for RequestGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestGateway {
    pub fn new() -> Self {
        Self::with_origin(backend_origin())
    }

    pub(crate) fn with_origin(origin: impl Into<String>) -> Self {
        Self {
            // loopback only, never through a system proxy
            client: reqwest::Client::builder()
                .no_proxy()
                .build()
                .expect("Failed to build loopback HTTP client"),
            origin: origin.into(),
        }
    }

    /// Perform the call and return the backend's JSON body unchanged.
    /// No retries; the caller decides whether to ask again.
    pub async fn forward(&self, descriptor: &RequestDescriptor) -> Result<Value, RequestError> {
        let url = format!("{}{}", self.origin, descriptor.endpoint);
        debug!("[Gateway] {} {}", descriptor.method, url);

        let mut request = self.client.request(descriptor.method.as_reqwest(), &url);
        if let Some(payload) = &descriptor.payload {
            request = request.json(payload);
        }

        let response = request.send().await.map_err(|e| {
            warn!("[Gateway] {} {} failed: {}", descriptor.method, descriptor.endpoint, e);
            RequestError::BackendUnreachable(e)
        })?;
        let body = response
            .bytes()
            .await
            .map_err(RequestError::BackendUnreachable)?;

        serde_json::from_slice(&body).map_err(RequestError::MalformedResponse)
    }

    /// Poll `GET /health` until it answers or `timeout` passes. Diagnostic only.
    pub async fn wait_for_health(&self, timeout: Duration) -> bool {
        let url = format!("{}/health", self.origin);
        let deadline = Instant::now() + timeout;

        info!("[Gateway] Waiting for backend health at {}...", url);

        while Instant::now() < deadline {
            match self.client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => return true,
                Ok(resp) => debug!("[Gateway] Health returned status: {}", resp.status()),
                Err(e) => debug!("[Gateway] Health connection error (retrying): {}", e),
            }
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
        false
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::extract::Json;
    use axum::http::{HeaderMap, Method, Uri};
    use axum::routing::get;
    use axum::Router;
    use serde_json::json;
    use tokio::net::TcpListener;
    use tokio::time::timeout;

    /// Echoes what arrived so tests can inspect the forwarded request
    async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: String) -> Json<Value> {
        let body = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body).unwrap_or(Value::String(body))
        };
        Json(json!({
            "method": method.as_str(),
            "path": uri.path(),
            "contentType": headers
                .get("content-type")
                .and_then(|value| value.to_str().ok()),
            "body": body,
        }))
    }

    /// Loopback test backend with `/ping`, `/health`, `/text` and an echo fallback
    pub(crate) async fn spawn_backend() -> String {
        let app = Router::new()
            .route("/ping", get(|| async { Json(json!({ "pong": true, "n": [1, 2, 3] })) }))
            .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
            .route("/text", get(|| async { "not json" }))
            .fallback(echo);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    /// An origin on which nothing is listening
    pub(crate) async fn closed_origin() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_get_returns_backend_json_verbatim() {
        let gateway = RequestGateway::with_origin(spawn_backend().await);
        let result = gateway
            .forward(&RequestDescriptor::new(HttpMethod::Get, "/ping", None))
            .await
            .unwrap();
        assert_eq!(result, json!({ "pong": true, "n": [1, 2, 3] }));
    }

    #[tokio::test]
    async fn test_payload_is_sent_as_json() {
        let gateway = RequestGateway::with_origin(spawn_backend().await);
        let result = gateway
            .forward(&RequestDescriptor::new(
                HttpMethod::Put,
                "/api/tags/7",
                Some(json!({ "name": "work" })),
            ))
            .await
            .unwrap();

        assert_eq!(result["method"], "PUT");
        assert_eq!(result["path"], "/api/tags/7");
        assert_eq!(result["contentType"], "application/json");
        assert_eq!(result["body"], json!({ "name": "work" }));
    }

    #[tokio::test]
    async fn test_no_payload_sends_no_body() {
        let gateway = RequestGateway::with_origin(spawn_backend().await);
        let result = gateway
            .forward(&RequestDescriptor::new(HttpMethod::Delete, "/api/groups/1", None))
            .await
            .unwrap();

        assert_eq!(result["method"], "DELETE");
        assert_eq!(result["contentType"], Value::Null);
        assert_eq!(result["body"], Value::Null);
    }

    #[tokio::test]
    async fn test_non_json_body_is_malformed() {
        let gateway = RequestGateway::with_origin(spawn_backend().await);
        let err = gateway
            .forward(&RequestDescriptor::new(HttpMethod::Get, "/text", None))
            .await
            .unwrap_err();
        assert!(matches!(err, RequestError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_backend_fails_promptly() {
        let gateway = RequestGateway::with_origin(closed_origin().await);
        let result = timeout(
            Duration::from_secs(5),
            gateway.forward(&RequestDescriptor::new(HttpMethod::Get, "/ping", None)),
        )
        .await
        .expect("forward hung on an unreachable backend");
        assert!(matches!(result, Err(RequestError::BackendUnreachable(_))));
    }

    #[tokio::test]
    async fn test_wait_for_health() {
        let gateway = RequestGateway::with_origin(spawn_backend().await);
        assert!(gateway.wait_for_health(Duration::from_secs(2)).await);

        let gateway = RequestGateway::with_origin(closed_origin().await);
        assert!(!gateway.wait_for_health(Duration::from_millis(300)).await);
    }

    #[test]
    fn test_default_gateway_targets_loopback_backend() {
        // the proxy-free client builds outside a runtime
        let gateway = RequestGateway::new();
        assert_eq!(gateway.origin, "http://127.0.0.1:8000");
        assert_eq!(RequestGateway::default().origin, backend_origin());
    }

    #[test]
    fn test_descriptor_wire_shape() {
        let descriptor: RequestDescriptor = serde_json::from_value(json!({
            "method": "POST",
            "endpoint": "/api/accounts",
            "data": { "name": "a" }
        }))
        .unwrap();
        assert_eq!(descriptor.method, HttpMethod::Post);
        assert_eq!(descriptor.payload, Some(json!({ "name": "a" })));

        let without_data: RequestDescriptor =
            serde_json::from_value(json!({ "method": "GET", "endpoint": "/health" })).unwrap();
        assert!(without_data.payload.is_none());

        assert!(serde_json::from_value::<RequestDescriptor>(
            json!({ "method": "PATCH", "endpoint": "/x" })
        )
        .is_err());
    }
}
