//! The send-one-request seam beneath the API client.
//!
//! `ApiClient` runs its interceptor pipeline over a [`Transport`]. The real
//! implementation is [`HttpTransport`]; the in-memory mock backend implements
//! the same trait so stores and the CLI can run offline.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::error::{ApiError, Result};
use super::types::QueryParams;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP verbs used by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A request relative to the API base URL.
#[derive(Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path beginning with `/`, e.g. `/issues/3/assign`.
    pub path: String,
    pub query: QueryParams,
    pub body: Option<Value>,
    /// Bearer token to send in the `Authorization` header.
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: QueryParams::new(),
            body: None,
            bearer: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Replace the query parameters.
    pub fn with_query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    /// Set the JSON body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Path plus encoded query string, as it appears after the base URL.
    pub fn path_and_query(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query.to_query_string())
        }
    }
}

impl fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("has_body", &self.body.is_some())
            .field("authenticated", &self.bearer.is_some())
            .finish()
    }
}

/// A response as seen by the interceptor: status plus optional JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// `None` for empty bodies such as `204 No Content`.
    pub body: Option<Value>,
}

impl ApiResponse {
    pub fn new(status: u16, body: Option<Value>) -> Self {
        Self { status, body }
    }

    /// A `200 OK` with a JSON body.
    pub fn ok(body: Value) -> Self {
        Self::new(200, Some(body))
    }

    /// Check for a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends a single request and returns whatever status came back.
///
/// Implementations return `Err` only when no response was received.
/// Non-2xx statuses are `Ok` so the client can intercept them.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse>;
}

/// Transport over HTTP using reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport for the given base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not http(s) or the HTTP client cannot
    /// be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = normalize_base_url(base_url);
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ApiError::InvalidUrl(base_url));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, request: &ApiRequest) -> String {
        format!("{}{}", self.base_url, request.path_and_query())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let url = self.url_for(request);
        debug!("Sending request to {}", url);

        let mut builder = self
            .client
            .request(request.method.into(), &url)
            .header(header::ACCEPT, "application/json");

        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        let body = if text.trim().is_empty() {
            None
        } else {
            match serde_json::from_str::<Value>(&text) {
                Ok(json) => Some(json),
                Err(e) if (200..300).contains(&status) => {
                    return Err(ApiError::InvalidResponse(format!(
                        "Failed to parse response: {}",
                        e
                    )));
                }
                // Error pages are often HTML; keep the raw text for logging
                Err(_) => Some(Value::String(text)),
            }
        };

        debug!("Received HTTP {}", status);
        Ok(ApiResponse { status, body })
    }
}

/// Normalize the base URL by removing trailing slashes.
///
/// Warns when a non-local URL does not use HTTPS.
pub fn normalize_base_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');

    if url.starts_with("http://") && !is_local(url) {
        warn!("URL does not use HTTPS: {}. Tokens will be sent in clear text.", url);
    }

    url.to_string()
}

fn is_local(url: &str) -> bool {
    url.contains("://localhost") || url.contains("://127.0.0.1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_base_url_removes_trailing_slash() {
        assert_eq!(
            normalize_base_url("http://localhost:8000/api/v1/"),
            "http://localhost:8000/api/v1"
        );
    }

    #[test]
    fn test_normalize_base_url_handles_multiple_slashes() {
        assert_eq!(
            normalize_base_url("https://ops.example.com/api/v1///"),
            "https://ops.example.com/api/v1"
        );
    }

    #[test]
    fn test_path_and_query() {
        let request = ApiRequest::patch("/issues/4/status")
            .with_query(QueryParams::new().with("status", "in_review"));
        assert_eq!(request.path_and_query(), "/issues/4/status?status=in_review");
        assert_eq!(ApiRequest::get("/projects").path_and_query(), "/projects");
    }

    #[test]
    fn test_request_debug_hides_bearer() {
        let mut request = ApiRequest::post("/auth/logout").with_body(json!({}));
        request.bearer = Some("token-value".to_string());
        let debug_output = format!("{:?}", request);
        assert!(!debug_output.contains("token-value"));
        assert!(debug_output.contains("authenticated: true"));
    }

    #[test]
    fn test_http_transport_rejects_non_http_url() {
        let result = HttpTransport::new("ftp://example.com", Duration::from_secs(5));
        assert!(matches!(result, Err(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn test_http_transport_url_for() {
        let transport =
            HttpTransport::new("http://localhost:8000/api/v1/", Duration::from_secs(5)).unwrap();
        let request = ApiRequest::get("/projects").with_query(QueryParams::new().page(2));
        assert_eq!(
            transport.url_for(&request),
            "http://localhost:8000/api/v1/projects?page=2"
        );
    }

    #[test]
    fn test_response_is_success() {
        assert!(ApiResponse::new(204, None).is_success());
        assert!(!ApiResponse::new(401, None).is_success());
    }
}
