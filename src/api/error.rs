//! API error types for the TrackOps client.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// The uniform error payload returned by the backend.
///
/// `message` is always populated: when the server does not send one, a
/// default for the status code is used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub errors: Option<HashMap<String, Vec<String>>>,
}

impl ErrorBody {
    /// Build an error body with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            detail: None,
            errors: None,
        }
    }

    /// Extract the error fields from a JSON response body.
    ///
    /// `detail` may be a string or a structured value (validation errors
    /// often send an array); structured values are kept as compact JSON.
    pub fn from_value(body: Option<&Value>, default_message: &str) -> Self {
        let Some(obj) = body.and_then(Value::as_object) else {
            return Self::new(default_message);
        };

        let message = obj
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or(default_message)
            .to_string();

        let detail = obj.get("detail").and_then(|d| match d {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        });

        let errors = obj
            .get("errors")
            .and_then(|e| serde_json::from_value::<HashMap<String, Vec<String>>>(e.clone()).ok());

        Self {
            message,
            detail,
            errors,
        }
    }
}

/// Errors that can occur when talking to the TrackOps API.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The request was rejected as malformed (400).
    #[error("{}", .0.message)]
    BadRequest(ErrorBody),

    /// Credentials were missing or rejected (401).
    #[error("{}", .0.message)]
    Unauthorized(ErrorBody),

    /// The user lacks access to the resource (403).
    #[error("{}", .0.message)]
    Forbidden(ErrorBody),

    /// Resource not found (404).
    #[error("{}", .0.message)]
    NotFound(ErrorBody),

    /// The resource was modified concurrently (409).
    #[error("{}", .0.message)]
    Conflict(ErrorBody),

    /// Field validation failed (422).
    #[error("{}", .0.message)]
    Validation(ErrorBody),

    /// Too many requests (429).
    #[error("{}", .0.message)]
    RateLimited(ErrorBody),

    /// Server error, or any other unexpected status.
    #[error("{msg} (HTTP {status})", msg = .body.message)]
    ServerError { status: u16, body: ErrorBody },

    /// Network or transport failure. The request never got a status.
    #[error("Network error: {0}")]
    Network(String),

    /// The response could not be decoded.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// The access token expired and could not be refreshed.
    #[error("Session expired: please log in again")]
    SessionExpired,

    /// Keyring error when storing/retrieving tokens.
    #[error("Keyring error: {0}")]
    Keyring(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Create an error from an HTTP status code and the response body.
    pub fn from_status(status: u16, body: Option<&Value>) -> Self {
        let body = |default: &str| ErrorBody::from_value(body, default);
        match status {
            400 => ApiError::BadRequest(body("Bad request")),
            401 => ApiError::Unauthorized(body("Authentication required")),
            403 => ApiError::Forbidden(body("Permission denied")),
            404 => ApiError::NotFound(body("Resource not found")),
            409 => ApiError::Conflict(body("Conflict: the resource was modified")),
            422 => ApiError::Validation(body("Validation failed")),
            429 => ApiError::RateLimited(body("Rate limited: please wait before retrying")),
            500..=599 => ApiError::ServerError {
                status,
                body: body("Server error"),
            },
            _ => ApiError::ServerError {
                status,
                body: body(&format!("Unexpected HTTP {}", status)),
            },
        }
    }

    /// The HTTP status, or 0 when no response was received.
    pub fn status(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Unauthorized(_) | ApiError::SessionExpired => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::Validation(_) => 422,
            ApiError::RateLimited(_) => 429,
            ApiError::ServerError { status, .. } => *status,
            ApiError::Network(_)
            | ApiError::InvalidResponse(_)
            | ApiError::Keyring(_)
            | ApiError::InvalidUrl(_) => 0,
        }
    }

    /// The server's error body, for status-bearing variants.
    pub fn body(&self) -> Option<&ErrorBody> {
        match self {
            ApiError::BadRequest(b)
            | ApiError::Unauthorized(b)
            | ApiError::Forbidden(b)
            | ApiError::NotFound(b)
            | ApiError::Conflict(b)
            | ApiError::Validation(b)
            | ApiError::RateLimited(b) => Some(b),
            ApiError::ServerError { body, .. } => Some(body),
            _ => None,
        }
    }

    /// The server-provided detail, if any.
    pub fn detail(&self) -> Option<&str> {
        self.body().and_then(|b| b.detail.as_deref())
    }

    /// Per-field validation messages, if any.
    pub fn field_errors(&self) -> Option<&HashMap<String, Vec<String>>> {
        self.body().and_then(|b| b.errors.as_ref())
    }

    /// Check if this is a 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }

    /// Check if the user must log in again.
    pub fn requires_login(&self) -> bool {
        matches!(self, ApiError::SessionExpired | ApiError::Unauthorized(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::InvalidResponse(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::InvalidResponse(err.to_string())
    }
}
