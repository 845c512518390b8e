//! Centralized error types for TrackOps.
//!
//! [`AppError`] wraps the configuration, API and IO failures the CLI can hit
//! and turns them into messages fit for a terminal.

use thiserror::Error;

use crate::api::error::ApiError;
use crate::config::ConfigError;

/// The main application error type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A guard turned the command away.
    #[error("{0}")]
    Access(String),

    #[error("{0}")]
    Other(String),
}

impl AppError {
    pub fn access(msg: impl Into<String>) -> Self {
        AppError::Access(msg.into())
    }

    pub fn other(msg: impl Into<String>) -> Self {
        AppError::Other(msg.into())
    }

    /// A message for the user, free of HTTP details.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Config(e) => match e {
                ConfigError::NoConfigDir => {
                    "Could not find the configuration directory.".to_string()
                }
                ConfigError::CreateDirError(_) => {
                    "Could not create the configuration directory. Check file permissions."
                        .to_string()
                }
                ConfigError::ReadError(_) => "Could not read the configuration file.".to_string(),
                ConfigError::WriteError(_) | ConfigError::SerializeError(_) => {
                    "Could not save the configuration.".to_string()
                }
                ConfigError::ParseError(_) => {
                    "The configuration file is invalid. Please check its format.".to_string()
                }
                ConfigError::ValidationError(msg) => format!("Configuration error: {}", msg),
                ConfigError::ProfileNotFound(name) => format!("Profile '{}' not found.", name),
            },
            AppError::Api(e) => match e {
                ApiError::Unauthorized(_) => {
                    "Authentication failed. Check your email and password.".to_string()
                }
                ApiError::SessionExpired => {
                    "Your session has expired. Please log in again.".to_string()
                }
                ApiError::Forbidden(_) => {
                    "Access denied. You don't have permission for this.".to_string()
                }
                ApiError::NotFound(body) => match &body.detail {
                    Some(detail) => format!("Not found: {}", detail),
                    None => "The requested item was not found.".to_string(),
                },
                ApiError::Conflict(body) => match &body.detail {
                    Some(detail) => detail.clone(),
                    None => "This item was changed elsewhere. Refresh and try again.".to_string(),
                },
                ApiError::BadRequest(_) | ApiError::Validation(_) => {
                    let mut msg = e.to_string();
                    if let Some(detail) = e.detail() {
                        msg = format!("{}: {}", msg, detail);
                    }
                    msg
                }
                ApiError::RateLimited(_) => {
                    "Too many requests. Please wait a moment and try again.".to_string()
                }
                ApiError::ServerError { .. } => {
                    "TrackOps server error. Please try again later.".to_string()
                }
                ApiError::Network(_) => {
                    "Connection failed. Is the TrackOps API reachable?".to_string()
                }
                ApiError::InvalidResponse(_) => {
                    "Unexpected response from the TrackOps API.".to_string()
                }
                ApiError::InvalidUrl(_) => "Invalid API URL in configuration.".to_string(),
                ApiError::Keyring(_) => "Could not access secure credential storage.".to_string(),
            },
            AppError::Io(_) => "A file operation failed. Check file permissions.".to_string(),
            AppError::Access(msg) | AppError::Other(msg) => msg.clone(),
        }
    }

    /// Whether the error stops the CLI from doing anything useful.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            AppError::Config(_)
                | AppError::Api(ApiError::Unauthorized(_))
                | AppError::Api(ApiError::SessionExpired)
                | AppError::Api(ApiError::Forbidden(_))
                | AppError::Api(ApiError::Keyring(_))
        )
    }

    /// Whether retrying the same command may succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Api(ApiError::RateLimited(_))
                | AppError::Api(ApiError::ServerError { .. })
                | AppError::Api(ApiError::Network(_))
                | AppError::Api(ApiError::NotFound(_))
                | AppError::Api(ApiError::Conflict(_))
        )
    }

    pub fn suggested_action(&self) -> Option<&'static str> {
        match self {
            AppError::Config(ConfigError::ProfileNotFound(_)) => {
                Some("Add the profile to config.toml or pick another with --profile.")
            }
            AppError::Config(ConfigError::ParseError(_)) => {
                Some("Fix or remove config.toml; defaults apply when it is missing.")
            }
            AppError::Api(ApiError::Unauthorized(_)) | AppError::Api(ApiError::SessionExpired) => {
                Some("Run 'trackops login' to sign in again.")
            }
            AppError::Access(_) => Some("Run 'trackops login' with an account that has access."),
            AppError::Api(ApiError::RateLimited(_)) => Some("Wait a few seconds and rerun the command."),
            AppError::Api(ApiError::Network(_)) => {
                Some("Check the API URL with --api-url or TRACKOPS_API_URL, or use --mock.")
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::ErrorBody;

    #[test]
    fn test_from_config_error() {
        let app_err: AppError = ConfigError::NoConfigDir.into();
        assert!(matches!(app_err, AppError::Config(ConfigError::NoConfigDir)));
        assert!(app_err.is_critical());
    }

    #[test]
    fn test_session_expired() {
        let err = AppError::Api(ApiError::SessionExpired);
        assert!(err.user_message().contains("log in again"));
        assert!(err.is_critical());
        assert!(!err.is_recoverable());
        assert!(err.suggested_action().unwrap().contains("trackops login"));
    }

    #[test]
    fn test_not_found_uses_detail() {
        let mut body = ErrorBody::new("Resource not found");
        body.detail = Some("Issue not found".to_string());
        let err = AppError::Api(ApiError::NotFound(body));
        assert_eq!(err.user_message(), "Not found: Issue not found");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_validation_keeps_detail() {
        let mut body = ErrorBody::new("Validation failed");
        body.detail = Some("unknown value 'later'".to_string());
        let err = AppError::Api(ApiError::Validation(body));
        assert_eq!(err.user_message(), "Validation failed: unknown value 'later'");
        assert!(err.suggested_action().is_none());
    }

    #[test]
    fn test_server_error_is_recoverable() {
        let err = AppError::Api(ApiError::ServerError {
            status: 502,
            body: ErrorBody::new("Bad gateway"),
        });
        assert!(err.is_recoverable());
        assert!(!err.is_critical());
    }

    #[test]
    fn test_config_validation_message() {
        let err = AppError::Config(ConfigError::ValidationError("page_size too big".to_string()));
        assert!(err.user_message().contains("page_size too big"));
    }

    #[test]
    fn test_access_and_other() {
        let err = AppError::access("Superuser access required");
        assert_eq!(err.user_message(), "Superuser access required");
        assert!(err.suggested_action().is_some());
        assert_eq!(AppError::other("boom").user_message(), "boom");
    }
}
