//! Backend profile configuration.

use serde::{Deserialize, Serialize};

use super::{ConfigError, Result};

/// A named TrackOps backend.
///
/// Session tokens are stored separately in the OS keychain, keyed by the
/// profile name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    /// Must be non-empty, whitespace-free and unique across profiles.
    pub name: String,

    /// The API base URL, e.g. `https://ops.example.com/api/v1`.
    pub api_url: String,
}

impl Profile {
    pub fn new(name: String, api_url: String) -> Self {
        Self { name, api_url }
    }

    /// Validate this profile.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError::ValidationError` with details if validation fails.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(ConfigError::ValidationError(
                "profile name cannot be empty".to_string(),
            ));
        }

        if self.name.contains(char::is_whitespace) {
            return Err(ConfigError::ValidationError(format!(
                "profile name '{}' cannot contain whitespace",
                self.name
            )));
        }

        if self.api_url.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "profile '{}': API URL cannot be empty",
                self.name
            )));
        }

        if !self.api_url.starts_with("https://") && !self.api_url.starts_with("http://") {
            return Err(ConfigError::ValidationError(format!(
                "profile '{}': API URL must start with http:// or https://",
                self.name
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str, url: &str) -> Profile {
        Profile::new(name.to_string(), url.to_string())
    }

    #[test]
    fn test_valid_profile() {
        assert!(profile("local", "http://localhost:8000/api/v1")
            .validate()
            .is_ok());
        assert!(profile("prod", "https://ops.example.com/api/v1")
            .validate()
            .is_ok());
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = profile("", "https://ops.example.com").validate().unwrap_err();
        assert!(err.to_string().contains("name cannot be empty"));
    }

    #[test]
    fn test_whitespace_name_rejected() {
        let err = profile("my prod", "https://ops.example.com")
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("cannot contain whitespace"));
    }

    #[test]
    fn test_empty_url_rejected() {
        let err = profile("prod", "").validate().unwrap_err();
        assert!(err.to_string().contains("API URL cannot be empty"));
    }

    #[test]
    fn test_invalid_url_scheme_rejected() {
        let err = profile("prod", "ops.example.com").validate().unwrap_err();
        assert!(err.to_string().contains("must start with http"));
    }

    #[test]
    fn test_profile_serialization() {
        let original = profile("prod", "https://ops.example.com/api/v1");
        let toml_str = toml::to_string(&original).unwrap();
        let parsed: Profile = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, original);
    }
}
