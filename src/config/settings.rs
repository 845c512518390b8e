//! Application settings configuration.

use serde::{Deserialize, Serialize};

use super::{ConfigError, Result};

/// Application-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// The name of the default profile to use.
    pub default_profile: Option<String>,
    /// Items per page for list commands.
    pub page_size: u32,
    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
    /// Simulated latency of the mock backend in milliseconds.
    pub mock_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_profile: None,
            page_size: 20,
            timeout_secs: 30,
            mock_delay_ms: 300,
        }
    }
}

impl Settings {
    /// Maximum page size the backend accepts.
    pub const MAX_PAGE_SIZE: u32 = 100;

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 || self.page_size > Self::MAX_PAGE_SIZE {
            return Err(ConfigError::ValidationError(format!(
                "page_size must be between 1 and {}",
                Self::MAX_PAGE_SIZE
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.page_size, 20);
        assert_eq!(settings.timeout_secs, 30);
        assert_eq!(settings.mock_delay_ms, 300);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let settings: Settings = toml::from_str("page_size = 50").unwrap();
        assert_eq!(settings.page_size, 50);
        assert_eq!(settings.timeout_secs, 30);
    }

    #[test]
    fn test_page_size_bounds() {
        let settings = Settings {
            page_size: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());

        let settings = Settings {
            page_size: 101,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let settings = Settings {
            timeout_secs: 0,
            ..Settings::default()
        };
        assert!(settings
            .validate()
            .unwrap_err()
            .to_string()
            .contains("timeout_secs"));
    }
}
