//! Configuration management for TrackOps.
//!
//! Configuration lives in `<config_dir>/trackops/config.toml` and holds
//! application settings plus named profiles, one per backend. Environment
//! variables override the active profile's URL and the request timeout.

mod profile;
mod settings;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

pub use profile::Profile;
pub use settings::Settings;

/// Overrides the active profile's API base URL.
pub const ENV_API_URL: &str = "TRACKOPS_API_URL";

/// Overrides the request timeout, in milliseconds.
pub const ENV_API_TIMEOUT: &str = "TRACKOPS_API_TIMEOUT";

/// Base URL used when no profile is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";

/// Name of the profile synthesized when none is configured.
pub const DEFAULT_PROFILE_NAME: &str = "default";

const APP_DIR: &str = "trackops";
const CONFIG_FILE: &str = "config.toml";

/// Errors that can occur while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine the configuration directory")]
    NoConfigDir,

    #[error("failed to create configuration directory: {0}")]
    CreateDirError(#[source] std::io::Error),

    #[error("failed to read configuration file: {0}")]
    ReadError(#[source] std::io::Error),

    #[error("failed to write configuration file: {0}")]
    WriteError(#[source] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("failed to serialize configuration: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    ValidationError(String),

    #[error("profile '{0}' not found")]
    ProfileNotFound(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// The full configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub profiles: Vec<Profile>,
}

impl Config {
    /// Path of the configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoConfigDir` if the platform has no config
    /// directory.
    pub fn config_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load the configuration from the default location.
    ///
    /// A missing file yields the default configuration.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load the configuration from `path`.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No configuration at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;

        info!(
            "Loaded configuration with {} profile(s) from {}",
            config.profiles.len(),
            path.display()
        );
        Ok(config)
    }

    /// Save the configuration to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save the configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(ConfigError::CreateDirError)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents).map_err(ConfigError::WriteError)?;
        info!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Validate settings and every profile.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` for invalid values or duplicate
    /// profile names.
    pub fn validate(&self) -> Result<()> {
        self.settings.validate()?;

        for (i, profile) in self.profiles.iter().enumerate() {
            profile.validate()?;
            if self.profiles[..i].iter().any(|p| p.name == profile.name) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate profile name '{}'",
                    profile.name
                )));
            }
        }
        Ok(())
    }

    /// Find a profile by name.
    pub fn get_profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// The default profile: the one named in settings, else the first.
    pub fn get_default_profile(&self) -> Option<&Profile> {
        self.settings
            .default_profile
            .as_deref()
            .and_then(|name| self.get_profile(name))
            .or_else(|| self.profiles.first())
    }

    /// Add a profile, or replace the one with the same name.
    pub fn upsert_profile(&mut self, profile: Profile) -> Result<()> {
        profile.validate()?;
        match self.profiles.iter_mut().find(|p| p.name == profile.name) {
            Some(existing) => *existing = profile,
            None => self.profiles.push(profile),
        }
        Ok(())
    }

    /// Pick the profile for this run and apply environment overrides.
    ///
    /// With `name` set, that profile must exist. Without it, the default
    /// profile is used, or a `default` profile pointing at
    /// [`DEFAULT_API_URL`] when none is configured.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ProfileNotFound` for an unknown name, and
    /// `ConfigError::ValidationError` if an override is malformed.
    pub fn resolve(&self, name: Option<&str>) -> Result<ResolvedConfig> {
        let mut profile = match name {
            Some(name) => self
                .get_profile(name)
                .cloned()
                .ok_or_else(|| ConfigError::ProfileNotFound(name.to_string()))?,
            None => self.get_default_profile().cloned().unwrap_or_else(|| {
                Profile::new(DEFAULT_PROFILE_NAME.to_string(), DEFAULT_API_URL.to_string())
            }),
        };

        let mut timeout = Duration::from_secs(self.settings.timeout_secs);

        if let Ok(url) = std::env::var(ENV_API_URL) {
            if !url.trim().is_empty() {
                debug!("Overriding API URL from {}", ENV_API_URL);
                profile.api_url = url;
            }
        }

        if let Ok(raw) = std::env::var(ENV_API_TIMEOUT) {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => timeout = Duration::from_millis(ms),
                _ => {
                    warn!("Ignoring invalid {}: {:?}", ENV_API_TIMEOUT, raw);
                }
            }
        }

        profile.validate()?;

        Ok(ResolvedConfig {
            profile,
            timeout,
            page_size: self.settings.page_size,
            mock_delay: Duration::from_millis(self.settings.mock_delay_ms),
        })
    }
}

/// The effective settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub profile: Profile,
    pub timeout: Duration,
    pub page_size: u32,
    pub mock_delay: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn sample_config() -> Config {
        Config {
            settings: Settings {
                default_profile: Some("staging".to_string()),
                ..Settings::default()
            },
            profiles: vec![
                Profile::new("local".to_string(), DEFAULT_API_URL.to_string()),
                Profile::new(
                    "staging".to_string(),
                    "https://staging.example.com/api/v1".to_string(),
                ),
            ],
        }
    }

    fn clear_env() {
        std::env::remove_var(ENV_API_URL);
        std::env::remove_var(ENV_API_TIMEOUT);
    }

    #[test]
    fn test_load_missing_file_returns_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = sample_config();
        config.save_to(&path).unwrap();
        assert!(path.exists());

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_rejects_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "profiles = 3").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_duplicate_profiles_rejected() {
        let mut config = sample_config();
        config
            .profiles
            .push(Profile::new("local".to_string(), DEFAULT_API_URL.to_string()));

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate profile name 'local'"));
    }

    #[test]
    fn test_default_profile_selection() {
        let config = sample_config();
        assert_eq!(config.get_default_profile().unwrap().name, "staging");

        let mut config = sample_config();
        config.settings.default_profile = None;
        assert_eq!(config.get_default_profile().unwrap().name, "local");
    }

    #[test]
    fn test_upsert_profile_replaces() {
        let mut config = sample_config();
        config
            .upsert_profile(Profile::new(
                "local".to_string(),
                "http://127.0.0.1:9000/api/v1".to_string(),
            ))
            .unwrap();

        assert_eq!(config.profiles.len(), 2);
        assert_eq!(
            config.get_profile("local").unwrap().api_url,
            "http://127.0.0.1:9000/api/v1"
        );
    }

    #[test]
    #[serial]
    fn test_resolve_without_profiles_uses_default_url() {
        clear_env();
        let resolved = Config::default().resolve(None).unwrap();
        assert_eq!(resolved.profile.name, DEFAULT_PROFILE_NAME);
        assert_eq!(resolved.profile.api_url, DEFAULT_API_URL);
        assert_eq!(resolved.timeout, Duration::from_secs(30));
        assert_eq!(resolved.page_size, 20);
    }

    #[test]
    #[serial]
    fn test_resolve_unknown_profile() {
        clear_env();
        let err = sample_config().resolve(Some("prod")).unwrap_err();
        assert!(matches!(err, ConfigError::ProfileNotFound(name) if name == "prod"));
    }

    #[test]
    #[serial]
    fn test_resolve_applies_env_overrides() {
        clear_env();
        std::env::set_var(ENV_API_URL, "https://override.example.com/api/v1");
        std::env::set_var(ENV_API_TIMEOUT, "5000");

        let resolved = sample_config().resolve(Some("local")).unwrap();
        assert_eq!(resolved.profile.api_url, "https://override.example.com/api/v1");
        assert_eq!(resolved.timeout, Duration::from_millis(5000));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_resolve_ignores_bad_timeout() {
        clear_env();
        std::env::set_var(ENV_API_TIMEOUT, "soon");

        let resolved = sample_config().resolve(None).unwrap();
        assert_eq!(resolved.timeout, Duration::from_secs(30));

        clear_env();
    }
}
