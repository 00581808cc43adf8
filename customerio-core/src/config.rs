//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/customerio/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/customerio/` (~/.config/customerio/)
//! - State/Logs: `$XDG_STATE_HOME/customerio/` (~/.local/state/customerio/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Default Track API base URL
pub const DEFAULT_ENDPOINT: &str = "https://track.customer.io/api";

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Track API credentials
    #[serde(default)]
    pub track: TrackConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Track API configuration
#[derive(Deserialize, Clone)]
pub struct TrackConfig {
    /// Site ID from the Customer.io account settings
    pub site_id: Option<String>,

    /// Track API key
    pub api_key: Option<String>,

    /// Base URL, without a trailing slash
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

impl fmt::Debug for TrackConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackConfig")
            .field("site_id", &self.site_id)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            site_id: None,
            api_key: None,
            endpoint: default_endpoint(),
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

impl TrackConfig {
    /// Check if both credentials are present
    pub fn is_ready(&self) -> bool {
        self.site_id.as_deref().is_some_and(|s| !s.is_empty())
            && self.api_key.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.site_id.as_deref().map_or(true, str::is_empty) {
            return Err(Error::Config("track.site_id is required".to_string()));
        }
        if self.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(Error::Config("track.api_key is required".to_string()));
        }
        if self.endpoint.trim().is_empty() {
            return Err(Error::Config("track.endpoint must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/customerio/config.toml` (~/.config/customerio/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("customerio").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/customerio/` (~/.local/state/customerio/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("customerio")
    }

    /// Returns the log file written by [`crate::logging::init`]
    ///
    /// `$XDG_STATE_HOME/customerio/customerio.log` (~/.local/state/customerio/customerio.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("customerio.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.track.endpoint, DEFAULT_ENDPOINT);
        assert!(config.track.site_id.is_none());
        assert_eq!(config.logging.level, "info");
        assert!(!config.track.is_ready());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[track]
site_id = "site-123"
api_key = "key-456"

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.track.site_id.as_deref(), Some("site-123"));
        assert_eq!(config.track.api_key.as_deref(), Some("key-456"));
        assert_eq!(config.track.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.logging.level, "debug");
        assert!(config.track.is_ready());
    }

    #[test]
    fn test_parse_endpoint_override() {
        let toml = r#"
[track]
site_id = "site"
api_key = "key"
endpoint = "http://localhost:8080/api"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.track.endpoint, "http://localhost:8080/api");
    }

    #[test]
    fn test_track_config_validation() {
        let config = TrackConfig::default();
        assert!(config.validate().is_err());

        let config = TrackConfig {
            site_id: Some("site".to_string()),
            api_key: Some(String::new()),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("track.api_key"));

        let config = TrackConfig {
            site_id: Some("site".to_string()),
            api_key: Some("key".to_string()),
            endpoint: "  ".to_string(),
        };
        assert!(config.validate().is_err());

        let config = TrackConfig {
            site_id: Some("site".to_string()),
            api_key: Some("key".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert!(config.is_ready());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = TrackConfig {
            site_id: Some("site".to_string()),
            api_key: Some("super-secret".to_string()),
            ..Default::default()
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_log_path_is_inside_state_dir() {
        let path = Config::log_path();
        assert_eq!(path.parent(), Some(Config::state_dir().as_path()));
        assert!(path.ends_with("customerio/customerio.log"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[track]\nsite_id = \"s\"\napi_key = \"k\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(config.track.is_ready());
    }

    #[test]
    fn test_load_from_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[track\nsite_id = ").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
