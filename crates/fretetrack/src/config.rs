//! Configuration management for fretetrack.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "fretetrack";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "shipments.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `FRETETRACK_`)
/// 2. TOML config file at `~/.config/fretetrack/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Geocoder configuration.
    pub geocoder: GeocoderConfig,
    /// Tracking behavior configuration.
    pub tracking: TrackingConfig,
    /// First-run bootstrap configuration.
    pub bootstrap: BootstrapConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/fretetrack/shipments.db`
    pub database_path: Option<PathBuf>,
}

/// Geocoder-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    /// Base URL of the Nominatim instance.
    pub endpoint: String,
    /// User-Agent header sent with every request, as required by the
    /// public Nominatim usage policy.
    pub user_agent: String,
    /// Country appended to forward-geocoding queries to bias results.
    /// Set to an empty string to disable.
    pub country_bias: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

/// Tracking-behavior configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Prefix for generated tracking codes (`PREFIX-001`, ...).
    pub code_prefix: String,
    /// Remaining distance below which a position report counts as arrival,
    /// in kilometers. Absorbs GPS and geocoding error near the destination.
    pub arrival_radius_km: f64,
    /// Days from registration to the default estimated delivery date.
    pub default_eta_days: u32,
}

/// First-run bootstrap configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Username of the admin account seeded into an empty database.
    pub admin_username: String,
    /// Password of the seeded admin account.
    pub admin_password: String,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: format!("fretetrack/{}", env!("CARGO_PKG_VERSION")),
            country_bias: "Brazil".to_string(),
            timeout_secs: 15,
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            code_prefix: "FRETE".to_string(),
            arrival_radius_km: 5.0,
            default_eta_days: 3,
        }
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            admin_username: "admin".to_string(),
            admin_password: "mudar123".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `FRETETRACK_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed("FRETETRACK_").split("_"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let prefix = &self.tracking.code_prefix;
        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::ConfigValidation {
                message: format!("code_prefix must be non-empty alphanumeric, got '{prefix}'"),
            });
        }

        if self.tracking.arrival_radius_km < 0.0 {
            return Err(Error::ConfigValidation {
                message: "arrival_radius_km must not be negative".to_string(),
            });
        }

        if self.geocoder.timeout_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "geocoder timeout_secs must be greater than 0".to_string(),
            });
        }

        if self.geocoder.endpoint.is_empty() {
            return Err(Error::ConfigValidation {
                message: "geocoder endpoint must not be empty".to_string(),
            });
        }

        if self.bootstrap.admin_username.is_empty() {
            return Err(Error::ConfigValidation {
                message: "bootstrap admin_username must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the geocoder request timeout as a Duration.
    #[must_use]
    pub fn geocoder_timeout(&self) -> Duration {
        Duration::from_secs(self.geocoder.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.tracking.code_prefix, "FRETE");
        assert!((config.tracking.arrival_radius_km - 5.0).abs() < f64::EPSILON);
        assert_eq!(config.tracking.default_eta_days, 3);
        assert_eq!(config.geocoder.country_bias, "Brazil");
    }

    #[test]
    fn test_default_storage_config() {
        let storage = StorageConfig::default();
        assert!(storage.database_path.is_none());
    }

    #[test]
    fn test_default_geocoder_config() {
        let geocoder = GeocoderConfig::default();

        assert_eq!(geocoder.endpoint, "https://nominatim.openstreetmap.org");
        assert!(geocoder.user_agent.starts_with("fretetrack/"));
        assert_eq!(geocoder.timeout_secs, 15);
    }

    #[test]
    fn test_default_bootstrap_config() {
        let bootstrap = BootstrapConfig::default();
        assert_eq!(bootstrap.admin_username, "admin");
        assert!(!bootstrap.admin_password.is_empty());
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_prefix() {
        let mut config = Config::default();
        config.tracking.code_prefix = String::new();

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("code_prefix"));
    }

    #[test]
    fn test_validate_non_alphanumeric_prefix() {
        let mut config = Config::default();
        config.tracking.code_prefix = "FRE TE".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_negative_arrival_radius() {
        let mut config = Config::default();
        config.tracking.arrival_radius_km = -1.0;

        let result = config.validate();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("arrival_radius_km"));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.geocoder.timeout_secs = 0;

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_validate_empty_endpoint() {
        let mut config = Config::default();
        config.geocoder.endpoint = String::new();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        let path = config.database_path();

        assert!(path.to_string_lossy().contains("shipments.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/db.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/db.sqlite")
        );
    }

    #[test]
    fn test_geocoder_timeout() {
        let config = Config::default();
        assert_eq!(config.geocoder_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("fretetrack"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_default_data_dir() {
        let path = Config::default_data_dir();
        assert!(path.to_string_lossy().contains("fretetrack"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        // Loading from a nonexistent path should work (uses defaults)
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert!(result.is_ok());

        let config = result.unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_serialize() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("code_prefix"));
        assert!(json.contains("arrival_radius_km"));
    }

    #[test]
    fn test_tracking_config_deserialize() {
        let json = r#"{"code_prefix": "RODO", "arrival_radius_km": 2.5}"#;
        let tracking: TrackingConfig = serde_json::from_str(json).unwrap();
        assert_eq!(tracking.code_prefix, "RODO");
        assert!((tracking.arrival_radius_km - 2.5).abs() < f64::EPSILON);
        // Omitted fields fall back to defaults
        assert_eq!(tracking.default_eta_days, 3);
    }
}
