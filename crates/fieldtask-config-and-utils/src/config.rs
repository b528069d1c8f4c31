//! Configuration management.
//!
//! Cloud identifiers are baked in at compile time (from `secrets.properties`
//! style env vars) and may be overridden by the on-disk config file.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default Cognito region (can be overridden at compile time via AMAZON_COGNITO_REGION).
pub const DEFAULT_COGNITO_REGION: &str = match option_env!("AMAZON_COGNITO_REGION") {
    Some(region) => region,
    None => "ap-southeast-2",
};

/// Default Cognito identity pool for unauthenticated (guest) access.
/// Empty unless AMAZON_COGNITO_IDENTITY_POOL_ID is set at compile time.
pub const DEFAULT_COGNITO_IDENTITY_POOL_ID: &str =
    match option_env!("AMAZON_COGNITO_IDENTITY_POOL_ID") {
        Some(pool) => pool,
        None => "",
    };

/// Default DynamoDB region (can be overridden at compile time via AMAZON_DYNAMODB_REGION).
pub const DEFAULT_DYNAMODB_REGION: &str = match option_env!("AMAZON_DYNAMODB_REGION") {
    Some(region) => region,
    None => "ap-southeast-2",
};

/// Device registration table. Shared with older clients, so the name is fixed.
pub const DEFAULT_DEVICES_TABLE: &str = "fieldtask-mobilehub-447720176-devices";

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Registration client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Region hosting the Cognito identity pool.
    #[serde(default = "default_cognito_region")]
    pub cognito_region: String,
    /// Cognito identity pool id.
    #[serde(default = "default_cognito_identity_pool_id")]
    pub cognito_identity_pool_id: String,
    /// Region hosting the devices table.
    #[serde(default = "default_dynamodb_region")]
    pub dynamodb_region: String,
    /// Devices table name.
    #[serde(default = "default_devices_table")]
    pub devices_table: String,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_cognito_region() -> String {
    DEFAULT_COGNITO_REGION.to_string()
}

fn default_cognito_identity_pool_id() -> String {
    DEFAULT_COGNITO_IDENTITY_POOL_ID.to_string()
}

fn default_dynamodb_region() -> String {
    DEFAULT_DYNAMODB_REGION.to_string()
}

fn default_devices_table() -> String {
    DEFAULT_DEVICES_TABLE.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            cognito_region: default_cognito_region(),
            cognito_identity_pool_id: default_cognito_identity_pool_id(),
            dynamodb_region: default_dynamodb_region(),
            devices_table: default_devices_table(),
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from the config file, falling back to defaults.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the config file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// Override configuration from environment variables.
    fn load_from_env(&mut self) {
        if let Ok(log_level) = std::env::var("FIELDTASK_LOG_LEVEL") {
            self.log_level = log_level;
        }
    }

    /// Check that the cloud identifiers required for registration are present.
    pub fn validate(&self) -> CoreResult<()> {
        if self.cognito_identity_pool_id.trim().is_empty() {
            return Err(CoreError::Config(
                "cognito_identity_pool_id must be set (AMAZON_COGNITO_IDENTITY_POOL_ID)".into(),
            ));
        }
        if self.cognito_region.trim().is_empty() {
            return Err(CoreError::Config(
                "cognito_region must be set (AMAZON_COGNITO_REGION)".into(),
            ));
        }
        if self.dynamodb_region.trim().is_empty() {
            return Err(CoreError::Config(
                "dynamodb_region must be set (AMAZON_DYNAMODB_REGION)".into(),
            ));
        }
        if self.devices_table.trim().is_empty() {
            return Err(CoreError::Config("devices_table must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn valid_config() -> Config {
        Config {
            cognito_identity_pool_id: "ap-southeast-2:0000-pool".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.cognito_region, DEFAULT_COGNITO_REGION);
        assert_eq!(config.dynamodb_region, DEFAULT_DYNAMODB_REGION);
        assert_eq!(config.devices_table, "fieldtask-mobilehub-447720176-devices");
    }

    #[test]
    fn test_config_load_from_file_fills_missing_fields() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");

        std::fs::write(
            &config_path,
            r#"{ "log_level": "debug", "cognito_identity_pool_id": "us-east-1:abc" }"#,
        )
        .unwrap();

        let config = Config::load_from_file(&config_path).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.cognito_identity_pool_id, "us-east-1:abc");
        assert_eq!(config.devices_table, DEFAULT_DEVICES_TABLE);
    }

    #[test]
    fn test_config_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let mut config = valid_config();
        config.dynamodb_region = "eu-west-1".to_string();
        config.save(&paths).unwrap();

        let loaded = Config::load(&paths).unwrap();
        assert_eq!(loaded.dynamodb_region, "eu-west-1");
        assert_eq!(loaded.cognito_identity_pool_id, "ap-southeast-2:0000-pool");
    }

    #[test]
    fn test_config_load_nonexistent_uses_defaults() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let config = Config::load(&paths).unwrap();
        assert_eq!(config.devices_table, DEFAULT_DEVICES_TABLE);
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_pool() {
        let mut config = valid_config();
        config.cognito_identity_pool_id = "   ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("cognito_identity_pool_id"));
    }

    #[test]
    fn test_validate_rejects_blank_regions() {
        let mut config = valid_config();
        config.cognito_region = String::new();
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.dynamodb_region = String::new();
        assert!(config.validate().is_err());
    }
}
