//! Configuration management
//!
//! Configuration for the record layer. It can be loaded from:
//! - a YAML file
//! - environment variables (override file settings)
//!
//! Missing optional values are filled with the platform's defaults
//! (`wp_` table prefix, SQLite at `data/wordpress.db`, UTC site clock).

use serde::{Deserialize, Serialize};

/// Largest offset the platform accepts for a site clock (UTC+14).
const MAX_GMT_OFFSET_MINUTES: i32 = 14 * 60;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Site clock configuration
    #[serde(default)]
    pub site: SiteConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database driver (sqlite or mysql)
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Prefix shared by every table of the installation
    #[serde(default = "default_table_prefix")]
    pub table_prefix: String,
    /// Upper bound on pooled connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
            table_prefix: default_table_prefix(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_database_url() -> String {
    "data/wordpress.db".to_string()
}

fn default_table_prefix() -> String {
    "wp_".to_string()
}

fn default_max_connections() -> u32 {
    10
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    /// SQLite (default)
    #[default]
    Sqlite,
    /// MySQL
    Mysql,
}

/// Site clock configuration
///
/// The platform stores every timestamp twice: once in site-local time and
/// once in UTC (`*_gmt` columns). The offset tells the two apart.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site-local offset from UTC in minutes (e.g. 330 for UTC+5:30)
    #[serde(default)]
    pub gmt_offset_minutes: i32,
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            }
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables:
    /// - WP_RECORDS_DATABASE_DRIVER
    /// - WP_RECORDS_DATABASE_URL
    /// - WP_RECORDS_TABLE_PREFIX
    /// - WP_RECORDS_MAX_CONNECTIONS
    /// - WP_RECORDS_GMT_OFFSET_MINUTES
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Check the values that end up inside SQL text or clock arithmetic.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_table_prefix(&self.database.table_prefix)?;

        if self.database.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "max_connections must be at least 1".to_string(),
            ));
        }

        if self.site.gmt_offset_minutes.abs() > MAX_GMT_OFFSET_MINUTES {
            return Err(ConfigError::ValidationError(format!(
                "gmt_offset_minutes {} is outside +/-{}",
                self.site.gmt_offset_minutes, MAX_GMT_OFFSET_MINUTES
            )));
        }

        Ok(())
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        if let Ok(driver) = std::env::var("WP_RECORDS_DATABASE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "sqlite" => self.database.driver = DatabaseDriver::Sqlite,
                "mysql" => self.database.driver = DatabaseDriver::Mysql,
                _ => {} // Ignore invalid values
            }
        }
        if let Ok(url) = std::env::var("WP_RECORDS_DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(prefix) = std::env::var("WP_RECORDS_TABLE_PREFIX") {
            if validate_table_prefix(&prefix).is_ok() {
                self.database.table_prefix = prefix;
            }
        }
        if let Ok(max) = std::env::var("WP_RECORDS_MAX_CONNECTIONS") {
            if let Ok(max) = max.parse::<u32>() {
                if max > 0 {
                    self.database.max_connections = max;
                }
            }
        }
        if let Ok(offset) = std::env::var("WP_RECORDS_GMT_OFFSET_MINUTES") {
            if let Ok(offset) = offset.parse::<i32>() {
                if offset.abs() <= MAX_GMT_OFFSET_MINUTES {
                    self.site.gmt_offset_minutes = offset;
                }
            }
        }
    }
}

/// Table prefixes are spliced into SQL, so only `[A-Za-z0-9_]` is allowed.
pub fn validate_table_prefix(prefix: &str) -> Result<(), ConfigError> {
    if prefix.is_empty() {
        return Err(ConfigError::ValidationError(
            "table_prefix must not be empty".to_string(),
        ));
    }
    if let Some(bad) = prefix
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_'))
    {
        return Err(ConfigError::ValidationError(format!(
            "table_prefix '{}' contains invalid character '{}'",
            prefix, bad
        )));
    }
    Ok(())
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
