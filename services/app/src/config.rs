//! services/app/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub blob_dir: PathBuf,
    pub blob_inline_limit: usize,
    pub log_level: Level,
    pub default_collection_name: String,
    pub export_path: PathBuf,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Load Store Settings ---
        let in_memory = match lookup("STORE_IN_MEMORY") {
            Some(raw) => parse_bool("STORE_IN_MEMORY", &raw)?,
            None => false,
        };
        let database_url = if in_memory {
            "sqlite::memory:".to_string()
        } else {
            lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://clothesline.db".to_string())
        };
        if database_url.trim().is_empty() {
            return Err(ConfigError::MissingVar("DATABASE_URL".to_string()));
        }

        let blob_dir = lookup("BLOB_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./blobs"));

        let blob_inline_limit = match lookup("BLOB_INLINE_LIMIT") {
            Some(raw) => raw.trim().parse::<usize>().map_err(|e| {
                ConfigError::InvalidValue("BLOB_INLINE_LIMIT".to_string(), e.to_string())
            })?,
            None => 4096,
        };

        // --- Load Logging ---
        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load App Settings ---
        let default_collection_name =
            lookup("DEFAULT_COLLECTION_NAME").unwrap_or_else(|| "Main".to_string());
        if default_collection_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "DEFAULT_COLLECTION_NAME".to_string(),
                "must not be empty".to_string(),
            ));
        }

        let export_path = lookup("EXPORT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("clothesline.json"));

        Ok(Self {
            database_url,
            blob_dir,
            blob_inline_limit,
            log_level,
            default_collection_name,
            export_path,
        })
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidValue(
            key.to_string(),
            format!("'{}' is not a boolean", other),
        )),
    }
}
