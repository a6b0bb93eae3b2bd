//! Configuration for the client.

use std::env;
use std::path::PathBuf;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the remote task service
    pub api_base_url: String,
    /// Request timeout in milliseconds
    pub api_timeout_ms: u64,
    /// Directory the offline queue is persisted under
    pub data_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables, with defaults for
    /// anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_base_url =
            env::var("STASH_API_URL").unwrap_or_else(|_| "http://localhost:3001/api".to_string());

        let api_timeout_ms = env::var("STASH_API_TIMEOUT_MS")
            .unwrap_or_else(|_| "10000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidTimeout)?;

        let data_dir = env::var("STASH_DATA_DIR")
            .unwrap_or_else(|_| ".stash".to_string())
            .into();

        Ok(Self {
            api_base_url,
            api_timeout_ms,
            data_dir,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid STASH_API_TIMEOUT_MS value")]
    InvalidTimeout,
}
