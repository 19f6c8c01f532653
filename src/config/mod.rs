//! Configuration management for jvmlayer

pub mod schema;

pub use schema::{Config, JdkPlanMetadata, JrePlanMetadata, PlanEntry};

use crate::error::{JvmLayerError, JvmLayerResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("jvmlayer")
            .join("config.toml")
    }

    /// Get the default download directory
    pub fn default_download_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("jvmlayer")
            .join("downloads")
    }

    /// Load configuration and apply environment overrides
    pub async fn load(&self) -> JvmLayerResult<Config> {
        let mut config = if self.config_path.exists() {
            self.load_from_file(&self.config_path).await?
        } else {
            debug!("Config file not found, using defaults");
            Config::default()
        };

        config.apply_env()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> JvmLayerResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| JvmLayerError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| JvmLayerError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

/// Resolve a configured path against the current directory
pub fn absolute_path(path: &Path) -> JvmLayerResult<PathBuf> {
    std::path::absolute(path)
        .map_err(|e| JvmLayerError::io(format!("resolving {}", path.display()), e))
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
