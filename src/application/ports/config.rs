//! Configuration port interface

use std::path::PathBuf;

use async_trait::async_trait;

use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;

/// Port for persisted daemon configuration
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load the stored config. A missing file yields an empty config.
    async fn load(&self) -> Result<AppConfig, ConfigError>;

    /// Persist the whole config, creating parent directories as needed.
    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError>;

    fn path(&self) -> PathBuf;

    fn exists(&self) -> bool;

    /// Write a config file populated with defaults.
    /// Fails with `AlreadyExists` if one is present.
    async fn init(&self) -> Result<(), ConfigError>;

    /// Defaults overlaid with the stored file.
    /// An unreadable file is logged and treated as empty.
    async fn load_over_defaults(&self) -> AppConfig {
        match self.load().await {
            Ok(file) => AppConfig::defaults().merge(file),
            Err(e) => {
                tracing::warn!(path = %self.path().display(), error = %e, "ignoring config file");
                AppConfig::defaults()
            }
        }
    }
}
