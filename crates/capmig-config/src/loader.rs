//! Configuration loading: TOML file plus CAPMIG_* environment overrides

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::types::AppConfig;

const ENV_PREFIX: &str = "CAPMIG";

/// Loads and validates the application configuration
pub struct ConfigLoader {
    config_path: PathBuf,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
        }
    }

    fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("capmig")
            .join("config.toml")
    }

    /// Loads the file (if present) with environment overrides layered
    /// on top, e.g. `CAPMIG_OKAPI__URL` for `okapi.url`
    pub fn load(&self) -> Result<AppConfig> {
        debug!(path = %self.config_path.display(), "loading configuration");
        let builder = Config::builder()
            .add_source(File::from(self.config_path.clone()).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

        let config = builder.build()?;
        let app_config: AppConfig = config.try_deserialize()?;
        Ok(app_config)
    }

    pub fn save(&self, config: &AppConfig) -> Result<()> {
        let toml = toml::to_string(config)?;
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.config_path, toml)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Checks that a loaded configuration can drive a migration run
pub fn validate(config: &AppConfig) -> Result<()> {
    if config.okapi.url.is_empty() {
        return Err(ConfigError::Validation("okapi.url must be set".to_string()));
    }
    if config.okapi.tenant.is_empty() {
        return Err(ConfigError::Validation(
            "okapi.tenant must be set".to_string(),
        ));
    }
    if config.eureka.url.is_empty() {
        return Err(ConfigError::Validation(
            "eureka.url must be set".to_string(),
        ));
    }
    if config.okapi.page_size == 0 || config.eureka.page_size == 0 {
        return Err(ConfigError::Validation(
            "page sizes must be greater than 0".to_string(),
        ));
    }
    if config.migration.enforce_token_limit && config.migration.max_token_length == 0 {
        return Err(ConfigError::Validation(
            "migration.max_token_length must be greater than 0 when enforced".to_string(),
        ));
    }
    Ok(())
}
