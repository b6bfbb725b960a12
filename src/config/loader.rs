//! Configuration Loader
//!
//! Environment-aware configuration loading. Compiled-in defaults are merged
//! with an optional TOML file and `COPYMILL_*` environment variable overrides,
//! in that order. Nested keys use a double-underscore separator, e.g.
//! `COPYMILL_CIRCUIT_BREAKER__FAILURE_THRESHOLD=3`.

use super::{ConfigurationError, ExecutorConfig};
use ::config::{Config, Environment, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Environment variable naming the config file to load
pub const CONFIG_PATH_VAR: &str = "COPYMILL_CONFIG";

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "copymill.toml";

type ConfigResult<T> = std::result::Result<T, ConfigurationError>;

/// Loaded, validated configuration plus provenance for diagnostics
#[derive(Debug)]
pub struct ConfigManager {
    config: ExecutorConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration with file auto-discovery.
    ///
    /// Uses the file named by `COPYMILL_CONFIG` if set, otherwise
    /// `copymill.toml` in the working directory if present, otherwise
    /// defaults plus environment overrides alone.
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        let path = std::env::var(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from_file(&path, false)
    }

    /// Load configuration from an explicit file path.
    ///
    /// With `required` set, a missing file is an error; otherwise the loader
    /// falls through to defaults and environment overrides.
    pub fn load_from_file(path: &Path, required: bool) -> ConfigResult<Arc<ConfigManager>> {
        debug!(
            config_file = %path.display(),
            required,
            "Loading executor configuration"
        );

        let merged = Config::builder()
            .add_source(Config::try_from(&ExecutorConfig::default())?)
            .add_source(File::from(path).required(required))
            .add_source(Environment::with_prefix("COPYMILL").separator("__"))
            .build()?;

        let config: ExecutorConfig = merged.try_deserialize()?;
        config.validate()?;

        debug!(
            concurrency = config.concurrency,
            retry_attempts = config.retry_attempts,
            rate_limit_per_second = config.rate_limit_per_second,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            config_path: path.exists().then(|| path.to_path_buf()),
        }))
    }

    /// The loaded configuration
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// The file the configuration was loaded from, if one existed
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// JSON view of the active configuration for debug logging
    pub fn debug_config(&self) -> serde_json::Value {
        serde_json::to_value(&self.config).unwrap_or(serde_json::Value::Null)
    }
}
