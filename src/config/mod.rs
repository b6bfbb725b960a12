//! # CopyMill Executor Configuration
//!
//! Serde-backed configuration for the batch executor. Defaults are compiled in,
//! and the [`ConfigManager`] loader layers an optional TOML file and
//! `COPYMILL_*` environment overrides on top, so the web front end can deploy
//! with a config file while tests construct configs directly.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use copymill_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let concurrency = manager.config().concurrency;
//! # Ok(())
//! # }
//! ```

pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use loader::ConfigManager;

/// Batch executor configuration.
///
/// Field defaults match the production deployment of the generation pipeline:
/// 3 concurrent calls, 2 retries, 1 s base backoff, 45 s per-attempt timeout,
/// 10 admissions per second.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Maximum number of task invocations in flight at once (chunk size)
    pub concurrency: usize,

    /// Retries after the first attempt; every item gets `1 + retry_attempts` attempts
    pub retry_attempts: u32,

    /// Base backoff between attempts; doubled for each subsequent retry
    pub backoff_delay_ms: u64,

    /// Per-attempt timeout for the task function
    pub timeout_ms: u64,

    /// Maximum admissions per trailing one-second window
    pub rate_limit_per_second: u32,

    /// Circuit breaker thresholds for the downstream generation service
    pub circuit_breaker: CircuitBreakerConfig,
}

/// Circuit breaker configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that trip the breaker open
    pub failure_threshold: u32,

    /// Cooldown after opening before a probe attempt is permitted
    pub reset_timeout_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            concurrency: 3,
            retry_attempts: 2,
            backoff_delay_ms: 1000,
            timeout_ms: 45_000,
            rate_limit_per_second: 10,
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout_ms: 30_000,
        }
    }
}

impl ExecutorConfig {
    /// Validate configuration before an executor is constructed
    pub fn validate(&self) -> std::result::Result<(), ConfigurationError> {
        if self.concurrency == 0 {
            return Err(ConfigurationError::invalid_value(
                "concurrency",
                self.concurrency,
                "must be at least 1",
            ));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "timeout_ms",
                self.timeout_ms,
                "must be at least 1",
            ));
        }
        if self.rate_limit_per_second == 0 {
            return Err(ConfigurationError::invalid_value(
                "rate_limit_per_second",
                self.rate_limit_per_second,
                "must be at least 1",
            ));
        }
        self.circuit_breaker.validate()
    }

    /// Per-attempt timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Base backoff delay as a Duration
    pub fn backoff_delay(&self) -> Duration {
        Duration::from_millis(self.backoff_delay_ms)
    }

    /// Total attempts an item receives before it is reported failed
    pub fn max_attempts(&self) -> u32 {
        self.retry_attempts.saturating_add(1)
    }
}

impl CircuitBreakerConfig {
    /// Validate breaker thresholds
    pub fn validate(&self) -> std::result::Result<(), ConfigurationError> {
        if self.failure_threshold == 0 {
            return Err(ConfigurationError::invalid_value(
                "circuit_breaker.failure_threshold",
                self.failure_threshold,
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Open-state cooldown as a Duration
    pub fn reset_timeout(&self) -> Duration {
        Duration::from_millis(self.reset_timeout_ms)
    }
}

/// Errors raised while loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// A field holds a value outside its permitted range
    #[error("Invalid value for '{field}': {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// The underlying source (file, environment) could not be read or parsed
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] ::config::ConfigError),
}

impl ConfigurationError {
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl std::fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_settings() {
        let config = ExecutorConfig::default();
        assert_eq!(config.concurrency, 3);
        assert_eq!(config.retry_attempts, 2);
        assert_eq!(config.backoff_delay_ms, 1000);
        assert_eq!(config.timeout_ms, 45_000);
        assert_eq!(config.rate_limit_per_second, 10);
        assert_eq!(config.circuit_breaker.failure_threshold, 5);
        assert_eq!(config.circuit_breaker.reset_timeout_ms, 30_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn max_attempts_includes_first_attempt() {
        let config = ExecutorConfig {
            retry_attempts: 2,
            ..ExecutorConfig::default()
        };
        assert_eq!(config.max_attempts(), 3);
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let config = ExecutorConfig {
            concurrency: 0,
            ..ExecutorConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("concurrency"));
    }

    #[test]
    fn zero_failure_threshold_is_rejected() {
        let config = ExecutorConfig {
            circuit_breaker: CircuitBreakerConfig {
                failure_threshold: 0,
                ..CircuitBreakerConfig::default()
            },
            ..ExecutorConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
