//! Structured error handling for the executor core.
//!
//! Orchestration-level failures (malformed configuration, logging setup) are
//! distinct from per-item task failures: the former propagate out of the
//! public entry points, the latter are collected into the batch result and
//! never abort a batch. Per-item errors live in [`crate::executor::AttemptError`].

use crate::config::ConfigurationError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Executor was constructed or loaded with invalid configuration
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
