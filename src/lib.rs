#![allow(clippy::doc_markdown)] // Allow technical terms like CopyMill, TOML in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # CopyMill Core Rust
//!
//! High-performance Rust implementation of the batch generation executor behind
//! the CopyMill web front end.
//!
//! ## Overview
//!
//! CopyMill asks a slow, rate-limited, occasionally-failing text-generation
//! service to write many short marketing texts. This crate is the engine that
//! drives those calls: a generic, reusable batch executor that runs N
//! independent asynchronous jobs under a concurrency ceiling, a global
//! sliding-window rate limit, bounded retries with exponential backoff, and a
//! circuit breaker that fails fast during sustained outages.
//!
//! The executor knows nothing about CSV schemas, prompt templates, scoring, or
//! persistence. It operates on opaque work items and an opaque task function
//! supplied by the caller, and returns exactly one outcome per item.
//!
//! ## Module Organization
//!
//! - [`executor`] - Chunked parallel dispatcher, retry policy, result aggregation
//! - [`resilience`] - Circuit breaker and sliding-window rate limiter
//! - [`config`] - Configuration structs, validation, and file/env loading
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging initialization
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use copymill_core::{BatchExecutor, ExecutorConfig};
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("generation failed: {0}")]
//! struct GenerationError(String);
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let executor = BatchExecutor::new(ExecutorConfig::default())?;
//!
//! let prompts = vec!["spring sale".to_string(), "new arrivals".to_string()];
//! let batch = executor
//!     .execute_batch(prompts, |prompt, _index| async move {
//!         // Call the generation service here
//!         Ok::<String, GenerationError>(format!("copy for {prompt}"))
//!     })
//!     .await;
//!
//! println!(
//!     "{} of {} items succeeded",
//!     batch.success.len(),
//!     batch.statistics.total_processed
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency Model
//!
//! Work items are split into chunks of at most `concurrency` items. A chunk's
//! attempts are driven concurrently on the calling task and the chunk is a hard
//! barrier: no call from chunk *i+1* starts before chunk *i* fully settles, so
//! at most `concurrency` task invocations are ever in flight. The rate limiter
//! is consulted once between chunks, and the circuit breaker is shared by every
//! attempt (and across batches when the executor is reused).

pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod resilience;

pub use config::{CircuitBreakerConfig, ConfigManager, ConfigurationError, ExecutorConfig};
pub use error::{CoreError, Result};
pub use executor::{
    AttemptError, BatchExecutor, BatchResult, BatchStatistics, ExecutionOutcome, FailedItem,
    ProgressCallback,
};
pub use resilience::{CircuitBreaker, CircuitBreakerMetrics, CircuitState, SlidingWindowRateLimiter};
