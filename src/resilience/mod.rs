//! # Resilience Module
//!
//! Fault tolerance for the downstream generation service: a circuit breaker
//! that fails fast during sustained outages and a sliding-window rate limiter
//! that bounds admissions per trailing one-second window.
//!
//! Both components are singletons owned by one [`crate::BatchExecutor`]
//! instance and shared by every concurrent attempt within a batch (and across
//! batches when the executor is reused). All check-and-update sequences are
//! serialized internally, so callers never need external locking.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use copymill_core::config::CircuitBreakerConfig;
//! use copymill_core::resilience::CircuitBreaker;
//!
//! # async fn example() {
//! let config = CircuitBreakerConfig {
//!     failure_threshold: 5,
//!     reset_timeout_ms: 30_000,
//! };
//! let breaker = CircuitBreaker::new("generation_service".to_string(), config);
//!
//! if breaker.should_allow_call().await {
//!     // perform the call, then record_success / record_failure
//! }
//! # }
//! ```

pub mod circuit_breaker;
pub mod metrics;
pub mod rate_limiter;

pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use metrics::CircuitBreakerMetrics;
pub use rate_limiter::SlidingWindowRateLimiter;
