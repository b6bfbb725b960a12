//! Circuit breaker metrics collection and snapshots.

use crate::resilience::CircuitState;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Running counters for a circuit breaker, plus derived rates filled in when
/// a snapshot is taken via [`crate::resilience::CircuitBreaker::metrics`].
///
/// `rejected_calls` counts fast-fail rejections separately from
/// `failure_count` so operators can tell an open breaker from a failing
/// downstream service; rejections are also included in `failure_count`, since
/// every rejected attempt is reported to the caller as a failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerMetrics {
    /// Attempts that reached the task function
    pub total_calls: u64,
    /// Attempts that completed successfully
    pub success_count: u64,
    /// Failed attempts, including timeouts and fast-fail rejections
    pub failure_count: u64,
    /// Attempts rejected without reaching the task function
    pub rejected_calls: u64,
    /// Failures since the last success while closed
    pub consecutive_failures: u64,
    /// Cumulative duration of completed calls
    pub total_call_duration: Duration,

    /// State at snapshot time
    pub current_state: CircuitState,
    /// failure_count / (total_calls + rejected_calls), derived at snapshot time
    pub failure_rate: f64,
    /// success_count / (total_calls + rejected_calls), derived at snapshot time
    pub success_rate: f64,
    /// total_call_duration / total_calls, derived at snapshot time
    pub average_call_duration: Duration,
}

impl CircuitBreakerMetrics {
    pub fn new() -> Self {
        Self {
            total_calls: 0,
            success_count: 0,
            failure_count: 0,
            rejected_calls: 0,
            consecutive_failures: 0,
            total_call_duration: Duration::ZERO,
            current_state: CircuitState::Closed,
            failure_rate: 0.0,
            success_rate: 0.0,
            average_call_duration: Duration::ZERO,
        }
    }
}

impl Default for CircuitBreakerMetrics {
    fn default() -> Self {
        Self::new()
    }
}
