//! # Circuit Breaker Implementation
//!
//! Fault isolation for the generation service, following the classic circuit
//! breaker pattern with three states: Closed (normal operation), Open
//! (failing fast), and Half-Open (testing recovery).
//!
//! The breaker exposes an explicit check/record seam rather than wrapping
//! closures: the retry policy asks [`CircuitBreaker::should_allow_call`]
//! before each attempt and reports the outcome afterwards. A rejected attempt
//! is recorded as a failure for the caller but never refreshes the open-state
//! cooldown; the reset clock runs from the moment the circuit opened.

use crate::config::CircuitBreakerConfig;
use crate::resilience::CircuitBreakerMetrics;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Circuit breaker states representing the current operational mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CircuitState {
    /// Normal operation - all calls are allowed through
    Closed = 0,
    /// Failure mode - all calls fail fast without executing
    Open = 1,
    /// Testing recovery - calls allowed until an outcome settles the state
    HalfOpen = 2,
}

impl From<u8> for CircuitState {
    fn from(value: u8) -> Self {
        match value {
            0 => CircuitState::Closed,
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Open, // Default to safest state
        }
    }
}

/// Core circuit breaker with atomic state management.
///
/// Created once per executor instance and shared by every attempt in a batch;
/// state survives across batches when the executor is reused.
#[derive(Debug)]
pub struct CircuitBreaker {
    /// Component name for logging and metrics
    name: String,

    /// Current circuit state (atomic for thread safety)
    state: AtomicU8,

    /// Configuration parameters
    config: CircuitBreakerConfig,

    /// Metrics tracking protected by mutex
    metrics: Mutex<CircuitBreakerMetrics>,

    /// Time when circuit was opened (for cooldown calculations)
    opened_at: Mutex<Option<Instant>>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with the given name and configuration
    pub fn new(name: String, config: CircuitBreakerConfig) -> Self {
        info!(
            component = %name,
            failure_threshold = config.failure_threshold,
            reset_timeout_ms = config.reset_timeout_ms,
            "🛡️ Circuit breaker initialized"
        );

        Self {
            name,
            state: AtomicU8::new(CircuitState::Closed as u8),
            config,
            metrics: Mutex::new(CircuitBreakerMetrics::new()),
            opened_at: Mutex::new(None),
        }
    }

    /// Get current circuit state
    pub fn state(&self) -> CircuitState {
        CircuitState::from(self.state.load(Ordering::Acquire))
    }

    /// Get component name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check whether a call should be allowed right now.
    ///
    /// Querying an open circuit whose cooldown has elapsed transitions it to
    /// half-open and permits the attempt. While half-open, attempts are
    /// allowed until a recorded outcome settles the state: the first failure
    /// reopens the circuit, the first success closes it.
    pub async fn should_allow_call(&self) -> bool {
        match self.state() {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let opened_at = self.opened_at.lock().await;
                if let Some(opened_time) = *opened_at {
                    if opened_time.elapsed() >= self.config.reset_timeout() {
                        drop(opened_at);
                        self.transition_to_half_open().await;
                        true
                    } else {
                        false
                    }
                } else {
                    // Circuit is open but no timestamp - shouldn't happen, but allow call
                    warn!(component = %self.name, "Circuit open but no timestamp recorded");
                    true
                }
            }
        }
    }

    /// Record a successful call
    pub async fn record_success(&self, duration: Duration) {
        let mut metrics = self.metrics.lock().await;
        metrics.total_calls += 1;
        metrics.success_count += 1;
        metrics.consecutive_failures = 0;
        metrics.total_call_duration += duration;
        drop(metrics);

        debug!(
            component = %self.name,
            duration_ms = duration.as_millis() as u64,
            "🟢 Call succeeded"
        );

        if self.state() != CircuitState::Closed {
            self.transition_to_closed().await;
        }
    }

    /// Record a failed call (including a timed-out one)
    pub async fn record_failure(&self, duration: Duration) {
        let mut metrics = self.metrics.lock().await;
        metrics.total_calls += 1;
        metrics.failure_count += 1;
        metrics.consecutive_failures += 1;
        metrics.total_call_duration += duration;
        let consecutive_failures = metrics.consecutive_failures;
        drop(metrics);

        warn!(
            component = %self.name,
            duration_ms = duration.as_millis() as u64,
            consecutive_failures,
            "🔴 Call failed"
        );

        match self.state() {
            CircuitState::Closed => {
                if consecutive_failures >= u64::from(self.config.failure_threshold) {
                    self.transition_to_open().await;
                }
            }
            CircuitState::HalfOpen => {
                // Any failure in half-open state immediately reopens the circuit
                self.transition_to_open().await;
            }
            CircuitState::Open => {
                // Already open, counters only; the cooldown clock is not refreshed
            }
        }
    }

    /// Record an attempt rejected because the circuit is open.
    ///
    /// The rejection is a failure from the caller's perspective, so it counts
    /// toward `failure_count`, but it never touches the open-state timestamp:
    /// recovery probes stay on schedule no matter how many callers are turned
    /// away during the cooldown.
    pub async fn record_rejection(&self) {
        let mut metrics = self.metrics.lock().await;
        metrics.rejected_calls += 1;
        metrics.failure_count += 1;
        drop(metrics);

        debug!(component = %self.name, "⛔ Call rejected while circuit open");
    }

    /// Transition to closed state (normal operation)
    async fn transition_to_closed(&self) {
        self.state
            .store(CircuitState::Closed as u8, Ordering::Release);

        let mut metrics = self.metrics.lock().await;
        metrics.consecutive_failures = 0;
        drop(metrics);

        let mut opened_at = self.opened_at.lock().await;
        *opened_at = None;
        drop(opened_at);

        info!(component = %self.name, "🟢 Circuit breaker closed (recovered)");
    }

    /// Transition to open state (failing fast)
    async fn transition_to_open(&self) {
        self.state.store(CircuitState::Open as u8, Ordering::Release);

        let mut opened_at = self.opened_at.lock().await;
        *opened_at = Some(Instant::now());
        drop(opened_at);

        error!(
            component = %self.name,
            failure_threshold = self.config.failure_threshold,
            reset_timeout_ms = self.config.reset_timeout_ms,
            "🔴 Circuit breaker opened (failing fast)"
        );
    }

    /// Transition to half-open state (testing recovery)
    async fn transition_to_half_open(&self) {
        self.state
            .store(CircuitState::HalfOpen as u8, Ordering::Release);

        info!(component = %self.name, "🟡 Circuit breaker half-open (testing recovery)");
    }

    /// Force circuit to open state (for emergency situations)
    pub async fn force_open(&self) {
        warn!(component = %self.name, "🚨 Circuit breaker forced open");
        self.transition_to_open().await;
    }

    /// Force circuit to closed state (for emergency recovery)
    pub async fn force_closed(&self) {
        warn!(component = %self.name, "🚨 Circuit breaker forced closed");
        self.transition_to_closed().await;
    }

    /// Get current metrics snapshot with derived rates
    pub async fn metrics(&self) -> CircuitBreakerMetrics {
        let metrics = self.metrics.lock().await;
        let mut snapshot = metrics.clone();
        drop(metrics);

        snapshot.current_state = self.state();

        let attempted = snapshot.total_calls + snapshot.rejected_calls;
        if attempted > 0 {
            snapshot.failure_rate = snapshot.failure_count as f64 / attempted as f64;
            snapshot.success_rate = snapshot.success_count as f64 / attempted as f64;
        }
        if snapshot.total_calls > 0 {
            snapshot.average_call_duration =
                snapshot.total_call_duration / snapshot.total_calls as u32;
        }

        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    fn test_config(failure_threshold: u32, reset_timeout_ms: u64) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold,
            reset_timeout_ms,
        }
    }

    #[tokio::test]
    async fn normal_operation_stays_closed() {
        let circuit = CircuitBreaker::new("test".to_string(), test_config(3, 100));

        assert_eq!(circuit.state(), CircuitState::Closed);
        assert!(circuit.should_allow_call().await);

        circuit.record_success(Duration::from_millis(5)).await;

        let metrics = circuit.metrics().await;
        assert_eq!(metrics.total_calls, 1);
        assert_eq!(metrics.success_count, 1);
        assert_eq!(metrics.failure_count, 0);
        assert_eq!(circuit.state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn opens_after_exactly_threshold_consecutive_failures() {
        let circuit = CircuitBreaker::new("test".to_string(), test_config(3, 100));

        circuit.record_failure(Duration::ZERO).await;
        circuit.record_failure(Duration::ZERO).await;
        assert_eq!(circuit.state(), CircuitState::Closed);

        circuit.record_failure(Duration::ZERO).await;
        assert_eq!(circuit.state(), CircuitState::Open);
        assert!(!circuit.should_allow_call().await);
    }

    #[tokio::test]
    async fn success_resets_consecutive_failure_count() {
        let circuit = CircuitBreaker::new("test".to_string(), test_config(2, 100));

        circuit.record_failure(Duration::ZERO).await;
        circuit.record_success(Duration::ZERO).await;
        circuit.record_failure(Duration::ZERO).await;
        assert_eq!(circuit.state(), CircuitState::Closed);

        circuit.record_failure(Duration::ZERO).await;
        assert_eq!(circuit.state(), CircuitState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn cooldown_elapsed_permits_probe_and_success_closes() {
        let circuit = CircuitBreaker::new("test".to_string(), test_config(1, 50));

        circuit.record_failure(Duration::ZERO).await;
        assert_eq!(circuit.state(), CircuitState::Open);
        assert!(!circuit.should_allow_call().await);

        advance(Duration::from_millis(60)).await;

        assert!(circuit.should_allow_call().await);
        assert_eq!(circuit.state(), CircuitState::HalfOpen);

        circuit.record_success(Duration::ZERO).await;
        assert_eq!(circuit.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_failure_reopens() {
        let circuit = CircuitBreaker::new("test".to_string(), test_config(1, 50));

        circuit.record_failure(Duration::ZERO).await;
        advance(Duration::from_millis(60)).await;
        assert!(circuit.should_allow_call().await);
        assert_eq!(circuit.state(), CircuitState::HalfOpen);

        circuit.record_failure(Duration::ZERO).await;
        assert_eq!(circuit.state(), CircuitState::Open);

        // The reopened circuit runs a fresh cooldown
        assert!(!circuit.should_allow_call().await);
        advance(Duration::from_millis(60)).await;
        assert!(circuit.should_allow_call().await);
    }

    #[tokio::test(start_paused = true)]
    async fn rejections_do_not_extend_cooldown() {
        let circuit = CircuitBreaker::new("test".to_string(), test_config(3, 1000));

        for _ in 0..3 {
            circuit.record_failure(Duration::ZERO).await;
        }
        assert_eq!(circuit.state(), CircuitState::Open);

        advance(Duration::from_millis(200)).await;
        assert!(!circuit.should_allow_call().await);
        circuit.record_rejection().await;

        // 1100ms after opening the probe is permitted, regardless of the
        // rejection recorded at the 200ms mark
        advance(Duration::from_millis(900)).await;
        assert!(circuit.should_allow_call().await);
        assert_eq!(circuit.state(), CircuitState::HalfOpen);

        let metrics = circuit.metrics().await;
        assert_eq!(metrics.rejected_calls, 1);
        assert_eq!(metrics.failure_count, 4);
    }

    #[tokio::test]
    async fn force_operations() {
        let circuit = CircuitBreaker::new("test".to_string(), test_config(1, 1000));

        circuit.force_open().await;
        assert_eq!(circuit.state(), CircuitState::Open);
        assert!(!circuit.should_allow_call().await);

        circuit.force_closed().await;
        assert_eq!(circuit.state(), CircuitState::Closed);
        assert!(circuit.should_allow_call().await);
    }

    #[tokio::test]
    async fn metrics_snapshot_derives_rates() {
        let circuit = CircuitBreaker::new("test".to_string(), test_config(10, 1000));

        circuit.record_success(Duration::from_millis(10)).await;
        circuit.record_success(Duration::from_millis(20)).await;
        circuit.record_failure(Duration::from_millis(30)).await;

        let metrics = circuit.metrics().await;
        assert_eq!(metrics.total_calls, 3);
        assert!((metrics.success_rate - 2.0 / 3.0).abs() < f64::EPSILON);
        assert!((metrics.failure_rate - 1.0 / 3.0).abs() < f64::EPSILON);
        assert_eq!(metrics.average_call_duration, Duration::from_millis(20));
    }
}
