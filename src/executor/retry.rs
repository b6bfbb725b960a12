//! Retry Policy
//!
//! Drives one work item through the task function with a bounded attempt
//! budget, a per-attempt timeout, and exponential backoff between attempts.
//! Every attempt consults the circuit breaker first and reports its outcome
//! back into it; a rejection by an open breaker consumes an attempt like any
//! other failure.

use crate::config::ExecutorConfig;
use crate::executor::types::{AttemptError, ExecutionOutcome};
use crate::resilience::CircuitBreaker;
use std::future::Future;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, warn};

/// Execute one item with up to `1 + retry_attempts` attempts.
///
/// A timed-out attempt is cancelled: the task future is dropped when the
/// timer fires, so the external call cannot land side effects afterwards.
pub(crate) async fn execute_with_retry<I, R, E, F, Fut>(
    task: &F,
    item: &I,
    index: usize,
    config: &ExecutorConfig,
    breaker: &CircuitBreaker,
) -> ExecutionOutcome<R, I, E>
where
    I: Clone,
    F: Fn(I, usize) -> Fut,
    Fut: Future<Output = Result<R, E>>,
    E: std::error::Error,
{
    let max_attempts = config.max_attempts();
    let mut attempt = 0u32;

    loop {
        let error = if breaker.should_allow_call().await {
            let started = Instant::now();
            match timeout(config.timeout(), task(item.clone(), index)).await {
                Ok(Ok(result)) => {
                    breaker.record_success(started.elapsed()).await;
                    debug!(item = index, attempt, "Item completed");
                    return ExecutionOutcome::Success(result);
                }
                Ok(Err(task_error)) => {
                    breaker.record_failure(started.elapsed()).await;
                    AttemptError::Task(task_error)
                }
                Err(_elapsed) => {
                    breaker.record_failure(started.elapsed()).await;
                    AttemptError::TimedOut {
                        timeout_ms: config.timeout_ms,
                    }
                }
            }
        } else {
            breaker.record_rejection().await;
            AttemptError::CircuitOpen {
                component: breaker.name().to_string(),
            }
        };

        attempt += 1;
        if attempt >= max_attempts {
            warn!(
                item = index,
                attempts = attempt,
                error = %error,
                "❌ Item failed, attempts exhausted"
            );
            return ExecutionOutcome::Failure {
                index,
                error,
                input: item.clone(),
            };
        }

        // backoff_delay * 2^n for the n-th (zero-indexed) failed attempt
        let factor = 1u32.checked_shl(attempt - 1).unwrap_or(u32::MAX);
        let delay = config.backoff_delay().saturating_mul(factor);
        warn!(
            item = index,
            attempt,
            backoff_ms = delay.as_millis() as u64,
            error = %error,
            "Attempt failed, backing off before retry"
        );
        sleep(delay).await;
    }
}
