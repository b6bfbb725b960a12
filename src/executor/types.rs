//! Core types for batch execution: per-item outcomes, the batch result
//! partition, and summary statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Optional progress callback invoked as `(completed, total)` after each
/// item's outcome is finalized. Completion counts are monotone.
pub type ProgressCallback = Box<dyn Fn(usize, usize) + Send + Sync>;

/// Why one item's final attempt failed.
///
/// `Task` and `TimedOut` are transient and were retried up to the attempt
/// budget before landing here; `CircuitOpen` means the last attempt was
/// rejected without reaching the task function.
#[derive(Debug, thiserror::Error)]
pub enum AttemptError<E> {
    /// The task function returned an error
    #[error("task failed: {0}")]
    Task(E),

    /// The attempt exceeded the per-attempt timeout and was cancelled
    #[error("attempt timed out after {timeout_ms} ms")]
    TimedOut { timeout_ms: u64 },

    /// The circuit breaker rejected the attempt without invoking the task
    #[error("circuit breaker is open for {component}")]
    CircuitOpen { component: String },
}

impl<E> AttemptError<E> {
    /// True when the error is a per-attempt timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, AttemptError::TimedOut { .. })
    }

    /// True when the attempt never reached the task function
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, AttemptError::CircuitOpen { .. })
    }
}

/// The single outcome every work item produces by the time a batch completes
#[derive(Debug)]
pub enum ExecutionOutcome<R, I, E> {
    /// The task function succeeded within the attempt budget
    Success(R),
    /// All attempts were consumed; the original input rides along for
    /// caller-side requeueing or reporting
    Failure {
        index: usize,
        error: AttemptError<E>,
        input: I,
    },
}

/// A failed item in the batch result, keyed by its original input index
#[derive(Debug)]
pub struct FailedItem<I, E> {
    pub index: usize,
    pub error: AttemptError<E>,
    pub input: I,
}

/// Complete partition of a batch into successes and failures, plus summary
/// statistics. `success.len() + failed.len()` always equals the input count.
#[derive(Debug)]
pub struct BatchResult<R, I, E> {
    /// Task results in input order
    pub success: Vec<R>,
    /// Exhausted items in input order
    pub failed: Vec<FailedItem<I, E>>,
    /// Summary computed once at batch end
    pub statistics: BatchStatistics,
}

/// Summary statistics for one completed batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchStatistics {
    /// Identity for correlating logs and persisted results
    pub batch_id: Uuid,
    /// Number of work items in the batch
    pub total_processed: usize,
    /// Successful items divided by total (0.0 for an empty batch)
    pub success_rate: f64,
    /// Wall-clock duration of the whole batch
    pub total_processing_time: Duration,
    /// Wall-clock duration divided by item count
    pub average_processing_time: Duration,
    /// When the batch started
    pub started_at: DateTime<Utc>,
    /// When the batch completed
    pub completed_at: DateTime<Utc>,
}
