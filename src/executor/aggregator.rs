//! Result Aggregator
//!
//! Collects one outcome per work item and computes the batch statistics once
//! every item has settled.

use crate::executor::types::{BatchResult, BatchStatistics, ExecutionOutcome, FailedItem};
use chrono::{DateTime, Utc};
use std::time::Duration;
use uuid::Uuid;

pub(crate) struct ResultAggregator<R, I, E> {
    success: Vec<R>,
    failed: Vec<FailedItem<I, E>>,
}

impl<R, I, E> ResultAggregator<R, I, E> {
    pub(crate) fn new() -> Self {
        Self {
            success: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// Record one settled outcome. Outcomes arrive in input order within each
    /// chunk, so `success` and `failed` stay input-ordered across the batch.
    pub(crate) fn record(&mut self, outcome: ExecutionOutcome<R, I, E>) {
        match outcome {
            ExecutionOutcome::Success(result) => self.success.push(result),
            ExecutionOutcome::Failure {
                index,
                error,
                input,
            } => self.failed.push(FailedItem {
                index,
                error,
                input,
            }),
        }
    }

    pub(crate) fn success_count(&self) -> usize {
        self.success.len()
    }

    pub(crate) fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// Close out the batch: derive the statistics and hand back the partition
    pub(crate) fn finalize(
        self,
        batch_id: Uuid,
        total: usize,
        started_at: DateTime<Utc>,
        wall_clock: Duration,
    ) -> BatchResult<R, I, E> {
        debug_assert_eq!(self.success.len() + self.failed.len(), total);

        let success_rate = if total > 0 {
            self.success.len() as f64 / total as f64
        } else {
            0.0
        };
        let average_processing_time = if total > 0 {
            wall_clock / total as u32
        } else {
            Duration::ZERO
        };

        BatchResult {
            success: self.success,
            failed: self.failed,
            statistics: BatchStatistics {
                batch_id,
                total_processed: total,
                success_rate,
                total_processing_time: wall_clock,
                average_processing_time,
                started_at,
                completed_at: Utc::now(),
            },
        }
    }
}
