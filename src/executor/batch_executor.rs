//! Chunked Parallel Dispatcher
//!
//! The batch entry point. Work items are split into chunks of at most
//! `concurrency` items; a chunk's attempts run concurrently and the chunk is
//! a hard barrier, so at most `concurrency` task invocations are in flight at
//! any instant and no call from chunk *i+1* starts before chunk *i* settles.
//!
//! The rate limiter is consulted once between chunks (not after the last).
//! Throttling at chunk granularity is intentional coarse admission control: a
//! single chunk can momentarily exceed the steady-state rate when
//! `concurrency` is larger than `rate_limit_per_second`.

use crate::config::ExecutorConfig;
use crate::error::Result;
use crate::executor::aggregator::ResultAggregator;
use crate::executor::retry::execute_with_retry;
use crate::executor::types::{BatchResult, ProgressCallback};
use crate::resilience::{CircuitBreaker, SlidingWindowRateLimiter};
use chrono::Utc;
use futures::future::join_all;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

/// Generic batch executor for independent asynchronous jobs against a slow,
/// rate-limited, occasionally-failing service.
///
/// The executor owns one rate limiter and one circuit breaker; both are
/// shared by every attempt within a batch and across batches when the
/// executor is reused, so sustained downstream outages fail fast regardless
/// of how the caller slices its work.
///
/// Per-attempt timeouts cancel the in-flight call: the task future is dropped
/// when the timer fires, so a timed-out attempt cannot land side effects
/// later.
#[derive(Debug)]
pub struct BatchExecutor {
    config: ExecutorConfig,
    rate_limiter: SlidingWindowRateLimiter,
    circuit_breaker: CircuitBreaker,
}

impl BatchExecutor {
    /// Create an executor, rejecting invalid configuration
    pub fn new(config: ExecutorConfig) -> Result<Self> {
        config.validate()?;

        info!(
            concurrency = config.concurrency,
            retry_attempts = config.retry_attempts,
            rate_limit_per_second = config.rate_limit_per_second,
            timeout_ms = config.timeout_ms,
            "⚙️ Batch executor initialized"
        );

        Ok(Self {
            rate_limiter: SlidingWindowRateLimiter::new(config.rate_limit_per_second),
            circuit_breaker: CircuitBreaker::new(
                "generation_service".to_string(),
                config.circuit_breaker.clone(),
            ),
            config,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// The shared circuit breaker, for metrics snapshots and manual overrides
    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.circuit_breaker
    }

    /// The shared rate limiter
    pub fn rate_limiter(&self) -> &SlidingWindowRateLimiter {
        &self.rate_limiter
    }

    /// Run every item through the task function and partition the outcomes.
    ///
    /// The task function is a black box performing one call to the external
    /// service; its `Ok` value is forwarded untouched. Exactly one outcome is
    /// produced per item: no single item's failure aborts the batch.
    pub async fn execute_batch<I, R, E, F, Fut>(
        &self,
        items: Vec<I>,
        task: F,
    ) -> BatchResult<R, I, E>
    where
        I: Clone,
        F: Fn(I, usize) -> Fut,
        Fut: Future<Output = std::result::Result<R, E>>,
        E: std::error::Error,
    {
        self.run(items, task, None).await
    }

    /// Like [`execute_batch`](Self::execute_batch), invoking `on_progress`
    /// with `(completed, total)` after each item's outcome is finalized
    pub async fn execute_batch_with_progress<I, R, E, F, Fut>(
        &self,
        items: Vec<I>,
        task: F,
        on_progress: ProgressCallback,
    ) -> BatchResult<R, I, E>
    where
        I: Clone,
        F: Fn(I, usize) -> Fut,
        Fut: Future<Output = std::result::Result<R, E>>,
        E: std::error::Error,
    {
        self.run(items, task, Some(on_progress)).await
    }

    async fn run<I, R, E, F, Fut>(
        &self,
        items: Vec<I>,
        task: F,
        on_progress: Option<ProgressCallback>,
    ) -> BatchResult<R, I, E>
    where
        I: Clone,
        F: Fn(I, usize) -> Fut,
        Fut: Future<Output = std::result::Result<R, E>>,
        E: std::error::Error,
    {
        let batch_id = Uuid::new_v4();
        let total = items.len();
        let concurrency = self.config.concurrency;
        let started_at = Utc::now();
        let started = Instant::now();

        info!(
            batch_id = %batch_id,
            total,
            concurrency,
            chunks = total.div_ceil(concurrency),
            "🚀 Batch started"
        );

        let completed = AtomicUsize::new(0);
        let completed = &completed;
        let progress = on_progress.as_deref();
        let task = &task;
        let config = &self.config;
        let breaker = &self.circuit_breaker;

        let mut aggregator = ResultAggregator::new();

        for (chunk_index, chunk) in items.chunks(concurrency).enumerate() {
            if chunk_index > 0 {
                self.rate_limiter.acquire().await;
            }

            debug!(
                batch_id = %batch_id,
                chunk_index,
                chunk_size = chunk.len(),
                "📦 Dispatching chunk"
            );

            let attempts = chunk.iter().enumerate().map(|(offset, item)| {
                let index = chunk_index * concurrency + offset;
                async move {
                    let outcome = execute_with_retry(task, item, index, config, breaker).await;
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(callback) = progress {
                        callback(done, total);
                    }
                    outcome
                }
            });

            // Hard barrier: the whole chunk settles before the next starts,
            // and outcomes come back in the chunk's input order
            for outcome in join_all(attempts).await {
                aggregator.record(outcome);
            }
        }

        let wall_clock = started.elapsed();
        let success_count = aggregator.success_count();
        let failed_count = aggregator.failed_count();
        let result = aggregator.finalize(batch_id, total, started_at, wall_clock);

        info!(
            batch_id = %batch_id,
            success = success_count,
            failed = failed_count,
            success_rate = result.statistics.success_rate,
            duration_ms = wall_clock.as_millis() as u64,
            "✅ Batch completed"
        );

        result
    }
}
