//! # Sliding-Window Rate Limiter
//!
//! Bounds admissions to at most `max_admissions` per trailing window. The
//! state is an ordered list of admission timestamps; acquiring prunes entries
//! older than the window, and suspends the caller just long enough for the
//! oldest remaining admission to age out when the window is full.
//!
//! The prune-check-append sequence runs under a mutex, so the window invariant
//! holds under concurrent callers on a multi-threaded runtime. The lock is
//! never held across a suspension point: a caller that must wait releases the
//! lock, sleeps, and re-checks.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Shared admission gate with a rolling one-second window by default.
#[derive(Debug)]
pub struct SlidingWindowRateLimiter {
    /// Maximum admissions inside one window
    max_admissions: u32,

    /// Window length; one second unless overridden for tests
    window: Duration,

    /// Ordered admission timestamps, oldest first
    admissions: Mutex<VecDeque<Instant>>,
}

impl SlidingWindowRateLimiter {
    /// Create a limiter admitting `max_per_second` calls per trailing second
    pub fn new(max_per_second: u32) -> Self {
        Self::with_window(max_per_second, Duration::from_millis(1000))
    }

    /// Create a limiter with an explicit window length
    pub fn with_window(max_admissions: u32, window: Duration) -> Self {
        Self {
            max_admissions,
            window,
            admissions: Mutex::new(VecDeque::new()),
        }
    }

    /// Suspend until admitting now keeps the trailing-window admission count
    /// at or below the limit, then record the admission.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut admissions = self.admissions.lock();
                let now = Instant::now();

                while let Some(&oldest) = admissions.front() {
                    if now.duration_since(oldest) >= self.window {
                        admissions.pop_front();
                    } else {
                        break;
                    }
                }

                if (admissions.len() as u32) < self.max_admissions {
                    admissions.push_back(now);
                    return;
                }

                // Window is full; wait for the oldest admission to age out
                let Some(&oldest) = admissions.front() else {
                    admissions.push_back(now);
                    return;
                };
                self.window.saturating_sub(now.duration_since(oldest))
            };

            debug!(wait_ms = wait.as_millis() as u64, "⏳ Rate limit reached, waiting");
            sleep(wait).await;
        }
    }

    /// Admissions currently inside the trailing window
    pub fn admitted_in_window(&self) -> usize {
        let mut admissions = self.admissions.lock();
        let now = Instant::now();
        while let Some(&oldest) = admissions.front() {
            if now.duration_since(oldest) >= self.window {
                admissions.pop_front();
            } else {
                break;
            }
        }
        admissions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    #[tokio::test(start_paused = true)]
    async fn admits_up_to_limit_without_waiting() {
        let limiter = SlidingWindowRateLimiter::new(3);

        let started = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(limiter.admitted_in_window(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_oldest_admission_to_age_out() {
        let limiter = SlidingWindowRateLimiter::new(2);

        limiter.acquire().await;
        limiter.acquire().await;

        let started = Instant::now();
        limiter.acquire().await;
        // Third admission had to wait the full window behind the first
        assert_eq!(started.elapsed(), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn window_slides_rather_than_resets() {
        let limiter = SlidingWindowRateLimiter::new(2);

        limiter.acquire().await;
        advance(Duration::from_millis(600)).await;
        limiter.acquire().await;

        // First admission ages out at t=1000, so the third admits after
        // waiting 400ms, not a full second
        let started = Instant::now();
        limiter.acquire().await;
        assert_eq!(started.elapsed(), Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn never_more_than_limit_in_any_trailing_window() {
        let limit = 2u32;
        let window = Duration::from_millis(1000);
        let limiter = SlidingWindowRateLimiter::new(limit);

        let mut admitted_at = Vec::new();
        for _ in 0..7 {
            limiter.acquire().await;
            admitted_at.push(Instant::now());
        }

        // Any admission and the one `limit` positions later must be at least
        // one window apart, otherwise some trailing window held limit + 1
        for pair in admitted_at.windows(limit as usize + 1) {
            let span = pair[limit as usize].duration_since(pair[0]);
            assert!(
                span >= window,
                "admissions {:?} apart violate the window invariant",
                span
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn full_window_leaves_acquire_pending_until_it_slides() {
        let limiter = SlidingWindowRateLimiter::new(1);
        limiter.acquire().await;

        let mut acquire = tokio_test::task::spawn(limiter.acquire());
        assert!(acquire.poll().is_pending());

        advance(Duration::from_millis(1000)).await;
        assert!(acquire.poll().is_ready());
        assert_eq!(limiter.admitted_in_window(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_acquires_preserve_the_invariant() {
        use std::sync::Arc;

        let limiter = Arc::new(SlidingWindowRateLimiter::new(3));
        let mut handles = Vec::new();
        for _ in 0..9 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                limiter.acquire().await;
                Instant::now()
            }));
        }

        let mut admitted_at = Vec::new();
        for handle in handles {
            admitted_at.push(handle.await.expect("acquire task panicked"));
        }
        admitted_at.sort();

        for pair in admitted_at.windows(4) {
            assert!(pair[3].duration_since(pair[0]) >= Duration::from_millis(1000));
        }
    }
}
