//! Sliding-window rate limiter.

use crate::{Clock, RateLimitSettings};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument};

/// Bounds outbound calls to `max_requests` per trailing `window`.
///
/// Every admission prunes timestamps that have aged out of the window. If
/// the window is full the caller sleeps until the oldest timestamp ages
/// out, then checks again. The window mutex is never held across a sleep,
/// so concurrent callers each see a consistent window.
///
/// # Example
///
/// ```rust,ignore
/// let limiter = RateLimiter::new(60, Duration::from_secs(60), Arc::new(TokioClock));
/// limiter.admit().await;
/// let response = client.get(url).send().await?;
/// ```
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    timestamps: Mutex<VecDeque<Instant>>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Create a limiter admitting `max_requests` per `window`.
    ///
    /// A zero quota is treated as one.
    pub fn new(max_requests: u32, window: Duration, clock: Arc<dyn Clock>) -> Self {
        let max_requests = max_requests.max(1) as usize;
        Self {
            max_requests,
            window,
            timestamps: Mutex::new(VecDeque::with_capacity(max_requests)),
            clock,
        }
    }

    /// Create a limiter from configuration.
    pub fn from_settings(settings: &RateLimitSettings, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            settings.max_requests,
            Duration::from_millis(settings.window_ms),
            clock,
        )
    }

    /// Quota per window.
    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    /// Window length.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Wait until one more call fits in the window, then record it.
    ///
    /// Returns the total time spent waiting.
    #[instrument(skip(self), fields(max_requests = self.max_requests, window_ms = self.window.as_millis() as u64))]
    pub async fn admit(&self) -> Duration {
        let mut waited = Duration::ZERO;
        loop {
            let wait = {
                let mut timestamps = self.timestamps.lock().await;
                let now = self.clock.now();
                Self::prune(&mut timestamps, now, self.window);

                match timestamps.front() {
                    Some(oldest) if timestamps.len() >= self.max_requests => {
                        self.window.saturating_sub(now.duration_since(*oldest))
                    }
                    _ => {
                        timestamps.push_back(now);
                        return waited;
                    }
                }
            };

            debug!(wait_ms = wait.as_millis() as u64, "Rate window full, delaying call");
            self.clock.sleep(wait).await;
            waited += wait;
        }
    }

    /// Number of calls currently inside the trailing window.
    pub async fn in_window(&self) -> usize {
        let mut timestamps = self.timestamps.lock().await;
        Self::prune(&mut timestamps, self.clock.now(), self.window);
        timestamps.len()
    }

    fn prune(timestamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
        while let Some(oldest) = timestamps.front() {
            if now.duration_since(*oldest) >= window {
                timestamps.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TokioClock;

    #[tokio::test(start_paused = true)]
    async fn admits_up_to_quota_without_waiting() {
        let limiter = RateLimiter::new(3, Duration::from_secs(1), Arc::new(TokioClock));
        for _ in 0..3 {
            assert_eq!(limiter.admit().await, Duration::ZERO);
        }
        assert_eq!(limiter.in_window().await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_quota_is_one() {
        let limiter = RateLimiter::new(0, Duration::from_secs(1), Arc::new(TokioClock));
        assert_eq!(limiter.max_requests(), 1);
        assert_eq!(limiter.admit().await, Duration::ZERO);
        assert_eq!(limiter.admit().await, Duration::from_secs(1));
    }
}
