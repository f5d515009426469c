//! Retry policy value object.

use crate::RetrySettings;
use lectern_error::{ProviderError, RetryableError};
use std::time::Duration;

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `base * factor^attempt`
    Exponential {
        /// Delay before the first retry
        base: Duration,
        /// Growth per retry
        factor: u32,
    },
    /// Same delay before every retry
    Fixed(Duration),
}

impl Backoff {
    /// Doubling backoff starting at `base`.
    pub fn exponential(base: Duration) -> Self {
        Backoff::Exponential { base, factor: 2 }
    }

    /// Delay before retry number `attempt` (0 is the first retry).
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Backoff::Exponential { base, factor } => {
                base.saturating_mul(factor.saturating_pow(attempt))
            }
            Backoff::Fixed(delay) => *delay,
        }
    }
}

fn transient_only(error: &ProviderError) -> bool {
    error.is_retryable()
}

/// Which failures are retried, how often, and how long to wait.
///
/// # Examples
///
/// ```
/// use lectern_rate_limit::{Backoff, RetryPolicy};
/// use lectern_error::ProviderError;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new(3, Backoff::exponential(Duration::from_millis(100)));
/// assert_eq!(policy.delay_for(2), Duration::from_millis(400));
///
/// let transient = ProviderError::classify(Some(503), "down");
/// assert!(policy.should_retry(&transient, 2));
/// assert!(!policy.should_retry(&transient, 3));
/// ```
#[derive(Debug, Clone, derive_getters::Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt
    max_retries: u32,
    /// Delay schedule
    backoff: Backoff,
    /// Upper bound on any single delay
    max_delay: Duration,
    /// Which errors may be retried
    retryable: fn(&ProviderError) -> bool,
}

impl RetryPolicy {
    /// Policy retrying transient failures only, with no delay cap.
    pub fn new(max_retries: u32, backoff: Backoff) -> Self {
        Self {
            max_retries,
            backoff,
            max_delay: Duration::MAX,
            retryable: transient_only,
        }
    }

    /// Policy that never retries.
    pub fn none() -> Self {
        Self::new(0, Backoff::Fixed(Duration::ZERO))
    }

    /// Build from configuration.
    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self::new(
            settings.max_retries,
            Backoff::exponential(Duration::from_millis(settings.base_delay_ms)),
        )
        .with_max_delay(Duration::from_millis(settings.max_delay_ms))
    }

    /// Whether a failure on retry index `attempt` should be retried.
    ///
    /// `attempt` counts retries already performed.
    pub fn should_retry(&self, error: &ProviderError, attempt: u32) -> bool {
        (self.retryable)(error) && attempt < self.max_retries
    }

    /// Delay before retry number `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&RetrySettings::default())
    }
}
