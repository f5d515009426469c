//! Rate limiting and error recovery for outbound provider calls.
//!
//! - [`RateLimiter`]: sliding-window admission control; calls are delayed,
//!   never dropped
//! - [`RetryPolicy`]: which failures are retried and how long to wait
//! - [`ResilientRequestClient`]: one provider endpoint wrapped with both
//! - [`LecternConfig`]: the configuration surface, loaded once
//!
//! Timing goes through the [`Clock`] trait so tests can run on paused time.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod clock;
mod config;
mod limiter;
mod retry;

pub use client::{RequestOptions, ResilientRequestClient};
pub use clock::{Clock, TokioClock};
pub use config::{
    ContentProviderSettings, FallbackSettings, HealthSettings, LecternConfig, ModelSettings,
    PipelineSettings, ProviderSettings, RateLimitSettings, RetrySettings,
};
pub use limiter::RateLimiter;
pub use retry::{Backoff, RetryPolicy};
