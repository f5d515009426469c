//! Time source abstraction.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

/// Source of "now" and of delays.
///
/// Production code uses [`TokioClock`]; under `tokio::time::pause` it
/// auto-advances, which is what the timing tests rely on.
#[async_trait]
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current instant.
    fn now(&self) -> Instant;

    /// Suspend the caller for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Clock backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
