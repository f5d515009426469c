//! TTL behaviour of the health cache.

use async_trait::async_trait;
use lectern_cache::{HealthCache, HealthCacheConfig};
use lectern_error::ProviderError;
use lectern_interface::HealthProbe;
use lectern_rate_limit::TokioClock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

/// Probe whose answer can be flipped between checks.
struct SwitchProbe {
    name: &'static str,
    healthy: AtomicBool,
    calls: AtomicU32,
    latency: Duration,
}

impl SwitchProbe {
    fn new(name: &'static str, healthy: bool) -> Arc<Self> {
        Arc::new(Self {
            name,
            healthy: AtomicBool::new(healthy),
            calls: AtomicU32::new(0),
            latency: Duration::ZERO,
        })
    }

    fn slow(name: &'static str, latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            name,
            healthy: AtomicBool::new(true),
            calls: AtomicU32::new(0),
            latency,
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HealthProbe for SwitchProbe {
    fn name(&self) -> &str {
        self.name
    }

    async fn probe(&self) -> Result<(), ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ProviderError::classify(Some(503), "maintenance"))
        }
    }
}

fn cache(ttl_secs: u64) -> HealthCache {
    HealthCache::new(
        HealthCacheConfig::default().with_ttl_secs(ttl_secs),
        Arc::new(TokioClock),
    )
}

#[tokio::test(start_paused = true)]
async fn test_checks_within_ttl_are_cached() {
    let probe = SwitchProbe::new("openai", true);
    let cache = cache(300).with_probe(probe.clone());

    let first = cache.check_health("openai").await;
    tokio::time::advance(Duration::from_secs(299)).await;
    probe.healthy.store(false, Ordering::SeqCst);
    let second = cache.check_health("openai").await;

    assert_eq!(first.last_checked_at(), second.last_checked_at());
    assert!(*second.healthy());
    assert_eq!(probe.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_expired_entry_is_refreshed() {
    let probe = SwitchProbe::new("openai", true);
    let cache = cache(300).with_probe(probe.clone());

    let first = cache.check_health("openai").await;
    probe.healthy.store(false, Ordering::SeqCst);
    tokio::time::advance(Duration::from_secs(300)).await;
    let second = cache.check_health("openai").await;

    assert!(second.last_checked_at() > first.last_checked_at());
    assert!(!*second.healthy());
    assert_eq!(second.message().as_deref().map(|m| m.contains("maintenance")), Some(true));
    assert_eq!(probe.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_entries_created_lazily() {
    let probe = SwitchProbe::new("gemini", true);
    let cache = cache(60).with_probe(probe.clone());

    assert!(cache.cached("gemini").await.is_none());
    assert_eq!(probe.calls(), 0);

    cache.check_health("gemini").await;
    assert!(cache.cached("gemini").await.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_unregistered_service_is_unhealthy_and_not_cached() {
    let cache = cache(60);
    let health = cache.check_health("nobody").await;

    assert!(!*health.healthy());
    assert!(cache.cached("nobody").await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_check_all_services() {
    let up = SwitchProbe::new("anthropic", true);
    let down = SwitchProbe::new("openai", false);
    let cache = cache(60).with_probe(down.clone()).with_probe(up.clone());

    let all = cache.check_all_services_health().await;
    let summary: Vec<_> = all.iter().map(|h| (h.name().as_str(), *h.healthy())).collect();
    assert_eq!(summary, vec![("anthropic", true), ("openai", false)]);

    cache.check_all_services_health().await;
    assert_eq!(up.calls(), 1);
    assert_eq!(down.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_cold_checks_share_one_probe() {
    let probe = SwitchProbe::slow("openai", Duration::from_millis(250));
    let cache = cache(60).with_probe(probe.clone());

    let (a, b) = tokio::join!(cache.check_health("openai"), cache.check_health("openai"));
    let later = cache.check_health("openai").await;

    assert_eq!(probe.calls(), 1);
    assert_eq!(a.last_checked_at(), b.last_checked_at());
    assert_eq!(later.last_checked_at(), a.last_checked_at());
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_stale_checks_refresh_once() {
    let probe = SwitchProbe::slow("openai", Duration::from_millis(250));
    let cache = cache(60).with_probe(probe.clone());
    let first = cache.check_health("openai").await;

    tokio::time::advance(Duration::from_secs(61)).await;
    probe.healthy.store(false, Ordering::SeqCst);
    let (a, b) = tokio::join!(cache.check_health("openai"), cache.check_health("openai"));

    assert_eq!(probe.calls(), 2);
    assert!(a.last_checked_at() > first.last_checked_at());
    assert_eq!(a, b);
    assert!(!*b.healthy());
}
