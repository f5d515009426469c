//! Health cache implementation.

use derive_getters::Getters;
use futures::future::join_all;
use lectern_interface::HealthProbe;
use lectern_rate_limit::{Clock, HealthSettings};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

/// Last known health of one service.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct ServiceHealth {
    name: String,
    healthy: bool,
    last_checked_at: Instant,
    message: Option<String>,
}

impl ServiceHealth {
    /// Age of this result at `now`.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_checked_at)
    }

    /// Whether this result is still within `ttl` at `now`.
    pub fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        self.age(now) < ttl
    }
}

/// Configuration for the health cache.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
pub struct HealthCacheConfig {
    /// Seconds a health result stays fresh
    #[serde(default = "default_ttl")]
    #[builder(default = "default_ttl()")]
    ttl_secs: u64,
}

fn default_ttl() -> u64 {
    300 // 5 minutes
}

impl Default for HealthCacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl(),
        }
    }
}

impl From<&HealthSettings> for HealthCacheConfig {
    fn from(settings: &HealthSettings) -> Self {
        Self {
            ttl_secs: settings.ttl_secs,
        }
    }
}

impl HealthCacheConfig {
    /// TTL as a duration.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// TTL cache of service health, keyed by probe name.
///
/// # Example
///
/// ```rust,ignore
/// let cache = HealthCache::new(HealthCacheConfig::default(), Arc::new(TokioClock))
///     .with_probe(probe);
/// let health = cache.check_health("openai").await;
/// println!("{} healthy: {}", health.name(), health.healthy());
/// ```
pub struct HealthCache {
    config: HealthCacheConfig,
    clock: Arc<dyn Clock>,
    probes: HashMap<String, RegisteredProbe>,
    entries: Mutex<HashMap<String, ServiceHealth>>,
}

/// A probe plus the guard that lets one refresh of its entry run at a time.
struct RegisteredProbe {
    probe: Arc<dyn HealthProbe>,
    refresh: Mutex<()>,
}

impl std::fmt::Debug for HealthCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthCache")
            .field("config", &self.config)
            .field("services", &self.services())
            .finish()
    }
}

impl HealthCache {
    /// Empty cache with no registered services.
    pub fn new(config: HealthCacheConfig, clock: Arc<dyn Clock>) -> Self {
        debug!(ttl_secs = config.ttl_secs, "Creating new HealthCache");
        Self {
            config,
            clock,
            probes: HashMap::new(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Register a service, replacing any probe with the same name.
    pub fn with_probe(mut self, probe: Arc<dyn HealthProbe>) -> Self {
        self.register(probe);
        self
    }

    /// Register a service, replacing any probe with the same name.
    pub fn register(&mut self, probe: Arc<dyn HealthProbe>) {
        self.probes.insert(
            probe.name().to_string(),
            RegisteredProbe {
                probe,
                refresh: Mutex::new(()),
            },
        );
    }

    /// Registered service names, sorted.
    pub fn services(&self) -> Vec<String> {
        let mut names: Vec<_> = self.probes.keys().cloned().collect();
        names.sort();
        names
    }

    /// Cache configuration.
    pub fn config(&self) -> &HealthCacheConfig {
        &self.config
    }

    /// Cached result without probing, fresh or not.
    pub async fn cached(&self, name: &str) -> Option<ServiceHealth> {
        self.entries.lock().await.get(name).cloned()
    }

    /// Health of `name`, probing only when the cached result is missing or
    /// older than the TTL.
    ///
    /// Concurrent callers of a stale service share one probe: the first
    /// refreshes the entry while the others wait and read its result.
    ///
    /// Unregistered services are reported unhealthy and never cached.
    #[instrument(skip(self))]
    pub async fn check_health(&self, name: &str) -> ServiceHealth {
        if let Some(entry) = self.fresh_entry(name).await {
            return entry;
        }

        let Some(registered) = self.probes.get(name) else {
            warn!("Health check for unregistered service");
            return ServiceHealth {
                name: name.to_string(),
                healthy: false,
                last_checked_at: self.clock.now(),
                message: Some("service not registered".to_string()),
            };
        };

        let _refresh = registered.refresh.lock().await;
        if let Some(entry) = self.fresh_entry(name).await {
            return entry;
        }

        let result = registered.probe.probe().await;
        let health = ServiceHealth {
            name: name.to_string(),
            healthy: result.is_ok(),
            last_checked_at: self.clock.now(),
            message: result.err().map(|e| e.kind.to_string()),
        };

        debug!(healthy = health.healthy, "Health cache refreshed");
        self.entries
            .lock()
            .await
            .insert(name.to_string(), health.clone());
        health
    }

    async fn fresh_entry(&self, name: &str) -> Option<ServiceHealth> {
        let entries = self.entries.lock().await;
        let now = self.clock.now();
        let entry = entries
            .get(name)
            .filter(|e| e.is_fresh(now, self.config.ttl()))?;
        debug!(age_ms = entry.age(now).as_millis() as u64, "Health cache hit");
        Some(entry.clone())
    }

    /// [`HealthCache::check_health`] for every registered service, sorted by name.
    pub async fn check_all_services_health(&self) -> Vec<ServiceHealth> {
        let names = self.services();
        join_all(names.iter().map(|name| self.check_health(name))).await
    }
}
