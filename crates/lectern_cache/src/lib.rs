//! Service health caching with TTL support.
//!
//! Health results are created lazily on the first check of a service and
//! refreshed only once they are older than the TTL. Entries are never
//! evicted.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod health;

pub use health::{HealthCache, HealthCacheConfig, HealthCacheConfigBuilder, ServiceHealth};
