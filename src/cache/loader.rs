//! Fill path for cache misses.

use crate::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Source of truth consulted by [`ExpiringCache::get_or_load`](super::ExpiringCache::get_or_load)
/// when a key is missing or stale.
///
/// Implementations typically wrap a database query for one facet of an
/// entity. Returning `Ok(None)` means the record does not exist; nothing is
/// cached in that case.
#[async_trait]
pub trait ValueLoader<V>: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<V>>;

    /// TTL for values produced by this loader. `None` uses the cache default.
    fn ttl(&self) -> Option<Duration> {
        None
    }

    fn name(&self) -> &'static str {
        "loader"
    }
}
