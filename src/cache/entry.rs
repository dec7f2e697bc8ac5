//! Cache entry with per-entry expiry.

use std::time::Duration;
use tokio::time::Instant;

/// A stored value together with the instant it was written and its TTL.
///
/// Timestamps come from `tokio::time::Instant`, so a paused test runtime
/// controls expiry deterministically. Outside a runtime it behaves like
/// `std::time::Instant`.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    pub fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
            ttl,
        }
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn into_value(self) -> V {
        self.value
    }

    pub fn stored_at(&self) -> Instant {
        self.stored_at
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn age(&self) -> Duration {
        self.age_at(Instant::now())
    }

    fn age_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.stored_at)
    }

    /// An entry is stale once its age reaches the TTL.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    pub(crate) fn is_expired_at(&self, now: Instant) -> bool {
        self.age_at(now) >= self.ttl
    }

    /// Time left before the entry turns stale, `None` if it already has.
    pub fn remaining(&self) -> Option<Duration> {
        self.ttl
            .checked_sub(self.age())
            .filter(|left| !left.is_zero())
    }
}
