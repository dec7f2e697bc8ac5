//! Background expiry sweep.

use super::store::ExpiringCache;
use crate::{Error, ErrorContext, Result};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Periodically calls [`ExpiringCache::sweep`] on a tokio task.
///
/// Holds only a weak reference: once the last `Arc` to the cache is dropped
/// the task exits on its next tick. Dropping the sweeper stops it.
pub struct Sweeper<V> {
    cache: Weak<ExpiringCache<V>>,
    interval: Duration,
    handle: Option<JoinHandle<()>>,
}

impl<V: Send + Sync + 'static> Sweeper<V> {
    /// Create a stopped sweeper using the cache's configured interval.
    pub fn new(cache: &Arc<ExpiringCache<V>>) -> Self {
        Self {
            cache: Arc::downgrade(cache),
            interval: cache.config().sweep_interval,
            handle: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start sweeping. No-op if already running.
    ///
    /// Fails when the interval is zero or no tokio runtime is available.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }
        if self.interval.is_zero() {
            return Err(Error::validation_with_context(
                "sweep interval must be greater than zero",
                ErrorContext::new()
                    .with_field_path("cache.sweep_interval_ms")
                    .with_source("sweeper"),
            ));
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            Error::runtime_with_context(
                "sweeper requires a tokio runtime",
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("sweeper"),
            )
        })?;

        let cache = self.cache.clone();
        let interval = self.interval;
        let handle = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else {
                    debug!("cache dropped, sweeper exiting");
                    break;
                };
                cache.sweep();
            }
        });

        self.handle = Some(handle);
        info!(interval_ms = self.interval.as_millis() as u64, "cache sweeper started");
        Ok(())
    }

    /// Stop sweeping. No-op if not running.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            info!("cache sweeper stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl<V> Drop for Sweeper<V> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;

    fn cache(ttl_ms: u64, sweep_ms: u64) -> Arc<ExpiringCache<u32>> {
        Arc::new(ExpiringCache::new(
            CacheConfig::new()
                .with_ttl(Duration::from_millis(ttl_ms))
                .with_sweep_interval(Duration::from_millis(sweep_ms)),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn purges_unread_entries() {
        let cache = cache(100, 50);
        let _sweeper = cache.spawn_sweeper().unwrap();
        cache.set("profile:u1", 1);
        cache.set_with_ttl("profile:u2", 2, Duration::from_secs(10));

        tokio::time::sleep(Duration::from_millis(160)).await;

        assert_eq!(cache.stats().keys, vec!["profile:u2"]);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_leaves_stale_entries_in_place() {
        let cache = cache(10, 50);
        let mut sweeper = cache.spawn_sweeper().unwrap();
        assert!(sweeper.is_running());
        sweeper.stop();
        assert!(!sweeper.is_running());

        cache.set("profile:u1", 1);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(cache.len(), 1);
        // still never served
        assert_eq!(cache.get("profile:u1"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_after_stop() {
        let cache = cache(10, 50);
        let mut sweeper = Sweeper::new(&cache);
        sweeper.start().unwrap();
        sweeper.stop();
        sweeper.start().unwrap();

        cache.set("k", 7);
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn exits_when_cache_dropped() {
        let cache = cache(10, 50);
        let sweeper = cache.spawn_sweeper().unwrap();
        drop(cache);

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(!sweeper.is_running());
    }

    #[tokio::test]
    async fn zero_interval_is_rejected() {
        let cache = cache(10, 50);
        let mut sweeper = Sweeper::new(&cache).with_interval(Duration::ZERO);
        assert!(matches!(sweeper.start(), Err(Error::Validation { .. })));
        assert!(!sweeper.is_running());
    }

    #[test]
    fn start_outside_runtime_fails() {
        let cache = cache(10, 50);
        let mut sweeper = Sweeper::new(&cache);
        assert!(matches!(sweeper.start(), Err(Error::Runtime { .. })));
    }
}
