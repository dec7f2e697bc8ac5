//! Expiry, overwrite, invalidation and sweep behaviour of the expiring cache.

use ai_profile_kit::cache::{
    CacheConfig, CacheKey, ExpiringCache, InvalidationMode, ValueLoader,
};
use ai_profile_kit::{Error, ErrorContext, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn cache_with_ttl(ttl: Duration) -> ExpiringCache<String> {
    ExpiringCache::new(CacheConfig::new().with_ttl(ttl))
}

#[tokio::test(start_paused = true)]
async fn test_value_expires_at_ttl() {
    let cache = cache_with_ttl(Duration::from_millis(500));
    cache.set("profile:u1", "ada".to_string());

    tokio::time::advance(Duration::from_millis(499)).await;
    assert_eq!(cache.get("profile:u1").as_deref(), Some("ada"));

    tokio::time::advance(Duration::from_millis(1)).await;
    assert_eq!(cache.get("profile:u1"), None);
    // the stale entry was evicted by the read
    assert_eq!(cache.len(), 0);
    assert_eq!(cache.stats().evictions, 1);
}

#[tokio::test(start_paused = true)]
async fn test_overwrite_restarts_ttl_window() {
    let cache = cache_with_ttl(Duration::from_millis(100));
    cache.set("profile:u1", "first".to_string());

    tokio::time::advance(Duration::from_millis(80)).await;
    cache.set("profile:u1", "second".to_string());

    tokio::time::advance(Duration::from_millis(80)).await;
    assert_eq!(cache.get("profile:u1").as_deref(), Some("second"));

    tokio::time::advance(Duration::from_millis(20)).await;
    assert_eq!(cache.get("profile:u1"), None);
}

#[tokio::test(start_paused = true)]
async fn test_per_entry_ttl_overrides_default() {
    let cache = cache_with_ttl(Duration::from_secs(60));
    cache.set_with_ttl("context:u1", "short".to_string(), Duration::from_millis(10));
    cache.set("profile:u1", "long".to_string());

    tokio::time::advance(Duration::from_millis(10)).await;
    assert!(!cache.contains_key("context:u1"));
    assert!(cache.contains_key("profile:u1"));
}

#[test]
fn test_clear_by_prefix_removes_one_entity() {
    for mode in [InvalidationMode::Segment, InvalidationMode::Substring] {
        let cache: ExpiringCache<u32> =
            ExpiringCache::new(CacheConfig::new().with_invalidation(mode));
        cache.set("profile:u1", 1);
        cache.set("skills:u1", 2);
        cache.set("profile:u2", 3);

        assert_eq!(cache.clear_by_prefix("u1"), 2, "mode {mode}");
        assert_eq!(cache.get("profile:u1"), None);
        assert_eq!(cache.get("skills:u1"), None);
        assert_eq!(cache.get("profile:u2"), Some(3));
    }
}

#[test]
fn test_clear_by_prefix_with_delimited_fragments() {
    for mode in [InvalidationMode::Segment, InvalidationMode::Substring] {
        let cache: ExpiringCache<u32> =
            ExpiringCache::new(CacheConfig::new().with_invalidation(mode));
        cache.set("profile:u1", 1);
        cache.set("profile:u2", 2);
        cache.set("skills:u1", 3);

        assert_eq!(cache.clear_by_prefix("profile:"), 2, "mode {mode}");
        assert_eq!(cache.clear_by_prefix("skills:u1"), 1, "mode {mode}");
        assert!(cache.stats().keys.is_empty(), "mode {mode}");
    }
}

#[test]
fn test_cache_key_helper_feeds_invalidation() {
    let cache: ExpiringCache<u32> = ExpiringCache::default();
    cache.set(CacheKey::new("profile", "u7"), 1);
    cache.set(CacheKey::new("ideas", "u7").with_segment("recent"), 2);
    cache.set(CacheKey::new("ideas", "u70"), 3);

    assert_eq!(cache.clear_by_prefix("u7"), 2);
    assert_eq!(cache.stats().keys, vec!["ideas:u70".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_sweep_is_idempotent() {
    let cache = cache_with_ttl(Duration::from_millis(50));
    cache.set("a:1", "x".to_string());
    cache.set("b:1", "y".to_string());
    cache.set_with_ttl("c:1", "z".to_string(), Duration::from_secs(5));

    tokio::time::advance(Duration::from_millis(60)).await;
    assert_eq!(cache.sweep(), 2);
    assert_eq!(cache.sweep(), 0);
    assert_eq!(cache.stats().keys, vec!["c:1".to_string()]);
}

#[test]
fn test_stats_has_no_side_effects() {
    let cache = cache_with_ttl(Duration::ZERO);
    cache.set("stale:u1", "v".to_string());

    let first = cache.stats();
    let second = cache.stats();
    assert_eq!(first, second);
    assert_eq!(first.count, 1);
    assert_eq!(first.keys, vec!["stale:u1".to_string()]);
}

struct ProfileStore {
    rows: HashMap<String, String>,
    calls: AtomicUsize,
}

#[async_trait]
impl ValueLoader<String> for ProfileStore {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if key == "profile:broken" {
            return Err(Error::runtime_with_context(
                "backend unavailable",
                ErrorContext::new().with_source("profile_store"),
            ));
        }
        Ok(self.rows.get(key).cloned())
    }

    fn ttl(&self) -> Option<Duration> {
        Some(Duration::from_secs(30))
    }
}

#[tokio::test(start_paused = true)]
async fn test_get_or_load_populates_on_miss() {
    let store = ProfileStore {
        rows: HashMap::from([("profile:u1".to_string(), "ada".to_string())]),
        calls: AtomicUsize::new(0),
    };
    let cache = Arc::new(cache_with_ttl(Duration::from_secs(600)));

    let first = cache.get_or_load("profile:u1", &store).await.unwrap();
    let second = cache.get_or_load("profile:u1", &store).await.unwrap();
    assert_eq!(first.as_deref(), Some("ada"));
    assert_eq!(second.as_deref(), Some("ada"));
    assert_eq!(store.calls.load(Ordering::SeqCst), 1);

    // loader TTL applies instead of the cache default
    tokio::time::advance(Duration::from_secs(30)).await;
    cache.get_or_load("profile:u1", &store).await.unwrap();
    assert_eq!(store.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_get_or_load_does_not_cache_absence_or_errors() {
    let store = ProfileStore {
        rows: HashMap::new(),
        calls: AtomicUsize::new(0),
    };
    let cache = cache_with_ttl(Duration::from_secs(600));

    assert_eq!(cache.get_or_load("profile:ghost", &store).await.unwrap(), None);
    assert!(cache.get_or_load("profile:broken", &store).await.is_err());
    assert!(cache.is_empty());

    cache.get_or_load("profile:ghost", &store).await.unwrap();
    assert_eq!(store.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_sweeper_reclaims_write_only_keys() {
    let cache = Arc::new(ExpiringCache::<u64>::new(
        CacheConfig::new()
            .with_ttl(Duration::from_secs(1))
            .with_sweep_interval(Duration::from_millis(250)),
    ));
    let mut sweeper = cache.spawn_sweeper().unwrap();

    for i in 0..100 {
        cache.set(format!("event:{i}"), i);
    }
    assert_eq!(cache.len(), 100);

    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(cache.len(), 0);

    sweeper.stop();
    assert!(!sweeper.is_running());
}
