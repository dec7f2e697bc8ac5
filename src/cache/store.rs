//! The expiring key-value store.

use super::entry::CacheEntry;
use super::index::SegmentIndex;
use super::key::{matches_segments, segments, KEY_DELIMITER};
use super::loader::ValueLoader;
use super::sweeper::Sweeper;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// How [`ExpiringCache::clear_by_prefix`] decides that a key belongs to a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidationMode {
    /// A `:`-separated segment of the key equals the fragment. `u1` matches
    /// `profile:u1` but not `profile:u10`. A fragment containing `:` must line
    /// up with a run of whole segments: `profile:` matches every `profile:*`
    /// key and `skills:u1` matches that key alone.
    #[default]
    Segment,
    /// The key contains the fragment anywhere. `u1` matches `profile:u10` too.
    Substring,
}

impl fmt::Display for InvalidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidationMode::Segment => write!(f, "segment"),
            InvalidationMode::Substring => write!(f, "substring"),
        }
    }
}

impl FromStr for InvalidationMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "segment" => Ok(InvalidationMode::Segment),
            "substring" => Ok(InvalidationMode::Substring),
            other => Err(Error::validation_with_context(
                format!("unknown invalidation mode '{}'", other),
                ErrorContext::new()
                    .with_field_path("cache.invalidation")
                    .with_details("expected 'segment' or 'substring'"),
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub default_ttl: Duration,
    pub sweep_interval: Duration,
    pub invalidation: InvalidationMode,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(5 * 60),
            sweep_interval: Duration::from_secs(60),
            invalidation: InvalidationMode::Segment,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    pub fn with_invalidation(mut self, mode: InvalidationMode) -> Self {
        self.invalidation = mode;
        self
    }
}

/// Point-in-time view of the cache.
///
/// `count` and `keys` describe what is physically stored, which may include
/// stale entries that neither a read nor a sweep has purged yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub count: usize,
    pub keys: Vec<String>,
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Default)]
struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    evictions: AtomicU64,
}

struct Inner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    index: SegmentIndex,
}

impl<V> Inner<V> {
    fn remove(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.index.remove(key);
            true
        } else {
            false
        }
    }
}

/// In-memory memoization store with per-entry TTL.
///
/// - Stale entries are never served: `get` evicts them on sight
/// - `sweep` reclaims entries nobody reads again; run it by hand or through a [`Sweeper`]
/// - No capacity bound; expiry is purely time-based
///
/// All operations are total. Missing keys, repeated inserts and repeated
/// deletes are not errors.
pub struct ExpiringCache<V> {
    config: CacheConfig,
    inner: RwLock<Inner<V>>,
    stats: AtomicStats,
}

impl<V> ExpiringCache<V> {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            inner: RwLock::new(Inner {
                entries: HashMap::new(),
                index: SegmentIndex::default(),
            }),
            stats: AtomicStats::default(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner<V>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner<V>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `value` under `key` with the default TTL.
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_with_ttl(key, value, self.config.default_ttl);
    }

    /// Store `value` under `key`, replacing any previous entry and restarting
    /// its TTL window.
    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        let mut inner = self.write();
        if inner.entries.insert(key.clone(), CacheEntry::new(value, ttl)).is_none() {
            inner.index.insert(&key);
        }
        self.stats.sets.fetch_add(1, Ordering::Relaxed);
    }

    /// Whether a fresh entry exists. Does not evict and does not count as a hit.
    pub fn contains_key(&self, key: impl AsRef<str>) -> bool {
        self.read()
            .entries
            .get(key.as_ref())
            .map(|e| !e.is_expired())
            .unwrap_or(false)
    }

    /// Remove `key`. Returns whether an entry was present.
    pub fn delete(&self, key: impl AsRef<str>) -> bool {
        let removed = self.write().remove(key.as_ref());
        if removed {
            self.stats.deletes.fetch_add(1, Ordering::Relaxed);
        }
        removed
    }

    pub fn clear(&self) {
        let mut inner = self.write();
        let removed = inner.entries.len() as u64;
        inner.entries.clear();
        inner.index.clear();
        self.stats.deletes.fetch_add(removed, Ordering::Relaxed);
    }

    /// Remove every entry whose key matches `fragment` under the configured
    /// [`InvalidationMode`]. Used to drop all cached facets of one entity
    /// (`"u1"`) or one facet for everybody (`"profile:"`).
    /// An empty fragment matches nothing.
    pub fn clear_by_prefix(&self, fragment: &str) -> usize {
        if fragment.is_empty() {
            return 0;
        }
        let mut inner = self.write();
        let doomed: Vec<String> = match self.config.invalidation {
            InvalidationMode::Segment if !fragment.contains(KEY_DELIMITER) => {
                inner.index.keys_for(fragment)
            }
            InvalidationMode::Segment => match segments(fragment).next() {
                Some(first) => inner
                    .index
                    .keys_for(first)
                    .into_iter()
                    .filter(|k| matches_segments(k, fragment))
                    .collect(),
                None => Vec::new(),
            },
            InvalidationMode::Substring => inner
                .entries
                .keys()
                .filter(|k| k.contains(fragment))
                .cloned()
                .collect(),
        };
        let removed = doomed.iter().filter(|k| inner.remove(k)).count();
        drop(inner);

        self.stats
            .deletes
            .fetch_add(removed as u64, Ordering::Relaxed);
        debug!(
            fragment,
            removed,
            mode = %self.config.invalidation,
            "cache entries invalidated"
        );
        removed
    }

    /// Remove every stale entry in a single pass. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut inner = self.write();
        let stale: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, e)| e.is_expired_at(now))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &stale {
            inner.remove(key);
        }
        drop(inner);

        if !stale.is_empty() {
            self.stats
                .evictions
                .fetch_add(stale.len() as u64, Ordering::Relaxed);
            debug!(removed = stale.len(), "cache sweep");
        }
        stale.len()
    }

    /// Number of physically stored entries, stale ones included.
    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.read();
        let mut keys: Vec<String> = inner.entries.keys().cloned().collect();
        drop(inner);
        keys.sort();
        CacheStats {
            count: keys.len(),
            keys,
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            sets: self.stats.sets.load(Ordering::Relaxed),
            deletes: self.stats.deletes.load(Ordering::Relaxed),
            evictions: self.stats.evictions.load(Ordering::Relaxed),
        }
    }
}

impl<V: Clone> ExpiringCache<V> {
    /// Fetch a fresh value. A stale entry is removed and reported as absent.
    pub fn get(&self, key: impl AsRef<str>) -> Option<V> {
        let key = key.as_ref();
        let fresh = match self.read().entries.get(key) {
            Some(entry) if !entry.is_expired() => Some(entry.value().clone()),
            Some(_) => None,
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };
        let found = match fresh {
            Some(value) => Some(value),
            None => {
                // Re-check under the write lock; a concurrent `set` may have
                // refreshed the entry.
                let mut inner = self.write();
                let lookup = inner
                    .entries
                    .get(key)
                    .map(|e| (!e.is_expired()).then(|| e.value().clone()));
                match lookup {
                    Some(Some(value)) => Some(value),
                    Some(None) => {
                        inner.remove(key);
                        self.stats.evictions.fetch_add(1, Ordering::Relaxed);
                        None
                    }
                    None => None,
                }
            }
        };

        if found.is_some() {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.stats.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    /// Return the cached value or compute, store and return a new one.
    pub fn get_or_insert_with<F>(&self, key: impl Into<String>, f: F) -> V
    where
        F: FnOnce() -> V,
    {
        let key = key.into();
        if let Some(value) = self.get(&key) {
            return value;
        }
        let value = f();
        self.set(key, value.clone());
        value
    }

    /// Like [`get_or_insert_with`](Self::get_or_insert_with) for fallible
    /// producers. On error nothing is stored.
    pub fn get_or_try_insert_with<F, E>(
        &self,
        key: impl Into<String>,
        f: F,
    ) -> std::result::Result<V, E>
    where
        F: FnOnce() -> std::result::Result<V, E>,
    {
        let key = key.into();
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = f()?;
        self.set(key, value.clone());
        Ok(value)
    }

    /// Serve from cache or fall back to `loader`, caching what it returns.
    ///
    /// The lock is not held while the loader runs, so concurrent misses on
    /// the same key may each call the loader; the last write wins.
    pub async fn get_or_load<L>(&self, key: impl Into<String>, loader: &L) -> Result<Option<V>>
    where
        L: ValueLoader<V> + ?Sized,
    {
        let key = key.into();
        if let Some(value) = self.get(&key) {
            return Ok(Some(value));
        }
        let loaded = loader.load(&key).await?;
        if let Some(ref value) = loaded {
            let ttl = loader.ttl().unwrap_or(self.config.default_ttl);
            debug!(key = %key, loader = loader.name(), ttl_ms = ttl.as_millis() as u64, "cache filled");
            self.set_with_ttl(key, value.clone(), ttl);
        }
        Ok(loaded)
    }
}

impl<V: Send + Sync + 'static> ExpiringCache<V> {
    /// Start a background [`Sweeper`] using the configured interval.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_sweeper(self: &Arc<Self>) -> Result<Sweeper<V>> {
        let mut sweeper = Sweeper::new(self);
        sweeper.start()?;
        Ok(sweeper)
    }
}

impl<V> Default for ExpiringCache<V> {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl<V> fmt::Debug for ExpiringCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiringCache")
            .field("config", &self.config)
            .field("len", &self.len())
            .finish()
    }
}
