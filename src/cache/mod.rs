//! 过期缓存模块：带 TTL 的进程内键值缓存，支持按实体批量失效与后台清扫。
//!
//! # Expiring Cache Module
//!
//! In-process memoization for profile-like records, keyed by string, with a
//! time-to-live on every entry.
//!
//! ## Overview
//!
//! - Stale entries are never served; `get` evicts them lazily
//! - A background [`Sweeper`] reclaims entries that are written but never read again
//! - All facets of one entity can be dropped at once with
//!   [`ExpiringCache::clear_by_prefix`]
//! - Misses can fall back to a [`ValueLoader`] which populates the cache
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`ExpiringCache`] | Typed TTL store with invalidation and statistics |
//! | [`CacheConfig`] | Default TTL, sweep interval, invalidation mode |
//! | [`CacheKey`] | `facet:entity` key builder |
//! | [`InvalidationMode`] | Segment (default) or legacy substring matching |
//! | [`Sweeper`] | Start/stop handle for the periodic sweep task |
//! | [`ValueLoader`] | Async fill path for misses |
//!
//! ## Example
//!
//! ```rust
//! use ai_profile_kit::cache::{CacheConfig, CacheKey, ExpiringCache};
//! use std::time::Duration;
//!
//! let cache: ExpiringCache<String> =
//!     ExpiringCache::new(CacheConfig::new().with_ttl(Duration::from_secs(300)));
//!
//! cache.set(CacheKey::new("profile", "u1"), "Ada".to_string());
//! cache.set(CacheKey::new("skills", "u1"), "rust, sql".to_string());
//! assert_eq!(cache.get("profile:u1").as_deref(), Some("Ada"));
//!
//! // drop everything cached for user u1
//! assert_eq!(cache.clear_by_prefix("u1"), 2);
//! assert!(cache.get("profile:u1").is_none());
//! ```

mod entry;
mod index;
mod key;
mod loader;
mod store;
mod sweeper;

pub use entry::CacheEntry;
pub use key::{CacheKey, KEY_DELIMITER};
pub use loader::ValueLoader;
pub use store::{CacheConfig, CacheStats, ExpiringCache, InvalidationMode};
pub use sweeper::Sweeper;
