//! # ai-profile-kit
//!
//! 面向画像驱动型 AI 应用的进程内工具：带 TTL 的缓存与基于能力的模型选择。
//!
//! In-process building blocks for applications that personalise generative-AI
//! requests from stored user profiles.
//!
//! ## Overview
//!
//! Two independent components:
//!
//! - **Expiring cache**: typed TTL memoization of profile-like records, with
//!   lazy eviction on read, a background sweep and per-entity invalidation
//! - **Model selector**: deterministic, rule-based choice of a model from a
//!   static catalog given task, speed, quality and budget requirements
//!
//! Neither performs I/O beyond loading configuration files. Database access and
//! generation calls stay with the application; the cache exposes a
//! [`cache::ValueLoader`] seam for the former.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ai_profile_kit::cache::CacheKey;
//! use ai_profile_kit::config::RuntimeConfig;
//! use ai_profile_kit::routing::{Capability, SelectionCriteria};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> ai_profile_kit::Result<()> {
//!     let config = RuntimeConfig::from_env()?;
//!
//!     let profiles = Arc::new(config.build_cache::<String>());
//!     let _sweeper = profiles.spawn_sweeper()?;
//!     profiles.set(CacheKey::new("profile", "u1"), "Ada Lovelace".to_string());
//!
//!     let selector = config.build_selector()?;
//!     let model = selector.select(&SelectionCriteria::new(Capability::Analysis));
//!     println!("using {}", model.id);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | Expiring key-value cache, sweeper and loader seam |
//! | [`routing`] | Model descriptors, catalog and selector |
//! | [`config`] | File and environment configuration, composition helpers |
//! | [`error`] | Error type and structured context |

pub mod cache;
pub mod config;
pub mod routing;

// Re-export main types for convenience
pub use cache::{CacheConfig, CacheKey, ExpiringCache, Sweeper};
pub use config::RuntimeConfig;
pub use routing::{
    Budget, Capability, Complexity, ModelCatalog, ModelDescriptor, ModelSelector, QualityTier,
    SelectionCriteria, SpeedTier,
};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
