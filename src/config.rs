//! Runtime configuration.
//!
//! A single file (YAML or JSON) with `cache` and `routing` sections, plus
//! environment overrides. Durations are given in milliseconds.
//!
//! ```yaml
//! cache:
//!   default_ttl_ms: 300000
//!   sweep_interval_ms: 60000
//!   invalidation: segment
//! routing:
//!   catalog_path: config/models.yaml
//!   budget: { low: 0.0005, medium: 0.002, high: 0.01 }
//! ```
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `AI_PROFILE_CACHE_TTL_MS` | `cache.default_ttl_ms` |
//! | `AI_PROFILE_SWEEP_INTERVAL_MS` | `cache.sweep_interval_ms` |
//! | `AI_PROFILE_INVALIDATION` | `cache.invalidation` |
//! | `AI_PROFILE_CATALOG` | `routing.catalog_path` |
//!
//! `AI_PROFILE_CONFIG` names the config file itself; [`RuntimeConfig::from_env`]
//! reads it when set.

use crate::cache::{CacheConfig, ExpiringCache, InvalidationMode};
use crate::routing::{BudgetCeilings, ModelCatalog, ModelSelector};
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const ENV_CACHE_TTL_MS: &str = "AI_PROFILE_CACHE_TTL_MS";
pub const ENV_SWEEP_INTERVAL_MS: &str = "AI_PROFILE_SWEEP_INTERVAL_MS";
pub const ENV_INVALIDATION: &str = "AI_PROFILE_INVALIDATION";
pub const ENV_CATALOG: &str = "AI_PROFILE_CATALOG";
/// Path of the config file; not an override.
pub const ENV_CONFIG: &str = "AI_PROFILE_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub default_ttl_ms: u64,
    pub sweep_interval_ms: u64,
    pub invalidation: InvalidationMode,
}

impl Default for CacheSettings {
    fn default() -> Self {
        let defaults = CacheConfig::default();
        Self {
            default_ttl_ms: defaults.default_ttl.as_millis() as u64,
            sweep_interval_ms: defaults.sweep_interval.as_millis() as u64,
            invalidation: defaults.invalidation,
        }
    }
}

impl CacheSettings {
    pub fn to_cache_config(&self) -> CacheConfig {
        CacheConfig::new()
            .with_ttl(Duration::from_millis(self.default_ttl_ms))
            .with_sweep_interval(Duration::from_millis(self.sweep_interval_ms))
            .with_invalidation(self.invalidation)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingSettings {
    /// Catalog file; the built-in catalog is used when unset.
    pub catalog_path: Option<PathBuf>,
    /// Replaces the catalog's own budget ceilings when set.
    pub budget: Option<BudgetCeilings>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub cache: CacheSettings,
    pub routing: RoutingSettings,
}

impl RuntimeConfig {
    /// Load a `.yaml`/`.yml`/`.json` file. Relative catalog paths resolve
    /// against the file's directory.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration_with_context(
                format!("Failed to read config: {}", e),
                ErrorContext::new()
                    .with_details(path.display().to_string())
                    .with_source("runtime_config"),
            )
        })?;
        let mut config: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            other => {
                return Err(Error::configuration_with_context(
                    format!("unsupported config format {:?}", other.unwrap_or("")),
                    ErrorContext::new()
                        .with_details(path.display().to_string())
                        .with_source("runtime_config"),
                ))
            }
        };

        if let (Some(catalog), Some(dir)) = (config.routing.catalog_path.as_ref(), path.parent()) {
            if catalog.is_relative() {
                config.routing.catalog_path = Some(dir.join(catalog));
            }
        }
        config.validate()?;
        debug!(path = %path.display(), "runtime config loaded");
        Ok(config)
    }

    /// The file named by `AI_PROFILE_CONFIG` (or defaults), overridden by
    /// the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// [`from_env`](Self::from_env) against an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = match lookup(ENV_CONFIG).filter(|p| !p.trim().is_empty()) {
            Some(path) => Self::from_path(path.trim())?,
            None => Self::default(),
        };
        base.with_overrides(lookup)
    }

    /// Optional file, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let base = match path {
            Some(p) => Self::from_path(p)?,
            None => Self::default(),
        };
        base.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_CACHE_TTL_MS) {
            self.cache.default_ttl_ms = parse_millis(ENV_CACHE_TTL_MS, &v)?;
        }
        if let Some(v) = lookup(ENV_SWEEP_INTERVAL_MS) {
            self.cache.sweep_interval_ms = parse_millis(ENV_SWEEP_INTERVAL_MS, &v)?;
        }
        if let Some(v) = lookup(ENV_INVALIDATION) {
            self.cache.invalidation = v.parse()?;
        }
        if let Some(v) = lookup(ENV_CATALOG) {
            if !v.trim().is_empty() {
                self.routing.catalog_path = Some(PathBuf::from(v.trim()));
            }
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache.sweep_interval_ms == 0 {
            return Err(Error::configuration_with_context(
                "sweep interval must be greater than zero",
                ErrorContext::new()
                    .with_field_path("cache.sweep_interval_ms")
                    .with_source("runtime_config"),
            ));
        }
        if self.cache.default_ttl_ms == 0 {
            return Err(Error::configuration_with_context(
                "default TTL must be greater than zero",
                ErrorContext::new()
                    .with_field_path("cache.default_ttl_ms")
                    .with_source("runtime_config"),
            ));
        }
        Ok(())
    }

    pub fn build_cache<V>(&self) -> ExpiringCache<V> {
        ExpiringCache::new(self.cache.to_cache_config())
    }

    pub fn build_catalog(&self) -> Result<ModelCatalog> {
        let catalog = match self.routing.catalog_path {
            Some(ref path) => ModelCatalog::from_path(path)?,
            None => ModelCatalog::builtin(),
        };
        match self.routing.budget {
            Some(budget) => catalog.with_budget(budget),
            None => Ok(catalog),
        }
    }

    pub fn build_selector(&self) -> Result<ModelSelector> {
        Ok(ModelSelector::new(self.build_catalog()?))
    }
}

fn parse_millis(var: &str, value: &str) -> Result<u64> {
    value.trim().parse::<u64>().map_err(|e| {
        Error::configuration_with_context(
            format!("{} must be a whole number of milliseconds", var),
            ErrorContext::new()
                .with_field_path(var)
                .with_details(format!("'{}': {}", value, e))
                .with_source("runtime_config"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_mirror_cache_config() {
        let config = RuntimeConfig::default();
        assert_eq!(config.cache.default_ttl_ms, 300_000);
        assert_eq!(config.cache.sweep_interval_ms, 60_000);
        assert_eq!(config.cache.invalidation, InvalidationMode::Segment);
        assert!(config.routing.catalog_path.is_none());
    }

    #[test]
    fn overrides_apply() {
        let config = RuntimeConfig::default()
            .with_overrides(env(&[
                (ENV_CACHE_TTL_MS, "1500"),
                (ENV_INVALIDATION, "substring"),
                (ENV_CATALOG, "/etc/models.json"),
            ]))
            .unwrap();
        assert_eq!(config.cache.default_ttl_ms, 1500);
        assert_eq!(config.cache.invalidation, InvalidationMode::Substring);
        assert_eq!(
            config.routing.catalog_path,
            Some(PathBuf::from("/etc/models.json"))
        );
        assert_eq!(
            config.cache.to_cache_config().default_ttl,
            Duration::from_millis(1500)
        );
    }

    #[test]
    fn config_file_named_by_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runtime.yaml");
        std::fs::write(&path, "cache:\n  default_ttl_ms: 2500\n").unwrap();
        let path = path.to_string_lossy().into_owned();

        let config = RuntimeConfig::from_lookup(env(&[(ENV_CONFIG, path.as_str())])).unwrap();
        assert_eq!(config.cache.default_ttl_ms, 2500);

        let config = RuntimeConfig::from_lookup(env(&[
            (ENV_CONFIG, path.as_str()),
            (ENV_CACHE_TTL_MS, "900"),
        ]))
        .unwrap();
        assert_eq!(config.cache.default_ttl_ms, 900);

        let config = RuntimeConfig::from_lookup(env(&[])).unwrap();
        assert_eq!(config, RuntimeConfig::default());
    }

    #[test]
    fn bad_override_is_rejected() {
        let err = RuntimeConfig::default()
            .with_overrides(env(&[(ENV_SWEEP_INTERVAL_MS, "soon")]))
            .unwrap_err();
        assert_eq!(
            err.context().unwrap().field_path.as_deref(),
            Some(ENV_SWEEP_INTERVAL_MS)
        );

        assert!(RuntimeConfig::default()
            .with_overrides(env(&[(ENV_SWEEP_INTERVAL_MS, "0")]))
            .is_err());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: RuntimeConfig =
            serde_yaml::from_str("cache:\n  invalidation: substring\n").unwrap();
        assert_eq!(config.cache.invalidation, InvalidationMode::Substring);
        assert_eq!(config.cache.default_ttl_ms, 300_000);
    }

    #[test]
    fn budget_override_replaces_catalog_ceilings() {
        let mut config = RuntimeConfig::default();
        config.routing.budget = Some(BudgetCeilings::new(0.0, 0.0, 0.0));
        let catalog = config.build_catalog().unwrap();
        assert_eq!(catalog.budget().high, 0.0);
    }
}
