//! Errors raised while loading catalogs and runtime config or parsing
//! user-supplied names.
//!
//! Cache operations and model selection are total and never produce these.

use std::fmt;
use thiserror::Error;

/// Where an error came from: the offending field, what was expected, and the
/// component that noticed.
///
/// Rendered as a parenthesised suffix, e.g.
/// `(field: models[2].unit_cost, details: must be finite, source: catalog)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// Dotted path into a catalog or config file, or an environment variable
    /// name such as `AI_PROFILE_CACHE_TTL_MS`.
    pub field_path: Option<String>,
    /// Expected values or the file that was being read.
    pub details: Option<String>,
    /// Component that raised the error: `catalog`, `runtime_config`, `sweeper`.
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    fn is_empty(&self) -> bool {
        self.field_path.is_none() && self.details.is_none() && self.source.is_none()
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        let labelled = [
            ("field", &self.field_path),
            ("details", &self.details),
            ("source", &self.source),
        ];
        f.write_str(" (")?;
        let mut first = true;
        for (label, value) in labelled {
            if let Some(value) = value {
                if !first {
                    f.write_str(", ")?;
                }
                write!(f, "{}: {}", label, value)?;
                first = false;
            }
        }
        f.write_str(")")
    }
}

/// Unified error type for catalog loading, configuration and input parsing.
///
/// Cache misses and empty selections are not errors; they surface as `None`
/// and as the catalog's fallback model respectively.
#[derive(Debug, Error)]
pub enum Error {
    /// Config or catalog file unreadable, in an unknown format, or with
    /// unusable settings (zero TTL, zero sweep interval).
    #[error("Configuration error: {message}{context}")]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    /// Catalog contents that break an invariant (duplicate ids, missing
    /// default, negative cost) or an unknown capability/tier/mode name.
    #[error("Validation error: {message}{context}")]
    Validation {
        message: String,
        context: ErrorContext,
    },

    /// Sweeper started outside a tokio runtime, or a loader failure.
    #[error("Runtime error: {message}{context}")]
    Runtime {
        message: String,
        context: ErrorContext,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON catalog or config.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Malformed YAML catalog or config.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    pub fn runtime_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Runtime {
            message: msg.into(),
            context,
        }
    }

    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Structured context; `None` for errors wrapped from I/O or parsers.
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. }
            | Error::Validation { context, .. }
            | Error::Runtime { context, .. } => Some(context),
            _ => None,
        }
    }
}
