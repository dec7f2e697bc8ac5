//! Static model catalog: descriptors, the designated fallback model and the
//! budget ceilings, loaded from JSON or YAML.

use super::model::{Capability, ModelDescriptor, QualityTier, SpeedTier};
use super::selector::Budget;
use crate::{Error, ErrorContext, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Maximum acceptable `unit_cost` for each [`Budget`] tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetCeilings {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

impl Default for BudgetCeilings {
    fn default() -> Self {
        Self {
            low: 0.0005,
            medium: 0.002,
            high: 0.01,
        }
    }
}

impl BudgetCeilings {
    pub fn new(low: f64, medium: f64, high: f64) -> Self {
        Self { low, medium, high }
    }

    pub fn ceiling(&self, budget: Budget) -> f64 {
        match budget {
            Budget::Low => self.low,
            Budget::Medium => self.medium,
            Budget::High => self.high,
        }
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [("low", self.low), ("medium", self.medium), ("high", self.high)] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::validation_with_context(
                    format!("budget ceiling must be a non-negative number, got {}", value),
                    ErrorContext::new()
                        .with_field_path(format!("budget.{}", name))
                        .with_source("catalog"),
                ));
            }
        }
        if !(self.low <= self.medium && self.medium <= self.high) {
            return Err(Error::validation_with_context(
                "budget ceilings must ascend from low to high",
                ErrorContext::new()
                    .with_field_path("budget")
                    .with_details(format!(
                        "low={}, medium={}, high={}",
                        self.low, self.medium, self.high
                    ))
                    .with_source("catalog"),
            ));
        }
        Ok(())
    }
}

/// On-disk shape of a catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    pub default_model: String,
    #[serde(default)]
    pub budget: BudgetCeilings,
    pub models: Vec<ModelDescriptor>,
}

/// Immutable, validated set of model descriptors.
///
/// Invariants: at least one model, unique ids, the default model is part of
/// the catalog, costs are finite and non-negative. Catalog order is kept and
/// breaks ranking ties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CatalogFile", into = "CatalogFile")]
pub struct ModelCatalog {
    models: Vec<ModelDescriptor>,
    default_index: usize,
    budget: BudgetCeilings,
}

impl ModelCatalog {
    pub fn new(
        models: Vec<ModelDescriptor>,
        default_model: &str,
        budget: BudgetCeilings,
    ) -> Result<Self> {
        let ctx = || ErrorContext::new().with_source("catalog");

        if models.is_empty() {
            return Err(Error::validation_with_context(
                "catalog must contain at least one model",
                ctx().with_field_path("models"),
            ));
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for (i, model) in models.iter().enumerate() {
            if model.id.trim().is_empty() {
                return Err(Error::validation_with_context(
                    "model id must not be empty",
                    ctx().with_field_path(format!("models[{}].id", i)),
                ));
            }
            if !seen.insert(&model.id) {
                return Err(Error::validation_with_context(
                    format!("duplicate model id '{}'", model.id),
                    ctx().with_field_path(format!("models[{}].id", i)),
                ));
            }
            if !model.unit_cost.is_finite() || model.unit_cost < 0.0 {
                return Err(Error::validation_with_context(
                    format!("invalid unit cost {} for '{}'", model.unit_cost, model.id),
                    ctx().with_field_path(format!("models[{}].unit_cost", i)),
                ));
            }
            if model.capabilities.is_empty() {
                return Err(Error::validation_with_context(
                    format!("model '{}' declares no capabilities", model.id),
                    ctx().with_field_path(format!("models[{}].capabilities", i)),
                ));
            }
        }

        let default_index = models
            .iter()
            .position(|m| m.id == default_model)
            .ok_or_else(|| {
                Error::validation_with_context(
                    format!("default model '{}' is not in the catalog", default_model),
                    ctx().with_field_path("default_model"),
                )
            })?;

        budget.validate()?;

        Ok(Self {
            models,
            default_index,
            budget,
        })
    }

    /// The stock Gemini catalog.
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::try_from(file)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: CatalogFile = serde_yaml::from_str(yaml)?;
        Self::try_from(file)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration_with_context(
                format!("Failed to read catalog: {}", e),
                ErrorContext::new()
                    .with_details(path.display().to_string())
                    .with_source("catalog"),
            )
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            other => Err(Error::configuration_with_context(
                format!("unsupported catalog format {:?}", other.unwrap_or("")),
                ErrorContext::new()
                    .with_details(path.display().to_string())
                    .with_source("catalog"),
            )),
        }
    }

    /// Replace the budget ceilings, keeping the models.
    pub fn with_budget(mut self, budget: BudgetCeilings) -> Result<Self> {
        budget.validate()?;
        self.budget = budget;
        Ok(self)
    }

    pub fn to_file(&self) -> CatalogFile {
        CatalogFile {
            default_model: self.default_model().id.clone(),
            budget: self.budget,
            models: self.models.clone(),
        }
    }

    /// The model returned when no descriptor satisfies a request.
    pub fn default_model(&self) -> &ModelDescriptor {
        &self.models[self.default_index]
    }

    pub fn budget(&self) -> &BudgetCeilings {
        &self.budget
    }

    pub fn get(&self, id: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|m| m.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ModelDescriptor> {
        self.models.iter()
    }

    pub fn models(&self) -> &[ModelDescriptor] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Models declaring `capability`, in catalog order.
    pub fn supporting(&self, capability: Capability) -> Vec<&ModelDescriptor> {
        self.models
            .iter()
            .filter(|m| m.supports(capability))
            .collect()
    }
}

impl TryFrom<CatalogFile> for ModelCatalog {
    type Error = Error;

    fn try_from(file: CatalogFile) -> Result<Self> {
        Self::new(file.models, &file.default_model, file.budget)
    }
}

impl From<ModelCatalog> for CatalogFile {
    fn from(catalog: ModelCatalog) -> Self {
        catalog.to_file()
    }
}

impl<'a> IntoIterator for &'a ModelCatalog {
    type Item = &'a ModelDescriptor;
    type IntoIter = std::slice::Iter<'a, ModelDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.models.iter()
    }
}

const BUILTIN_DEFAULT: &str = "gemini-1.5-pro";

static BUILTIN: Lazy<ModelCatalog> = Lazy::new(|| {
    use Capability::*;

    let models = vec![
        ModelDescriptor::new("gemini-1.5-flash-8b")
            .with_display_name("Gemini 1.5 Flash-8B")
            .with_capabilities([Generation, Chat, Summarization])
            .with_max_output_tokens(8192)
            .with_unit_cost(0.00015)
            .with_speed(SpeedTier::Fast)
            .with_quality(QualityTier::Basic),
        ModelDescriptor::new("gemini-1.5-flash")
            .with_display_name("Gemini 1.5 Flash")
            .with_capabilities([Generation, Analysis, Code, Chat, Summarization])
            .with_max_output_tokens(8192)
            .with_unit_cost(0.0003)
            .with_speed(SpeedTier::Fast)
            .with_quality(QualityTier::Good),
        ModelDescriptor::new("gemini-1.0-pro")
            .with_display_name("Gemini 1.0 Pro")
            .with_capabilities([Generation, Analysis, Chat])
            .with_max_output_tokens(2048)
            .with_unit_cost(0.0015)
            .with_speed(SpeedTier::Medium)
            .with_quality(QualityTier::Good),
        ModelDescriptor::new(BUILTIN_DEFAULT)
            .with_display_name("Gemini 1.5 Pro")
            .with_capabilities([Generation, Analysis, Code, Chat, Summarization, Reasoning])
            .with_max_output_tokens(8192)
            .with_unit_cost(0.005)
            .with_speed(SpeedTier::Slow)
            .with_quality(QualityTier::Excellent),
    ];
    let default_index = models.len() - 1;

    ModelCatalog {
        models,
        default_index,
        budget: BudgetCeilings::default(),
    }
});
