//! Rule-based model selection.

use super::catalog::ModelCatalog;
use super::model::{named_enum, Capability, ModelDescriptor, QualityTier, SpeedTier};
use super::params::GenerationParams;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;
use tracing::debug;

/// Spending tier; maps to a cost ceiling through the catalog's
/// [`BudgetCeilings`](super::BudgetCeilings).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Budget {
    Low,
    Medium,
    High,
}

named_enum!(Budget, "budget", {
    Low => "low",
    Medium => "medium",
    High => "high",
});

/// How demanding the request is. Does not filter models; it drives
/// [`GenerationParams`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Simple,
    #[default]
    Medium,
    Complex,
}

named_enum!(Complexity, "complexity", {
    Simple => "simple",
    Medium => "medium",
    Complex => "complex",
});

/// What a caller needs from a model.
///
/// `desired_speed` is the slowest acceptable tier, `desired_quality` the
/// lowest acceptable tier and `budget` the most expensive acceptable tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionCriteria {
    pub task: Capability,
    #[serde(default)]
    pub complexity: Complexity,
    #[serde(default = "any_speed")]
    pub desired_speed: SpeedTier,
    #[serde(default = "any_quality")]
    pub desired_quality: QualityTier,
    #[serde(default = "any_budget")]
    pub budget: Budget,
}

fn any_speed() -> SpeedTier {
    SpeedTier::Slow
}

fn any_quality() -> QualityTier {
    QualityTier::Basic
}

fn any_budget() -> Budget {
    Budget::High
}

impl SelectionCriteria {
    /// Criteria for `task` that accept any speed, quality and cost.
    pub fn new(task: Capability) -> Self {
        Self {
            task,
            complexity: Complexity::default(),
            desired_speed: any_speed(),
            desired_quality: any_quality(),
            budget: any_budget(),
        }
    }

    pub fn with_complexity(mut self, complexity: Complexity) -> Self {
        self.complexity = complexity;
        self
    }

    pub fn with_speed(mut self, speed: SpeedTier) -> Self {
        self.desired_speed = speed;
        self
    }

    pub fn with_quality(mut self, quality: QualityTier) -> Self {
        self.desired_quality = quality;
        self
    }

    pub fn with_budget(mut self, budget: Budget) -> Self {
        self.budget = budget;
        self
    }
}

/// Outcome of a selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection<'a> {
    pub model: &'a ModelDescriptor,
    /// `true` when no model passed every filter and the catalog default was used.
    pub fallback: bool,
    /// Number of models that passed every filter.
    pub candidates: usize,
}

/// Pick the best model in `catalog` for `criteria`.
///
/// Filters narrow progressively: capability, then speed, quality and budget.
/// Survivors are ranked by quality (highest first), then unit cost (lowest
/// first); remaining ties go to the model listed first. If nothing survives,
/// the catalog's default model is returned. Never fails.
pub fn select_model<'a>(catalog: &'a ModelCatalog, criteria: &SelectionCriteria) -> Selection<'a> {
    let ceiling = catalog.budget().ceiling(criteria.budget);

    let candidates: Vec<&ModelDescriptor> = catalog
        .iter()
        .filter(|m| m.supports(criteria.task))
        .filter(|m| m.speed <= criteria.desired_speed)
        .filter(|m| m.quality >= criteria.desired_quality)
        .filter(|m| m.unit_cost <= ceiling)
        .collect();

    let selection = match candidates.iter().copied().min_by(|a, b| rank(a, b)) {
        Some(model) => Selection {
            model,
            fallback: false,
            candidates: candidates.len(),
        },
        None => Selection {
            model: catalog.default_model(),
            fallback: true,
            candidates: 0,
        },
    };

    debug!(
        task = %criteria.task,
        speed = %criteria.desired_speed,
        quality = %criteria.desired_quality,
        budget = %criteria.budget,
        model = %selection.model.id,
        candidates = selection.candidates,
        fallback = selection.fallback,
        "model selected"
    );
    selection
}

// Better models sort first.
fn rank(a: &ModelDescriptor, b: &ModelDescriptor) -> Ordering {
    b.quality
        .cmp(&a.quality)
        .then_with(|| a.unit_cost.total_cmp(&b.unit_cost))
}

/// Owns a catalog and answers selection requests against it.
#[derive(Debug, Clone)]
pub struct ModelSelector {
    catalog: ModelCatalog,
}

impl ModelSelector {
    pub fn new(catalog: ModelCatalog) -> Self {
        Self { catalog }
    }

    /// Selector over [`ModelCatalog::builtin`].
    pub fn builtin() -> Self {
        Self::new(ModelCatalog::builtin())
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(ModelCatalog::from_path(path)?))
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub fn select(&self, criteria: &SelectionCriteria) -> &ModelDescriptor {
        self.select_detailed(criteria).model
    }

    pub fn select_detailed(&self, criteria: &SelectionCriteria) -> Selection<'_> {
        select_model(&self.catalog, criteria)
    }

    /// Select a model and derive generation parameters for it.
    pub fn plan(&self, criteria: &SelectionCriteria) -> (&ModelDescriptor, GenerationParams) {
        let model = self.select(criteria);
        (model, GenerationParams::for_request(criteria, model))
    }
}

impl Default for ModelSelector {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::BudgetCeilings;

    fn descriptor(id: &str, speed: SpeedTier, quality: QualityTier, cost: f64) -> ModelDescriptor {
        ModelDescriptor::new(id)
            .with_capability(Capability::Generation)
            .with_speed(speed)
            .with_quality(quality)
            .with_unit_cost(cost)
    }

    fn catalog(models: Vec<ModelDescriptor>, default: &str) -> ModelCatalog {
        ModelCatalog::new(models, default, BudgetCeilings::new(0.001, 0.003, 0.01)).unwrap()
    }

    #[test]
    fn speed_filter_is_a_threshold() {
        let catalog = catalog(
            vec![
                descriptor("slow", SpeedTier::Slow, QualityTier::Excellent, 0.001),
                descriptor("medium", SpeedTier::Medium, QualityTier::Good, 0.001),
                descriptor("fast", SpeedTier::Fast, QualityTier::Basic, 0.001),
            ],
            "slow",
        );
        let pick = |speed| {
            select_model(&catalog, &SelectionCriteria::new(Capability::Generation).with_speed(speed))
                .model
                .id
                .clone()
        };
        assert_eq!(pick(SpeedTier::Slow), "slow");
        assert_eq!(pick(SpeedTier::Medium), "medium");
        assert_eq!(pick(SpeedTier::Fast), "fast");
    }

    #[test]
    fn quality_filter_is_a_threshold() {
        let catalog = catalog(
            vec![
                descriptor("basic", SpeedTier::Fast, QualityTier::Basic, 0.0001),
                descriptor("good", SpeedTier::Fast, QualityTier::Good, 0.002),
            ],
            "basic",
        );
        let criteria = SelectionCriteria::new(Capability::Generation)
            .with_quality(QualityTier::Good)
            .with_budget(Budget::Medium);
        let selection = select_model(&catalog, &criteria);
        assert_eq!(selection.model.id, "good");
        assert_eq!(selection.candidates, 1);
        assert!(!selection.fallback);
    }

    #[test]
    fn budget_filter_uses_catalog_ceilings() {
        let catalog = catalog(
            vec![
                descriptor("cheap", SpeedTier::Fast, QualityTier::Good, 0.001),
                descriptor("pricey", SpeedTier::Fast, QualityTier::Excellent, 0.004),
            ],
            "pricey",
        );
        let base = SelectionCriteria::new(Capability::Generation);
        assert_eq!(
            select_model(&catalog, &base.clone().with_budget(Budget::Low)).model.id,
            "cheap"
        );
        assert_eq!(
            select_model(&catalog, &base.clone().with_budget(Budget::Medium)).model.id,
            "cheap"
        );
        assert_eq!(
            select_model(&catalog, &base.with_budget(Budget::High)).model.id,
            "pricey"
        );
    }

    #[test]
    fn cost_breaks_quality_ties() {
        let catalog = catalog(
            vec![
                descriptor("a", SpeedTier::Fast, QualityTier::Good, 0.002),
                descriptor("b", SpeedTier::Fast, QualityTier::Good, 0.001),
            ],
            "a",
        );
        let criteria = SelectionCriteria::new(Capability::Generation);
        assert_eq!(select_model(&catalog, &criteria).model.id, "b");
    }

    #[test]
    fn full_ties_go_to_catalog_order() {
        let catalog = catalog(
            vec![
                descriptor("first", SpeedTier::Fast, QualityTier::Good, 0.001),
                descriptor("second", SpeedTier::Medium, QualityTier::Good, 0.001),
            ],
            "second",
        );
        let criteria = SelectionCriteria::new(Capability::Generation);
        assert_eq!(select_model(&catalog, &criteria).model.id, "first");
    }

    #[test]
    fn missing_capability_falls_back() {
        let catalog = catalog(
            vec![
                descriptor("a", SpeedTier::Fast, QualityTier::Good, 0.001),
                descriptor("b", SpeedTier::Slow, QualityTier::Basic, 0.0001),
            ],
            "b",
        );
        let selection = select_model(&catalog, &SelectionCriteria::new(Capability::Code));
        assert!(selection.fallback);
        assert_eq!(selection.candidates, 0);
        assert_eq!(selection.model.id, "b");
    }

    #[test]
    fn criteria_deserialize_with_defaults() {
        let criteria: SelectionCriteria = serde_json::from_str(r#"{"task":"code"}"#).unwrap();
        assert_eq!(criteria, SelectionCriteria::new(Capability::Code));
        assert_eq!(criteria.complexity, Complexity::Medium);
    }

    #[test]
    fn plan_clamps_to_model_limit() {
        let catalog = catalog(
            vec![descriptor("tiny", SpeedTier::Fast, QualityTier::Good, 0.0).with_max_output_tokens(512)],
            "tiny",
        );
        let selector = ModelSelector::new(catalog);
        let (model, params) = selector.plan(
            &SelectionCriteria::new(Capability::Generation).with_complexity(Complexity::Complex),
        );
        assert_eq!(model.id, "tiny");
        assert_eq!(params.max_output_tokens, 512);
    }
}
