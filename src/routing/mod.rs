//! 模型选择模块：根据任务类型、速度、质量与预算从静态目录中挑选模型。
//!
//! # Model Routing Module
//!
//! This module is **pure logic**: it performs no network calls and depends on
//! no provider SDK. Applications use it to pick a model id (e.g.
//! `"gemini-1.5-flash"`) before calling the generation API.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`ModelDescriptor`] | Capabilities, output limit, cost, speed and quality of one model |
//! | [`ModelCatalog`] | Validated static catalog, loaded from JSON/YAML or built in |
//! | [`SelectionCriteria`] | Task, complexity and minimum speed/quality/budget tiers |
//! | [`ModelSelector`] | Answers selection requests against a catalog |
//! | [`GenerationParams`] | Temperature and output budget derived from complexity |
//!
//! ## Example
//!
//! ```rust
//! use ai_profile_kit::routing::{
//!     Budget, Capability, ModelSelector, QualityTier, SelectionCriteria, SpeedTier,
//! };
//!
//! let selector = ModelSelector::builtin();
//! let criteria = SelectionCriteria::new(Capability::Generation)
//!     .with_speed(SpeedTier::Fast)
//!     .with_quality(QualityTier::Good)
//!     .with_budget(Budget::Medium);
//!
//! assert_eq!(selector.select(&criteria).id, "gemini-1.5-flash");
//! ```

mod catalog;
mod model;
mod params;
mod selector;

pub use catalog::{BudgetCeilings, CatalogFile, ModelCatalog};
pub use model::{Capability, ModelDescriptor, QualityTier, SpeedTier};
pub use params::GenerationParams;
pub use selector::{
    select_model, Budget, Complexity, ModelSelector, Selection, SelectionCriteria,
};
