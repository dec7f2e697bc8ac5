use super::model::ModelDescriptor;
use super::selector::{Complexity, SelectionCriteria};
use serde::{Deserialize, Serialize};

/// Sampling settings handed to the generation API alongside the chosen model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl GenerationParams {
    /// Baseline settings for a complexity level, before any model limit applies.
    pub fn for_complexity(complexity: Complexity) -> Self {
        match complexity {
            Complexity::Simple => Self {
                temperature: 0.3,
                max_output_tokens: 1024,
            },
            Complexity::Medium => Self {
                temperature: 0.7,
                max_output_tokens: 2048,
            },
            Complexity::Complex => Self {
                temperature: 0.9,
                max_output_tokens: 4096,
            },
        }
    }

    /// Settings for `criteria`, capped at what `model` can produce.
    pub fn for_request(criteria: &SelectionCriteria, model: &ModelDescriptor) -> Self {
        let base = Self::for_complexity(criteria.complexity);
        Self {
            max_output_tokens: base.max_output_tokens.min(model.max_output_tokens),
            ..base
        }
    }
}
