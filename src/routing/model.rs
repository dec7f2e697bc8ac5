//! Model descriptors and the ordinal tiers used to classify them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Implements `as_str`, `Display` and `FromStr` for a unit-variant enum.
/// Parsing is case-insensitive and treats `-` like `_`.
macro_rules! named_enum {
    ($ty:ident, $what:literal, { $($variant:ident => $name:literal $(| $alias:literal)*),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $name,)+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.pad(self.as_str())
            }
        }

        impl std::str::FromStr for $ty {
            type Err = crate::Error;

            fn from_str(s: &str) -> crate::Result<Self> {
                let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
                match normalized.as_str() {
                    $($name $(| $alias)* => Ok($ty::$variant),)+
                    other => Err(crate::Error::validation_with_context(
                        format!("unknown {} '{}'", $what, other),
                        crate::ErrorContext::new()
                            .with_field_path($what)
                            .with_details(concat!("expected one of:", $(" ", $name),+)),
                    )),
                }
            }
        }
    };
}

pub(crate) use named_enum;

/// Task category a model can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    #[serde(alias = "gen", alias = "text_generation")]
    Generation,
    Analysis,
    Code,
    Chat,
    Summarization,
    Reasoning,
}

named_enum!(Capability, "capability", {
    Generation => "generation" | "gen" | "text_generation",
    Analysis => "analysis",
    Code => "code",
    Chat => "chat",
    Summarization => "summarization",
    Reasoning => "reasoning",
});

/// Response speed class. Ordered fastest first, so `a <= b` reads
/// "`a` is at least as fast as `b`".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedTier {
    Fast,
    #[serde(alias = "balanced")]
    Medium,
    Slow,
}

named_enum!(SpeedTier, "speed", {
    Fast => "fast",
    Medium => "medium" | "balanced",
    Slow => "slow",
});

/// Output quality class. Ordered worst first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    Basic,
    Good,
    Excellent,
}

named_enum!(QualityTier, "quality", {
    Basic => "basic",
    Good => "good",
    Excellent => "excellent",
});

/// Static metadata for one selectable model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Provider-native model id, e.g. `"gemini-1.5-flash"`.
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    pub capabilities: BTreeSet<Capability>,
    /// Upper bound on generated tokens per response.
    pub max_output_tokens: u32,
    /// USD per 1k output tokens.
    pub unit_cost: f64,
    pub speed: SpeedTier,
    pub quality: QualityTier,
}

impl ModelDescriptor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: String::new(),
            capabilities: BTreeSet::new(),
            max_output_tokens: 2048,
            unit_cost: 0.0,
            speed: SpeedTier::Medium,
            quality: QualityTier::Good,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.insert(capability);
        self
    }

    pub fn with_capabilities(mut self, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        self.capabilities.extend(capabilities);
        self
    }

    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = tokens;
        self
    }

    pub fn with_unit_cost(mut self, cost: f64) -> Self {
        self.unit_cost = cost;
        self
    }

    pub fn with_speed(mut self, speed: SpeedTier) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_quality(mut self, quality: QualityTier) -> Self {
        self.quality = quality;
        self
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Display name, falling back to the id.
    pub fn name(&self) -> &str {
        if self.display_name.is_empty() {
            &self.id
        } else {
            &self.display_name
        }
    }

    pub fn estimate_cost(&self, output_tokens: u32) -> f64 {
        (output_tokens as f64 / 1000.0) * self.unit_cost
    }
}
