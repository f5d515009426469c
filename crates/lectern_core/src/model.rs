//! Model records: the immutable per-model catalog entry.

use crate::{ProviderFamily, TokenUsage};
use serde::{Deserialize, Serialize};

/// Per-million-token pricing for one model.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pricing {
    /// USD per million input tokens
    pub input_per_million: f64,
    /// USD per million output tokens
    pub output_per_million: f64,
    /// Input size above which long-context pricing applies
    #[serde(default)]
    pub long_context_threshold: Option<u64>,
    /// Multiplier applied to the whole call above the threshold
    #[serde(default)]
    pub long_context_multiplier: Option<f64>,
}

impl Pricing {
    /// Flat per-million cost of a call.
    pub fn cost(&self, usage: &TokenUsage) -> f64 {
        (usage.input as f64 * self.input_per_million
            + usage.output as f64 * self.output_per_million)
            / 1_000_000.0
    }

    /// Cost with the long-context multiplier applied when the prompt
    /// exceeds the threshold.
    pub fn long_context_cost(&self, usage: &TokenUsage) -> f64 {
        let base = self.cost(usage);
        match (self.long_context_threshold, self.long_context_multiplier) {
            (Some(threshold), Some(multiplier)) if usage.input > threshold => base * multiplier,
            _ => base,
        }
    }
}

/// Catalog entry for one model id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct ModelRecord {
    id: String,
    family: ProviderFamily,
    max_input_tokens: u32,
    max_output_tokens: u32,
    pricing: Pricing,
}

impl ModelRecord {
    /// Creates a record.
    pub fn new(
        id: impl Into<String>,
        family: ProviderFamily,
        max_input_tokens: u32,
        max_output_tokens: u32,
        pricing: Pricing,
    ) -> Self {
        Self {
            id: id.into(),
            family,
            max_input_tokens,
            max_output_tokens,
            pricing,
        }
    }

    /// Clamps a requested output budget to this model's limit.
    pub fn clamp_output(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.max_output_tokens)
            .min(self.max_output_tokens)
    }
}
