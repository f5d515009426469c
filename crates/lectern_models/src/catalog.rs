//! Immutable model catalog.

use lectern_core::{ModelRecord, Pricing, ProviderFamily};
use lectern_error::{ProviderError, ProviderErrorKind};
use lectern_rate_limit::LecternConfig;
use std::collections::BTreeMap;

/// Model id to [`ModelRecord`]. Built once, read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelCatalog {
    records: BTreeMap<String, ModelRecord>,
}

impl ModelCatalog {
    /// Catalog over explicit records.
    pub fn new(records: impl IntoIterator<Item = ModelRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|record| (record.id().clone(), record))
                .collect(),
        }
    }

    /// Catalog from the `[models]` section.
    pub fn from_config(config: &LecternConfig) -> Self {
        Self::new(config.models.iter().map(|(id, model)| {
            ModelRecord::new(
                id.clone(),
                model.family,
                model.max_input_tokens,
                model.max_output_tokens,
                Pricing {
                    input_per_million: model.input_cost_per_million,
                    output_per_million: model.output_cost_per_million,
                    long_context_threshold: model.long_context_threshold,
                    long_context_multiplier: model.long_context_multiplier,
                },
            )
        }))
    }

    /// Record for `model`.
    #[track_caller]
    pub fn get(&self, model: &str) -> Result<&ModelRecord, ProviderError> {
        self.records
            .get(model)
            .ok_or_else(|| ProviderError::new(ProviderErrorKind::UnknownModel(model.to_string())))
    }

    /// Family serving `model`.
    #[track_caller]
    pub fn family_of(&self, model: &str) -> Result<ProviderFamily, ProviderError> {
        self.get(model).map(|record| *record.family())
    }

    /// All records, ordered by id.
    pub fn models(&self) -> impl Iterator<Item = &ModelRecord> {
        self.records.values()
    }

    /// Number of models.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no models are cataloged.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
