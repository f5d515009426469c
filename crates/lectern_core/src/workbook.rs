//! Workbook pipeline input.

use crate::Difficulty;
use lectern_error::{ValidationError, ValidationErrorKind};
use serde::{Deserialize, Serialize};

/// Immutable parameters of one workbook pipeline run.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(setter(into))]
pub struct WorkbookRequest {
    /// Optional title; the assembly stage derives one when absent
    #[builder(default)]
    #[serde(default)]
    title: Option<String>,
    /// Subject area
    subject: String,
    /// Topic within the subject
    topic: String,
    /// Grade level as written by the caller
    grade_level: String,
    /// Difficulty
    #[builder(default)]
    #[serde(default)]
    difficulty: Difficulty,
    /// Number of sections to plan and draft
    #[builder(default = "3")]
    #[serde(default = "default_section_count")]
    section_count: u32,
    /// Whether the visuals stage should describe illustrations
    #[builder(default)]
    #[serde(default)]
    include_visuals: bool,
}

fn default_section_count() -> u32 {
    3
}

/// Upper bound on sections per workbook.
pub const MAX_SECTIONS: u32 = 12;

impl WorkbookRequest {
    /// Creates a new builder.
    pub fn builder() -> WorkbookRequestBuilder {
        WorkbookRequestBuilder::default()
    }

    /// Rejects empty text fields and out-of-range section counts.
    #[track_caller]
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("subject", &self.subject),
            ("topic", &self.topic),
            ("grade_level", &self.grade_level),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::new(ValidationErrorKind::EmptyField(
                    field.to_string(),
                )));
            }
        }
        if self.section_count == 0 || self.section_count > MAX_SECTIONS {
            return Err(ValidationError::new(ValidationErrorKind::InvalidField {
                field: "section_count".to_string(),
                reason: format!("must be between 1 and {}", MAX_SECTIONS),
            }));
        }
        Ok(())
    }
}
