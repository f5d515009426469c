//! Worksheet request and result types.

use crate::{ContentType, Difficulty, WorksheetLength};
use lectern_error::{
    ContentError, ContentErrorKind, ValidationError, ValidationErrorKind,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A multi-part content request handled by the fallback coordinator.
///
/// # Examples
///
/// ```
/// use lectern_core::{ContentType, WorksheetRequest};
///
/// let request = WorksheetRequest::new("Math", "Fractions", "4")
///     .with_content_types(vec![ContentType::MathProblems, ContentType::Vocabulary]);
/// assert!(request.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct WorksheetRequest {
    subject: String,
    topic: String,
    grade_level: String,
    #[serde(default)]
    difficulty: Difficulty,
    content_types: Vec<ContentType>,
    #[serde(default)]
    include_visuals: bool,
    #[serde(default)]
    length: WorksheetLength,
}

impl WorksheetRequest {
    /// Creates a request with no content types, medium difficulty and length.
    pub fn new(
        subject: impl Into<String>,
        topic: impl Into<String>,
        grade_level: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            topic: topic.into(),
            grade_level: grade_level.into(),
            difficulty: Difficulty::default(),
            content_types: Vec::new(),
            include_visuals: false,
            length: WorksheetLength::default(),
        }
    }

    /// Sets the requested content types.
    pub fn with_content_types(mut self, content_types: Vec<ContentType>) -> Self {
        self.content_types = content_types;
        self
    }

    /// Sets the difficulty.
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// Sets the length.
    pub fn with_length(mut self, length: WorksheetLength) -> Self {
        self.length = length;
        self
    }

    /// Requests visual assets.
    pub fn with_visuals(mut self, include_visuals: bool) -> Self {
        self.include_visuals = include_visuals;
        self
    }

    /// Content types in request order with duplicates removed.
    pub fn unique_content_types(&self) -> Vec<ContentType> {
        let mut seen = Vec::with_capacity(self.content_types.len());
        for content_type in &self.content_types {
            if !seen.contains(content_type) {
                seen.push(*content_type);
            }
        }
        seen
    }

    /// Rejects empty text fields and empty content type lists.
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
        if self.content_types.is_empty() {
            return Err(ValidationError::new(ValidationErrorKind::NoContentTypes));
        }
        Ok(())
    }
}

/// A visual attached to a content section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualAsset {
    /// Short caption
    pub caption: String,
    /// What the visual should depict
    pub description: String,
    /// Provider that produced the asset
    pub source_provider: String,
}

/// One successfully generated worksheet section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedContent {
    /// Stable section identifier
    pub section_id: String,
    /// Content type this section fulfils
    pub content_type: ContentType,
    /// Structured section body
    pub data: serde_json::Value,
    /// Provider that served the section
    pub source_provider: String,
    /// Per-section quality score in `[0, 1]`
    pub quality_score: f64,
    /// Whether the section passed the provider's safety checks
    pub safety_compliant: bool,
    /// Attached visuals
    #[serde(default)]
    pub visuals: Vec<VisualAsset>,
}

/// Aggregate quality of a worksheet.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Mean section quality score, `0.0` with no sections
    pub quality_score: f64,
    /// True when every section is safety compliant
    pub safety_compliance: bool,
    /// `min(1.0, sections / 3)`
    pub coherence: f64,
}

impl QualityMetrics {
    /// Computes aggregate metrics over the successful sections.
    pub fn from_sections(sections: &[GeneratedContent]) -> Self {
        let count = sections.len();
        let quality_score = if count == 0 {
            0.0
        } else {
            sections.iter().map(|s| s.quality_score).sum::<f64>() / count as f64
        };
        Self {
            quality_score,
            safety_compliance: sections.iter().all(|s| s.safety_compliant),
            coherence: (count as f64 / 3.0).min(1.0),
        }
    }
}

/// A content type whose whole provider chain failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentFailure {
    /// Content type that was omitted
    pub content_type: ContentType,
    /// Last failure message
    pub message: String,
}

/// The outcome of one worksheet request. Possibly partial, never raised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorksheetGenerationResult {
    /// Request identifier
    pub request_id: Uuid,
    /// Sections in request order
    pub content: Vec<GeneratedContent>,
    /// Aggregate metrics
    pub quality_metrics: QualityMetrics,
    /// Content types that could not be produced
    #[serde(default)]
    pub errors: Vec<ContentFailure>,
    /// Individual provider failures that were recovered from or skipped
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl WorksheetGenerationResult {
    /// Builds a result, computing the aggregate metrics.
    pub fn new(
        request_id: Uuid,
        content: Vec<GeneratedContent>,
        errors: Vec<ContentFailure>,
        warnings: Vec<String>,
    ) -> Self {
        let quality_metrics = QualityMetrics::from_sections(&content);
        Self {
            request_id,
            content,
            quality_metrics,
            errors,
            warnings,
        }
    }

    /// True when at least one content type failed.
    pub fn is_degraded(&self) -> bool {
        !self.errors.is_empty()
    }

    /// The content error, when any content type failed.
    ///
    /// [`ContentErrorKind::Aggregate`] when the worksheet is partial,
    /// [`ContentErrorKind::NothingGenerated`] when no section survived.
    #[track_caller]
    pub fn aggregate_error(&self) -> Option<ContentError> {
        if self.errors.is_empty() {
            return None;
        }
        let failed: Vec<String> = self
            .errors
            .iter()
            .map(|e| e.content_type.to_string())
            .collect();
        let kind = if self.content.is_empty() {
            ContentErrorKind::NothingGenerated { failed }
        } else {
            ContentErrorKind::Aggregate {
                failed,
                requested: self.content.len() + self.errors.len(),
            }
        };
        Some(ContentError::new(kind))
    }
}
