//! Async traits implemented by providers and sinks.

use async_trait::async_trait;
use lectern_core::{
    CompletionOptions, CompletionResponse, ContentType, GeneratedContent, ModelRecord,
    ProviderFamily, TokenUsage, VisualAsset, WorksheetRequest,
};
use lectern_error::{PipelineError, ProviderError};

/// One provider family's translation layer.
///
/// An adapter turns the normalized request into its provider's wire shape
/// and maps the reply back onto [`CompletionResponse`]. The gateway picks
/// the adapter by catalog lookup of the model's family.
#[async_trait]
pub trait CompletionAdapter: Send + Sync {
    /// Family this adapter serves.
    fn family(&self) -> ProviderFamily;

    /// Whether credentials are present. Unconfigured adapters are never called.
    fn is_configured(&self) -> bool {
        true
    }

    /// Run one completion against `record`.
    async fn complete(
        &self,
        record: &ModelRecord,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Family-specific cost of a call.
    fn cost(&self, record: &ModelRecord, usage: &TokenUsage) -> f64 {
        record.pricing().cost(usage)
    }

    /// Cheap liveness call used by health checks.
    async fn probe(&self) -> Result<(), ProviderError>;
}

/// Something whose reachability can be checked.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Service name the health cache keys on.
    fn name(&self) -> &str;

    /// Perform a live validation call.
    async fn probe(&self) -> Result<(), ProviderError>;
}

/// A provider of one worksheet section.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Provider name as referenced by fallback chains.
    fn name(&self) -> &str;

    /// Whether the provider can be called at all.
    fn is_configured(&self) -> bool {
        true
    }

    /// Generate one section of `content_type`.
    async fn generate(
        &self,
        request: &WorksheetRequest,
        content_type: ContentType,
    ) -> Result<GeneratedContent, ProviderError>;

    /// Live validation call.
    async fn probe(&self) -> Result<(), ProviderError>;
}

/// A provider of visual assets.
#[async_trait]
pub trait VisualProvider: Send + Sync {
    /// Provider name.
    fn name(&self) -> &str;

    /// Produce visuals for the whole worksheet.
    async fn generate_visuals(
        &self,
        request: &WorksheetRequest,
    ) -> Result<Vec<VisualAsset>, ProviderError>;
}

/// Consumer of the assembled workbook.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    /// Export the document, returning where it went.
    async fn export(&self, workbook: &serde_json::Value) -> Result<String, PipelineError>;
}
