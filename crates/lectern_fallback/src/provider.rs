//! Content and visual providers backed by the completion gateway.

use async_trait::async_trait;
use lectern_core::{
    CompletionOptions, CompletionResponse, ContentType, FinishReason, GeneratedContent,
    VisualAsset, WorksheetRequest,
};
use lectern_error::ProviderError;
use lectern_interface::{
    ContentProvider, HealthProbe, PromptBuilder, VisualProvider, parse_reply, strip_fence,
};
use lectern_models::CompletionGateway;
use lectern_rate_limit::ContentProviderSettings;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

fn base_quality(finish_reason: FinishReason) -> f64 {
    match finish_reason {
        FinishReason::Stop => 1.0,
        FinishReason::StopSequence => 0.9,
        FinishReason::Length => 0.6,
        FinishReason::ContentFilter => 0.0,
        FinishReason::ToolUse | FinishReason::Other => 0.5,
    }
}

/// A named content provider that prompts one cataloged model.
pub struct GatewayContentProvider {
    name: String,
    model: String,
    system_message: Option<String>,
    quality_weight: f64,
    gateway: Arc<CompletionGateway>,
    prompts: Arc<dyn PromptBuilder>,
}

impl GatewayContentProvider {
    /// Provider `name` calling `model` through `gateway`.
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        gateway: Arc<CompletionGateway>,
        prompts: Arc<dyn PromptBuilder>,
    ) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            system_message: None,
            quality_weight: 1.0,
            gateway,
            prompts,
        }
    }

    /// Provider from its configuration entry.
    pub fn from_settings(
        name: impl Into<String>,
        settings: &ContentProviderSettings,
        gateway: Arc<CompletionGateway>,
        prompts: Arc<dyn PromptBuilder>,
    ) -> Self {
        let mut provider = Self::new(name, settings.model.clone(), gateway, prompts);
        provider.system_message = settings.system_message.clone();
        provider.quality_weight = settings.quality_weight;
        provider
    }

    /// Model this provider prompts.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn section(&self, content_type: ContentType, response: CompletionResponse) -> GeneratedContent {
        let quality = (base_quality(response.finish_reason) * self.quality_weight).clamp(0.0, 1.0);
        GeneratedContent {
            section_id: Uuid::new_v4().to_string(),
            content_type,
            data: parse_reply(&response.content),
            source_provider: self.name.clone(),
            quality_score: quality,
            safety_compliant: response.finish_reason != FinishReason::ContentFilter,
            visuals: Vec::new(),
        }
    }
}

#[async_trait]
impl ContentProvider for GatewayContentProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_configured(&self) -> bool {
        self.gateway.is_available(&self.model)
    }

    #[instrument(skip(self, request), fields(provider = %self.name, model = %self.model))]
    async fn generate(
        &self,
        request: &WorksheetRequest,
        content_type: ContentType,
    ) -> Result<GeneratedContent, ProviderError> {
        let prompt = self.prompts.content_prompt(request, content_type);
        let options = CompletionOptions {
            system_message: self.system_message.clone(),
            ..CompletionOptions::default()
        };
        let response = self.gateway.complete(&prompt, &self.model, &options).await?;
        debug!(finish_reason = %response.finish_reason, "Section generated");
        Ok(self.section(content_type, response))
    }

    async fn probe(&self) -> Result<(), ProviderError> {
        self.gateway.probe_model(&self.model).await
    }
}

#[derive(Debug, Deserialize)]
struct VisualReply {
    #[serde(default)]
    visuals: Vec<VisualEntry>,
}

#[derive(Debug, Deserialize)]
struct VisualEntry {
    #[serde(default)]
    caption: String,
    #[serde(default)]
    description: String,
}

/// Visual provider that asks a model to describe illustrations.
pub struct GatewayVisualProvider {
    name: String,
    model: String,
    gateway: Arc<CompletionGateway>,
    prompts: Arc<dyn PromptBuilder>,
}

impl GatewayVisualProvider {
    /// Visual provider `name` calling `model` through `gateway`.
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        gateway: Arc<CompletionGateway>,
        prompts: Arc<dyn PromptBuilder>,
    ) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            gateway,
            prompts,
        }
    }

    fn assets(&self, content: &str) -> Vec<VisualAsset> {
        match serde_json::from_str::<VisualReply>(strip_fence(content)) {
            Ok(reply) if !reply.visuals.is_empty() => reply
                .visuals
                .into_iter()
                .map(|entry| VisualAsset {
                    caption: entry.caption,
                    description: entry.description,
                    source_provider: self.name.clone(),
                })
                .collect(),
            _ => vec![VisualAsset {
                caption: String::new(),
                description: content.trim().to_string(),
                source_provider: self.name.clone(),
            }],
        }
    }
}

#[async_trait]
impl VisualProvider for GatewayVisualProvider {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self, request), fields(provider = %self.name))]
    async fn generate_visuals(
        &self,
        request: &WorksheetRequest,
    ) -> Result<Vec<VisualAsset>, ProviderError> {
        let prompt = self.prompts.visual_prompt(request);
        let response = self
            .gateway
            .complete(&prompt, &self.model, &CompletionOptions::default())
            .await?;
        Ok(self.assets(&response.content))
    }
}

/// Health probe for a content provider, keyed by the provider's name.
pub struct ContentProbe(pub Arc<dyn ContentProvider>);

#[async_trait]
impl HealthProbe for ContentProbe {
    fn name(&self) -> &str {
        self.0.name()
    }

    async fn probe(&self) -> Result<(), ProviderError> {
        self.0.probe().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_interface::TemplatePromptBuilder;
    use lectern_models::ModelCatalog;

    fn visual_provider() -> GatewayVisualProvider {
        let catalog = Arc::new(ModelCatalog::new(Vec::<lectern_core::ModelRecord>::new()));
        GatewayVisualProvider::new(
            "illustrator",
            "gpt-4o-mini",
            Arc::new(CompletionGateway::new(catalog)),
            Arc::new(TemplatePromptBuilder),
        )
    }

    #[test]
    fn visual_reply_is_parsed() {
        let assets = visual_provider().assets(
            "```json\n{\"visuals\": [{\"caption\": \"Pie\", \"description\": \"A pie cut in quarters\"}]}\n```",
        );
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].caption, "Pie");
        assert_eq!(assets[0].source_provider, "illustrator");
    }

    #[test]
    fn plain_visual_reply_becomes_one_asset() {
        let assets = visual_provider().assets("Draw a pie cut in quarters.");
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].description, "Draw a pie cut in quarters.");
    }

    #[test]
    fn quality_follows_finish_reason() {
        assert_eq!(base_quality(FinishReason::Stop), 1.0);
        assert!(base_quality(FinishReason::Length) < base_quality(FinishReason::StopSequence));
        assert_eq!(base_quality(FinishReason::ContentFilter), 0.0);
    }
}
