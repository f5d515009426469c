//! Gemini generateContent adapter.

use crate::wire::encode_body;
use async_trait::async_trait;
use lectern_core::{
    CompletionOptions, CompletionResponse, FinishReason, ModelRecord, ProviderFamily, TokenUsage,
};
use lectern_error::{ConfigError, ProviderError, ProviderErrorKind};
use lectern_interface::CompletionAdapter;
use lectern_rate_limit::{Clock, ProviderSettings, RequestOptions, ResilientRequestClient};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

/// Adapter for the Gemini generateContent API.
///
/// Calls whose prompt exceeds the model's long-context threshold are
/// priced with its long-context multiplier.
#[derive(Debug, Clone)]
pub struct GeminiAdapter {
    client: ResilientRequestClient,
    api_key: Option<String>,
}

impl GeminiAdapter {
    /// Adapter over an existing client.
    pub fn new(client: ResilientRequestClient, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }

    /// Adapter from provider settings, reading the key from the environment.
    pub fn from_settings(
        settings: &ProviderSettings,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        let client = ResilientRequestClient::from_settings("gemini", settings, clock)?;
        Ok(Self::new(client, settings.api_key()))
    }

    /// Translate a normalized request into a generateContent body.
    pub fn build_body(
        record: &ModelRecord,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<Value, ProviderError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: prompt }],
            }],
            system_instruction: options.system_message.as_deref().map(|text| Content {
                role: None,
                parts: vec![Part { text }],
            }),
            generation_config: GenerationConfig {
                temperature: options.temperature,
                max_output_tokens: record.clamp_output(options.max_tokens),
            },
        };
        encode_body(&request)
    }

    /// Map a generateContent reply onto the normalized response.
    pub fn parse_response(record: &ModelRecord, body: &Value) -> Result<CompletionResponse, ProviderError> {
        let response: GenerateContentResponse =
            serde_json::from_value(body.clone()).map_err(|e| {
                ProviderError::new(ProviderErrorKind::InvalidResponse(format!(
                    "Gemini response: {}",
                    e
                )))
            })?;

        let candidate = response.candidates.into_iter().next().ok_or_else(|| {
            ProviderError::new(ProviderErrorKind::InvalidResponse(
                "Gemini response has no candidates".to_string(),
            ))
        })?;

        let content = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let usage = response.usage_metadata.unwrap_or_default();
        let token_usage = TokenUsage::new(usage.prompt_token_count, usage.candidates_token_count);

        Ok(CompletionResponse {
            content,
            token_usage,
            cost: record.pricing().long_context_cost(&token_usage),
            model: response.model_version.unwrap_or_else(|| record.id().clone()),
            finish_reason: Self::finish_reason(candidate.finish_reason.as_deref()),
        })
    }

    fn finish_reason(reason: Option<&str>) -> FinishReason {
        match reason {
            Some("STOP") => FinishReason::Stop,
            Some("MAX_TOKENS") => FinishReason::Length,
            Some("SAFETY") | Some("RECITATION") => FinishReason::ContentFilter,
            _ => FinishReason::Other,
        }
    }

    fn options(&self, base: RequestOptions) -> Result<RequestOptions, ProviderError> {
        let key = self.api_key.as_deref().ok_or_else(|| {
            ProviderError::new(ProviderErrorKind::Unavailable(
                "gemini: API key not configured".to_string(),
            ))
        })?;
        Ok(base.header("x-goog-api-key", key))
    }
}

#[async_trait]
impl CompletionAdapter for GeminiAdapter {
    fn family(&self) -> ProviderFamily {
        ProviderFamily::Gemini
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    #[instrument(skip(self, record, prompt, options), fields(model = %record.id()))]
    async fn complete(
        &self,
        record: &ModelRecord,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, ProviderError> {
        let request = self.options(RequestOptions::post(Self::build_body(record, prompt, options)?))?;
        debug!("Sending generateContent request");
        let endpoint = format!("models/{}:generateContent", record.id());
        let reply = self.client.send(&endpoint, &request).await?;
        Self::parse_response(record, &reply)
    }

    fn cost(&self, record: &ModelRecord, usage: &TokenUsage) -> f64 {
        record.pricing().long_context_cost(usage)
    }

    async fn probe(&self) -> Result<(), ProviderError> {
        let request = self.options(RequestOptions::get())?;
        self.client.send("models", &request).await.map(|_| ())
    }
}
