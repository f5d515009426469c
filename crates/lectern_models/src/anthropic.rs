//! Anthropic messages adapter.

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

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    model: Option<String>,
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

/// Adapter for the Anthropic messages API.
#[derive(Debug, Clone)]
pub struct AnthropicAdapter {
    client: ResilientRequestClient,
    api_key: Option<String>,
}

impl AnthropicAdapter {
    /// Adapter over an existing client.
    pub fn new(client: ResilientRequestClient, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }

    /// Adapter from provider settings, reading the key from the environment.
    pub fn from_settings(
        settings: &ProviderSettings,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        let client = ResilientRequestClient::from_settings("anthropic", settings, clock)?;
        Ok(Self::new(client, settings.api_key()))
    }

    /// Translate a normalized request into a messages body.
    ///
    /// `max_tokens` is mandatory for this API, so an unset budget becomes
    /// the model's output limit.
    pub fn build_body(
        record: &ModelRecord,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<Value, ProviderError> {
        let request = MessagesRequest {
            model: record.id(),
            max_tokens: record.clamp_output(options.max_tokens),
            system: options.system_message.as_deref(),
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            temperature: options.temperature,
        };
        encode_body(&request)
    }

    /// Map a messages reply onto the normalized response.
    pub fn parse_response(record: &ModelRecord, body: &Value) -> Result<CompletionResponse, ProviderError> {
        let response: MessagesResponse = serde_json::from_value(body.clone()).map_err(|e| {
            ProviderError::new(ProviderErrorKind::InvalidResponse(format!(
                "Anthropic response: {}",
                e
            )))
        })?;

        let content = response
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");

        let token_usage = TokenUsage::new(response.usage.input_tokens, response.usage.output_tokens);

        Ok(CompletionResponse {
            content,
            token_usage,
            cost: record.pricing().cost(&token_usage),
            model: response.model.unwrap_or_else(|| record.id().clone()),
            finish_reason: Self::finish_reason(response.stop_reason.as_deref()),
        })
    }

    fn finish_reason(reason: Option<&str>) -> FinishReason {
        match reason {
            Some("end_turn") => FinishReason::Stop,
            Some("max_tokens") => FinishReason::Length,
            Some("stop_sequence") => FinishReason::StopSequence,
            Some("tool_use") => FinishReason::ToolUse,
            _ => FinishReason::Other,
        }
    }

    fn options(&self, base: RequestOptions) -> Result<RequestOptions, ProviderError> {
        let key = self.api_key.as_deref().ok_or_else(|| {
            ProviderError::new(ProviderErrorKind::Unavailable(
                "anthropic: API key not configured".to_string(),
            ))
        })?;
        Ok(base
            .header("x-api-key", key)
            .header("anthropic-version", ANTHROPIC_VERSION))
    }
}

#[async_trait]
impl CompletionAdapter for AnthropicAdapter {
    fn family(&self) -> ProviderFamily {
        ProviderFamily::Anthropic
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
        debug!("Sending messages request");
        let reply = self.client.send("messages", &request).await?;
        Self::parse_response(record, &reply)
    }

    async fn probe(&self) -> Result<(), ProviderError> {
        let request = self.options(RequestOptions::get())?;
        self.client.send("models", &request).await.map(|_| ())
    }
}
