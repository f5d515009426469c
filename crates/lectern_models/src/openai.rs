//! OpenAI chat completions adapter.

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
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

/// Adapter for OpenAI-compatible chat completion endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiAdapter {
    client: ResilientRequestClient,
    api_key: Option<String>,
}

impl OpenAiAdapter {
    /// Adapter over an existing client.
    pub fn new(client: ResilientRequestClient, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }

    /// Adapter from provider settings, reading the key from the environment.
    pub fn from_settings(
        settings: &ProviderSettings,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        let client = ResilientRequestClient::from_settings("openai", settings, clock)?;
        Ok(Self::new(client, settings.api_key()))
    }

    /// Translate a normalized request into a chat completion body.
    pub fn build_body(
        record: &ModelRecord,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<Value, ProviderError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = options.system_message.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let request = ChatRequest {
            model: record.id(),
            messages,
            temperature: options.temperature,
            max_tokens: record.clamp_output(options.max_tokens),
        };
        encode_body(&request)
    }

    /// Map a chat completion reply onto the normalized response.
    pub fn parse_response(record: &ModelRecord, body: &Value) -> Result<CompletionResponse, ProviderError> {
        let response: ChatResponse = serde_json::from_value(body.clone()).map_err(|e| {
            ProviderError::new(ProviderErrorKind::InvalidResponse(format!(
                "OpenAI response: {}",
                e
            )))
        })?;

        let choice = response.choices.into_iter().next().ok_or_else(|| {
            ProviderError::new(ProviderErrorKind::InvalidResponse(
                "OpenAI response has no choices".to_string(),
            ))
        })?;

        let usage = response.usage.unwrap_or_default();
        let token_usage = TokenUsage::new(usage.prompt_tokens, usage.completion_tokens);

        Ok(CompletionResponse {
            content: choice.message.content.unwrap_or_default(),
            token_usage,
            cost: record.pricing().cost(&token_usage),
            model: response.model.unwrap_or_else(|| record.id().clone()),
            finish_reason: Self::finish_reason(choice.finish_reason.as_deref()),
        })
    }

    fn finish_reason(reason: Option<&str>) -> FinishReason {
        match reason {
            Some("stop") => FinishReason::Stop,
            Some("length") => FinishReason::Length,
            Some("content_filter") => FinishReason::ContentFilter,
            Some("tool_calls") | Some("function_call") => FinishReason::ToolUse,
            _ => FinishReason::Other,
        }
    }

    fn key(&self) -> Result<&str, ProviderError> {
        self.api_key.as_deref().ok_or_else(|| {
            ProviderError::new(ProviderErrorKind::Unavailable(
                "openai: API key not configured".to_string(),
            ))
        })
    }
}

#[async_trait]
impl CompletionAdapter for OpenAiAdapter {
    fn family(&self) -> ProviderFamily {
        ProviderFamily::OpenAi
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
        let key = self.key()?;
        let body = Self::build_body(record, prompt, options)?;
        debug!("Sending chat completion");
        let reply = self
            .client
            .send(
                "chat/completions",
                &RequestOptions::post(body).header("authorization", format!("Bearer {}", key)),
            )
            .await?;
        Self::parse_response(record, &reply)
    }

    async fn probe(&self) -> Result<(), ProviderError> {
        let key = self.key()?;
        self.client
            .send(
                "models",
                &RequestOptions::get().header("authorization", format!("Bearer {}", key)),
            )
            .await
            .map(|_| ())
    }
}
