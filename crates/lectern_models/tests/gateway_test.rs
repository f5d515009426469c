//! Completion gateway dispatch, escalation and batching.

use async_trait::async_trait;
use lectern_core::{
    CompletionOptions, CompletionRequest, CompletionResponse, FinishReason, ModelRecord, Pricing,
    ProviderFamily, TokenUsage,
};
use lectern_error::{ProviderError, ProviderErrorKind};
use lectern_interface::CompletionAdapter;
use lectern_models::{CompletionGateway, ModelCatalog};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Adapter that fails for a fixed set of models and records every call.
struct ScriptedAdapter {
    family: ProviderFamily,
    configured: bool,
    failing: HashSet<String>,
    calls: Mutex<Vec<(String, Option<u32>)>>,
}

impl ScriptedAdapter {
    fn new(family: ProviderFamily) -> Self {
        Self {
            family,
            configured: true,
            failing: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing(mut self, model: &str) -> Self {
        self.failing.insert(model.to_string());
        self
    }

    fn unconfigured(mut self) -> Self {
        self.configured = false;
        self
    }

    fn calls(&self) -> Vec<(String, Option<u32>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionAdapter for ScriptedAdapter {
    fn family(&self) -> ProviderFamily {
        self.family
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn complete(
        &self,
        record: &ModelRecord,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, ProviderError> {
        self.calls
            .lock()
            .unwrap()
            .push((record.id().clone(), options.max_tokens));
        if self.failing.contains(record.id()) {
            return Err(ProviderError::classify(
                Some(503),
                format!("{} is down", record.id()),
            ));
        }
        let token_usage = TokenUsage::new(10, 5);
        Ok(CompletionResponse {
            content: format!("{} says: {}", record.id(), prompt),
            token_usage,
            cost: 0.0,
            model: record.id().clone(),
            finish_reason: FinishReason::Stop,
        })
    }

    fn cost(&self, _record: &ModelRecord, usage: &TokenUsage) -> f64 {
        usage.total as f64 / 100.0
    }

    async fn probe(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

fn catalog() -> Arc<ModelCatalog> {
    Arc::new(ModelCatalog::new([
        ModelRecord::new("primary", ProviderFamily::OpenAi, 1_000, 256, Pricing::default()),
        ModelRecord::new("backup", ProviderFamily::Anthropic, 1_000, 256, Pricing::default()),
        ModelRecord::new("gpt-named-but-gemini", ProviderFamily::Gemini, 1_000, 256, Pricing::default()),
    ]))
}

#[tokio::test]
async fn test_dispatch_uses_catalog_family() {
    let openai = Arc::new(ScriptedAdapter::new(ProviderFamily::OpenAi));
    let gemini = Arc::new(ScriptedAdapter::new(ProviderFamily::Gemini));
    let gateway = CompletionGateway::new(catalog())
        .with_adapter(openai.clone())
        .with_adapter(gemini.clone());

    let response = gateway
        .complete("hi", "gpt-named-but-gemini", &CompletionOptions::default())
        .await
        .unwrap();

    assert_eq!(response.model, "gpt-named-but-gemini");
    assert!(openai.calls().is_empty());
    assert_eq!(gemini.calls().len(), 1);
}

#[tokio::test]
async fn test_output_budget_is_clamped() {
    let openai = Arc::new(ScriptedAdapter::new(ProviderFamily::OpenAi));
    let gateway = CompletionGateway::new(catalog()).with_adapter(openai.clone());

    let options = CompletionOptions::builder().max_tokens(10_000u32).build().unwrap();
    gateway.complete("hi", "primary", &options).await.unwrap();
    gateway
        .complete("hi", "primary", &CompletionOptions::default())
        .await
        .unwrap();

    assert_eq!(
        openai.calls(),
        vec![("primary".to_string(), Some(256)), ("primary".to_string(), Some(256))]
    );
}

#[tokio::test]
async fn test_fallback_not_called_when_primary_succeeds() {
    let openai = Arc::new(ScriptedAdapter::new(ProviderFamily::OpenAi));
    let anthropic = Arc::new(ScriptedAdapter::new(ProviderFamily::Anthropic));
    let gateway = CompletionGateway::new(catalog())
        .with_adapter(openai.clone())
        .with_adapter(anthropic.clone());

    let response = gateway
        .complete_with_fallback("hi", "primary", "backup", &CompletionOptions::default())
        .await
        .unwrap();

    assert_eq!(response.model, "primary");
    assert!(anthropic.calls().is_empty());
}

#[tokio::test]
async fn test_fallback_attempted_exactly_once_after_primary_failure() {
    let openai = Arc::new(ScriptedAdapter::new(ProviderFamily::OpenAi).failing("primary"));
    let anthropic = Arc::new(ScriptedAdapter::new(ProviderFamily::Anthropic));
    let gateway = CompletionGateway::new(catalog())
        .with_adapter(openai.clone())
        .with_adapter(anthropic.clone());

    let response = gateway
        .complete_with_fallback("hi", "primary", "backup", &CompletionOptions::default())
        .await
        .unwrap();

    assert_eq!(response.model, "backup");
    assert_eq!(openai.calls().len(), 1);
    assert_eq!(anthropic.calls().len(), 1);
}

#[tokio::test]
async fn test_both_failing_raises_fallback_error() {
    let openai = Arc::new(ScriptedAdapter::new(ProviderFamily::OpenAi).failing("primary"));
    let anthropic = Arc::new(ScriptedAdapter::new(ProviderFamily::Anthropic).failing("backup"));
    let gateway = CompletionGateway::new(catalog())
        .with_adapter(openai)
        .with_adapter(anthropic.clone());

    let err = gateway
        .complete_with_fallback("hi", "primary", "backup", &CompletionOptions::default())
        .await
        .unwrap_err();

    assert_eq!(
        err.kind,
        ProviderErrorKind::Transient {
            status_code: Some(503),
            message: "backup is down".into()
        }
    );
    assert_eq!(anthropic.calls().len(), 1);
}

#[tokio::test]
async fn test_unknown_primary_still_escalates() {
    let anthropic = Arc::new(ScriptedAdapter::new(ProviderFamily::Anthropic));
    let gateway = CompletionGateway::new(catalog()).with_adapter(anthropic.clone());

    let response = gateway
        .complete_with_fallback("hi", "retired-model", "backup", &CompletionOptions::default())
        .await
        .unwrap();
    assert_eq!(response.model, "backup");
}

#[tokio::test]
async fn test_unconfigured_adapter_is_unavailable_and_never_called() {
    let openai = Arc::new(ScriptedAdapter::new(ProviderFamily::OpenAi).unconfigured());
    let gateway = CompletionGateway::new(catalog()).with_adapter(openai.clone());

    let err = gateway
        .complete("hi", "primary", &CompletionOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err.kind, ProviderErrorKind::Unavailable(_)));
    assert!(openai.calls().is_empty());
    assert!(!gateway.is_available("primary"));
}

#[tokio::test]
async fn test_batch_rejects_whole_batch_on_unconfigured_model() {
    let openai = Arc::new(ScriptedAdapter::new(ProviderFamily::OpenAi));
    let anthropic = Arc::new(ScriptedAdapter::new(ProviderFamily::Anthropic));
    let gateway = CompletionGateway::new(catalog())
        .with_adapter(openai)
        .with_adapter(anthropic);

    let requests = vec![
        CompletionRequest::new("a", "primary"),
        CompletionRequest::new("b", "not-in-catalog"),
        CompletionRequest::new("c", "backup"),
    ];

    let err = gateway.batch_complete(&requests).await.unwrap_err();
    assert_eq!(err.kind, ProviderErrorKind::UnknownModel("not-in-catalog".into()));
}

#[tokio::test]
async fn test_batch_returns_responses_in_request_order() {
    let openai = Arc::new(ScriptedAdapter::new(ProviderFamily::OpenAi));
    let anthropic = Arc::new(ScriptedAdapter::new(ProviderFamily::Anthropic));
    let gateway = CompletionGateway::new(catalog())
        .with_adapter(openai)
        .with_adapter(anthropic);

    let requests = vec![
        CompletionRequest::new("a", "backup"),
        CompletionRequest::new("b", "primary"),
    ];
    let responses = gateway.batch_complete(&requests).await.unwrap();

    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0].content, "backup says: a");
    assert_eq!(responses[1].content, "primary says: b");
}

#[tokio::test]
async fn test_settled_batch_keeps_partial_results() {
    let openai = Arc::new(ScriptedAdapter::new(ProviderFamily::OpenAi));
    let gateway = CompletionGateway::new(catalog()).with_adapter(openai);

    let requests = vec![
        CompletionRequest::new("a", "primary"),
        CompletionRequest::new("b", "gpt-named-but-gemini"),
        CompletionRequest::new("c", "primary"),
    ];
    let results = gateway.batch_complete_settled(&requests).await;

    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(matches!(
        results[1].as_ref().unwrap_err().kind,
        ProviderErrorKind::Unavailable(_)
    ));
    assert!(results[2].is_ok());
}

#[tokio::test]
async fn test_health_probes_one_per_family() {
    let gateway = CompletionGateway::new(catalog())
        .with_adapter(Arc::new(ScriptedAdapter::new(ProviderFamily::Gemini)))
        .with_adapter(Arc::new(ScriptedAdapter::new(ProviderFamily::OpenAi).unconfigured()));

    let probes = gateway.health_probes();
    let names: Vec<_> = probes.iter().map(|p| p.name().to_string()).collect();
    assert_eq!(names, vec!["openai", "gemini"]);

    assert!(probes[0].probe().await.is_err());
    assert!(probes[1].probe().await.is_ok());
}

#[tokio::test]
async fn test_responses_are_priced_by_the_adapter() {
    let gateway = CompletionGateway::new(catalog())
        .with_adapter(Arc::new(ScriptedAdapter::new(ProviderFamily::OpenAi)));

    let response = gateway
        .complete("hi", "primary", &CompletionOptions::default())
        .await
        .unwrap();

    assert_eq!(response.token_usage.total, 15);
    assert!((response.cost - 0.15).abs() < 1e-12);
}
