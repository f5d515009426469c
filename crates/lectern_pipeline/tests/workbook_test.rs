//! The ten workbook stages over a scripted gateway.

use async_trait::async_trait;
use lectern_core::{
    CompletionOptions, CompletionResponse, FinishReason, ModelRecord, Pricing, ProviderFamily,
    TokenUsage, WorkbookRequest,
};
use lectern_error::{PipelineError, ProviderError};
use lectern_interface::{CompletionAdapter, DocumentSink, TemplatePromptBuilder};
use lectern_models::{CompletionGateway, ModelCatalog};
use lectern_pipeline::{
    GenerationConfig, PipelineEngine, PipelineState, StageServices, workbook_stages,
};
use lectern_rate_limit::TokioClock;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Replies with one JSON document that satisfies every stage.
struct ScriptedAdapter {
    family: ProviderFamily,
    fail: bool,
    calls: AtomicUsize,
}

impl ScriptedAdapter {
    fn new(family: ProviderFamily, fail: bool) -> Self {
        Self {
            family,
            fail,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CompletionAdapter for ScriptedAdapter {
    fn family(&self) -> ProviderFamily {
        self.family
    }

    async fn complete(
        &self,
        record: &ModelRecord,
        _prompt: &str,
        _options: &CompletionOptions,
    ) -> Result<CompletionResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::classify(Some(503), format!("{} is down", record.id())));
        }
        let reply = json!({
            "domain": "biology",
            "grade_band": "3-5",
            "objectives": ["Explain how plants make food"],
            "sections": [{"title": "Light"}, {"title": "Water"}],
            "plans": [{"title": "Light", "key_points": ["chlorophyll"]}],
            "title": "Light",
            "body": "Plants use sunlight.",
            "exercises": [{"prompt": "What do leaves need?", "answer": "Light"}],
            "visuals": [{"caption": "Leaf", "description": "A green leaf"}],
            "approved": true,
            "notes": []
        });
        Ok(CompletionResponse {
            content: format!("```json\n{}\n```", reply),
            token_usage: TokenUsage::new(10, 10),
            cost: 0.0,
            model: record.id().clone(),
            finish_reason: FinishReason::Stop,
        })
    }

    async fn probe(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

#[derive(Default)]
struct RecordingSink {
    exported: Mutex<Vec<Value>>,
}

#[async_trait]
impl DocumentSink for RecordingSink {
    async fn export(&self, workbook: &Value) -> Result<String, PipelineError> {
        self.exported.lock().unwrap().push(workbook.clone());
        Ok("memory://workbook".to_string())
    }
}

struct Harness {
    engine: PipelineEngine,
    primary: Arc<ScriptedAdapter>,
    fallback: Arc<ScriptedAdapter>,
    sink: Arc<RecordingSink>,
}

fn harness(primary_fails: bool, fallback_fails: bool) -> Harness {
    let catalog = Arc::new(ModelCatalog::new([
        ModelRecord::new("primary", ProviderFamily::OpenAi, 10_000, 1_000, Pricing::default()),
        ModelRecord::new("backup", ProviderFamily::Anthropic, 10_000, 1_000, Pricing::default()),
    ]));
    let primary = Arc::new(ScriptedAdapter::new(ProviderFamily::OpenAi, primary_fails));
    let fallback = Arc::new(ScriptedAdapter::new(ProviderFamily::Anthropic, fallback_fails));
    let gateway = Arc::new(
        CompletionGateway::new(catalog)
            .with_adapter(primary.clone())
            .with_adapter(fallback.clone()),
    );
    let sink = Arc::new(RecordingSink::default());
    let stages = workbook_stages(
        StageServices::new(gateway, Arc::new(TemplatePromptBuilder)),
        sink.clone(),
    );
    let engine = PipelineEngine::new(
        stages,
        GenerationConfig::new("primary", "backup"),
        Arc::new(TokioClock),
    )
    .with_stage_delay(Duration::ZERO);
    Harness {
        engine,
        primary,
        fallback,
        sink,
    }
}

fn request(include_visuals: bool) -> WorkbookRequest {
    WorkbookRequest::builder()
        .subject("Science")
        .topic("Photosynthesis")
        .grade_level("4")
        .section_count(3u32)
        .include_visuals(include_visuals)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_workbook_pipeline_completes_and_exports() {
    let harness = harness(false, false);
    let pipeline = harness.engine.start(request(true)).await.unwrap();

    assert_eq!(*pipeline.state(), PipelineState::Complete);
    assert_eq!(
        pipeline.step_names(),
        vec![
            "domain_inference",
            "learning_objectives",
            "outline",
            "section_plan",
            "section_draft",
            "exercises",
            "visuals",
            "review",
            "assembly",
            "export"
        ]
    );

    let context = pipeline.context();
    assert_eq!(context.state.get("domain"), Some(&json!("biology")));
    assert_eq!(context.artifacts.len(), 10);
    assert_eq!(
        context.artifacts.get("export"),
        Some(&json!({"location": "memory://workbook"}))
    );
    assert_eq!(context.artifacts.get("visuals").unwrap().as_array().unwrap().len(), 1);

    let exported = harness.sink.exported.lock().unwrap();
    assert_eq!(exported.len(), 1);
    assert_eq!(exported[0]["title"], "Photosynthesis: Science Workbook");
    assert_eq!(exported[0]["sections"].as_array().unwrap().len(), 3);
    assert_eq!(exported[0]["domain"], "biology");

    // Seven single-call stages plus one call per section.
    assert_eq!(harness.primary.calls.load(Ordering::SeqCst), 7 + 3);
    assert_eq!(harness.fallback.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_visuals_stage_skips_the_model_when_not_requested() {
    let harness = harness(false, false);
    let pipeline = harness.engine.start(request(false)).await.unwrap();

    assert!(pipeline.is_complete());
    assert_eq!(pipeline.context().artifacts.get("visuals"), Some(&json!([])));
    assert_eq!(harness.primary.calls.load(Ordering::SeqCst), 6 + 3);
}

#[tokio::test]
async fn test_primary_failure_escalates_every_call_to_fallback() {
    let harness = harness(true, false);
    let pipeline = harness.engine.start(request(false)).await.unwrap();

    assert!(pipeline.is_complete());
    let primary_calls = harness.primary.calls.load(Ordering::SeqCst);
    assert_eq!(primary_calls, 9);
    assert_eq!(harness.fallback.calls.load(Ordering::SeqCst), primary_calls);
}

#[tokio::test]
async fn test_both_models_failing_stops_at_first_stage() {
    let harness = harness(true, true);
    let pipeline = harness.engine.start(request(false)).await.unwrap();

    assert_eq!(*pipeline.state(), PipelineState::Error);
    assert_eq!(*pipeline.current_step_index(), 0);
    assert_eq!(
        pipeline.error().as_deref(),
        Some("Transient failure: backup is down")
    );
    assert!(pipeline.context().artifacts.is_empty());
    assert!(harness.sink.exported.lock().unwrap().is_empty());
}
