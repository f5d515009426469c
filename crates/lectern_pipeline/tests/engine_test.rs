//! Engine ordering, failure, resume and throttling.

use async_trait::async_trait;
use lectern_core::WorkbookRequest;
use lectern_error::{PipelineError, PipelineErrorKind, ValidationErrorKind};
use lectern_pipeline::{GenerationConfig, GenerationContext, PipelineEngine, PipelineState, Stage};
use lectern_rate_limit::TokioClock;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;

const STAGES: [&str; 10] = [
    "domain_inference",
    "learning_objectives",
    "outline",
    "section_plan",
    "section_draft",
    "exercises",
    "visuals",
    "review",
    "assembly",
    "export",
];

/// Adds one artifact named after itself; fails its first `failures` runs.
struct ScriptedStage {
    name: &'static str,
    failures: usize,
    runs: AtomicUsize,
}

impl ScriptedStage {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            failures: 0,
            runs: AtomicUsize::new(0),
        }
    }

    fn failing(name: &'static str, failures: usize) -> Self {
        Self {
            failures,
            ..Self::new(name)
        }
    }

    fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Stage for ScriptedStage {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "scripted"
    }

    async fn execute(&self, mut context: GenerationContext) -> Result<GenerationContext, PipelineError> {
        let run = self.runs.fetch_add(1, Ordering::SeqCst);
        if run < self.failures {
            return Err(PipelineError::new(PipelineErrorKind::StageFailed {
                stage: self.name.to_string(),
                message: "Timeout".to_string(),
            }));
        }
        context.artifacts.insert(self.name, json!({ "stage": self.name }))?;
        Ok(context)
    }
}

/// Returns a fresh context, dropping everything produced so far.
struct ForgetfulStage;

#[async_trait]
impl Stage for ForgetfulStage {
    fn name(&self) -> &str {
        "review"
    }

    fn description(&self) -> &str {
        "drops artifacts"
    }

    async fn execute(&self, context: GenerationContext) -> Result<GenerationContext, PipelineError> {
        Ok(GenerationContext::new(context.input, context.config))
    }
}

/// Swaps in a new artifact map where `outline` has become a string.
struct RetypingStage;

#[async_trait]
impl Stage for RetypingStage {
    fn name(&self) -> &str {
        "section_plan"
    }

    fn description(&self) -> &str {
        "retypes artifacts"
    }

    async fn execute(&self, mut context: GenerationContext) -> Result<GenerationContext, PipelineError> {
        context.artifacts = serde_json::from_value(json!({ "outline": "now a string" }))
            .map_err(|e| {
                PipelineError::new(PipelineErrorKind::StageFailed {
                    stage: "section_plan".to_string(),
                    message: e.to_string(),
                })
            })?;
        Ok(context)
    }
}

fn request() -> WorkbookRequest {
    WorkbookRequest::builder()
        .subject("Science")
        .topic("Photosynthesis")
        .grade_level("5")
        .build()
        .unwrap()
}

fn engine(stages: Vec<Arc<dyn Stage>>) -> PipelineEngine {
    PipelineEngine::new(stages, GenerationConfig::new("primary", "backup"), Arc::new(TokioClock))
        .with_stage_delay(Duration::ZERO)
}

fn scripted(fail_at: Option<usize>) -> Vec<Arc<ScriptedStage>> {
    STAGES
        .iter()
        .enumerate()
        .map(|(index, &name)| match fail_at {
            Some(k) if k == index => Arc::new(ScriptedStage::failing(name, 1)),
            _ => Arc::new(ScriptedStage::new(name)),
        })
        .collect()
}

fn as_stages(stages: &[Arc<ScriptedStage>]) -> Vec<Arc<dyn Stage>> {
    stages.iter().map(|s| s.clone() as Arc<dyn Stage>).collect()
}

#[tokio::test]
async fn test_successful_pipeline_runs_every_stage() {
    let stages = scripted(None);
    let pipeline = engine(as_stages(&stages)).start(request()).await.unwrap();

    assert_eq!(*pipeline.state(), PipelineState::Complete);
    assert_eq!(*pipeline.current_step_index(), STAGES.len());
    assert!(pipeline.error().is_none());
    assert!(pipeline.completed_at().is_some());
    assert_eq!(pipeline.context().artifacts.len(), STAGES.len());
    assert!(stages.iter().all(|s| s.runs() == 1));
}

#[tokio::test]
async fn test_failure_at_section_draft_stops_pipeline() {
    let stages = scripted(Some(4));
    let pipeline = engine(as_stages(&stages)).start(request()).await.unwrap();

    assert_eq!(*pipeline.state(), PipelineState::Error);
    assert_eq!(pipeline.error().as_deref(), Some("Timeout"));
    assert_eq!(*pipeline.current_step_index(), 4);
    assert_eq!(
        pipeline.context().artifacts.names(),
        vec!["domain_inference", "learning_objectives", "outline", "section_plan"]
    );
    assert!(pipeline.completed_at().is_none());
    assert!(stages[5..].iter().all(|s| s.runs() == 0));

    let summary = pipeline.summary();
    assert_eq!(summary.failed_stage.as_deref(), Some("section_draft"));
    assert_eq!(summary.total_steps, 10);
}

#[tokio::test]
async fn test_resume_continues_from_failed_stage() {
    let stages = scripted(Some(4));
    let engine = engine(as_stages(&stages));
    let mut pipeline = engine.start(request()).await.unwrap();
    assert_eq!(*pipeline.state(), PipelineState::Error);

    engine.resume(&mut pipeline).await;

    assert_eq!(*pipeline.state(), PipelineState::Complete);
    assert!(pipeline.error().is_none());
    assert_eq!(*pipeline.current_step_index(), STAGES.len());
    assert!(stages[..4].iter().all(|s| s.runs() == 1));
    assert_eq!(stages[4].runs(), 2);
}

#[tokio::test]
async fn test_resume_on_complete_pipeline_is_a_no_op() {
    let stages = scripted(None);
    let engine = engine(as_stages(&stages));
    let mut pipeline = engine.start(request()).await.unwrap();
    let completed_at = *pipeline.completed_at();

    engine.resume(&mut pipeline).await;

    assert_eq!(*pipeline.completed_at(), completed_at);
    assert!(stages.iter().all(|s| s.runs() == 1));
}

#[tokio::test]
async fn test_dropping_artifacts_fails_the_stage() {
    let stages: Vec<Arc<dyn Stage>> = vec![
        Arc::new(ScriptedStage::new("outline")),
        Arc::new(ForgetfulStage),
        Arc::new(ScriptedStage::new("assembly")),
    ];
    let pipeline = engine(stages).start(request()).await.unwrap();

    assert_eq!(*pipeline.state(), PipelineState::Error);
    assert_eq!(*pipeline.current_step_index(), 1);
    assert_eq!(
        pipeline.error().as_deref(),
        Some("Stage 'review' dropped artifact 'outline'")
    );
    assert_eq!(pipeline.context().artifacts.names(), vec!["outline"]);
}

#[tokio::test]
async fn test_retyping_an_artifact_fails_the_stage() {
    let stages: Vec<Arc<dyn Stage>> = vec![
        Arc::new(ScriptedStage::new("outline")),
        Arc::new(RetypingStage),
        Arc::new(ScriptedStage::new("assembly")),
    ];
    let pipeline = engine(stages).start(request()).await.unwrap();

    assert_eq!(*pipeline.state(), PipelineState::Error);
    assert_eq!(*pipeline.current_step_index(), 1);
    assert_eq!(
        pipeline.error().as_deref(),
        Some("Artifact 'outline' already holds object and cannot become string")
    );
    assert_eq!(
        pipeline.context().artifacts.get("outline"),
        Some(&json!({ "stage": "outline" }))
    );
}

#[tokio::test]
async fn test_unmapped_stage_runs_in_init_state() {
    let stages: Vec<Arc<dyn Stage>> = vec![Arc::new(ScriptedStage::failing("translate", 1))];
    let pipeline = engine(stages).start(request()).await.unwrap();
    // The failure replaces the stage state, so check via the summary.
    assert_eq!(pipeline.summary().failed_stage.as_deref(), Some("translate"));
    assert_eq!(PipelineState::for_stage("translate"), PipelineState::Init);
}

#[tokio::test]
async fn test_invalid_input_is_rejected_before_any_stage() {
    let stages = scripted(None);
    let input = WorkbookRequest::builder()
        .subject("Science")
        .topic("Photosynthesis")
        .grade_level("5")
        .section_count(0u32)
        .build()
        .unwrap();

    let err = engine(as_stages(&stages)).start(input).await.unwrap_err();
    assert!(matches!(err.kind, ValidationErrorKind::InvalidField { .. }));
    assert!(stages.iter().all(|s| s.runs() == 0));
}

#[tokio::test(start_paused = true)]
async fn test_stages_are_throttled_between_runs() {
    let stages = scripted(None);
    let engine = PipelineEngine::new(
        as_stages(&stages[..3]),
        GenerationConfig::new("primary", "backup"),
        Arc::new(TokioClock),
    )
    .with_stage_delay(Duration::from_millis(500));

    let started = Instant::now();
    let pipeline = engine.start(request()).await.unwrap();

    assert!(pipeline.is_complete());
    // No pause after the last stage.
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(1_000));
    assert!(elapsed < Duration::from_millis(1_500));
}
