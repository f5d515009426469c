//! Sequential stage runner.

use crate::{GenerationConfig, GenerationContext, Pipeline, PipelineState, Stage};
use lectern_core::WorkbookRequest;
use lectern_error::ValidationError;
use lectern_rate_limit::{Clock, PipelineSettings};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// Runs a fixed list of stages strictly in order.
///
/// Any stage failure stops the run; the failed stage's index is kept so
/// [`PipelineEngine::resume`] can pick up from there.
///
/// # Example
///
/// ```rust,ignore
/// let engine = PipelineEngine::new(stages, GenerationConfig::from(&settings), clock);
/// let pipeline = engine.start(request).await?;
/// if let Some(error) = pipeline.error() {
///     eprintln!("stopped at step {}: {}", pipeline.current_step_index(), error);
/// }
/// ```
pub struct PipelineEngine {
    stages: Vec<Arc<dyn Stage>>,
    config: GenerationConfig,
    clock: Arc<dyn Clock>,
    stage_delay: Duration,
}

impl std::fmt::Debug for PipelineEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineEngine")
            .field("stages", &self.stages.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("config", &self.config)
            .field("stage_delay", &self.stage_delay)
            .finish()
    }
}

impl PipelineEngine {
    /// Engine over `stages` with the default 500ms throttle.
    pub fn new(stages: Vec<Arc<dyn Stage>>, config: GenerationConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            stages,
            config,
            clock,
            stage_delay: Duration::from_millis(500),
        }
    }

    /// Engine configured from the `[pipeline]` section.
    pub fn from_settings(
        stages: Vec<Arc<dyn Stage>>,
        settings: &PipelineSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new(stages, GenerationConfig::from(settings), clock)
            .with_stage_delay(Duration::from_millis(settings.stage_delay_ms))
    }

    /// Set the pause between stages.
    pub fn with_stage_delay(mut self, stage_delay: Duration) -> Self {
        self.stage_delay = stage_delay;
        self
    }

    /// Stage names in order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Build a pipeline for `input` without running it.
    pub fn prepare(&self, input: WorkbookRequest) -> Result<Pipeline, ValidationError> {
        input.validate()?;
        let context = GenerationContext::new(input, self.config.clone());
        Ok(Pipeline::new(self.stages.clone(), context))
    }

    /// Build a pipeline for `input` and run it to completion or failure.
    ///
    /// # Errors
    ///
    /// Only invalid input is an error. Stage failures are recorded on the
    /// returned pipeline.
    #[instrument(skip(self, input), fields(subject = %input.subject(), topic = %input.topic()))]
    pub async fn start(&self, input: WorkbookRequest) -> Result<Pipeline, ValidationError> {
        let mut pipeline = self.prepare(input)?;
        info!(pipeline_id = %pipeline.id(), steps = pipeline.steps().len(), "Starting pipeline");
        self.execute(&mut pipeline).await;
        Ok(pipeline)
    }

    /// Run stages from the current index until done or a stage fails.
    #[instrument(skip(self, pipeline), fields(pipeline_id = %pipeline.id()))]
    pub async fn execute(&self, pipeline: &mut Pipeline) {
        while let Some(stage) = pipeline.current_stage().cloned() {
            let index = *pipeline.current_step_index();
            pipeline.enter(PipelineState::for_stage(stage.name()));
            debug!(stage = stage.name(), index, state = %pipeline.state(), "Running stage");

            let before = pipeline.context().clone();
            let result = stage.execute(before).await.and_then(|next| {
                next.artifacts
                    .ensure_superset_of(&pipeline.context().artifacts, stage.name())
                    .map(|_| next)
            });

            match result {
                Ok(next) => {
                    pipeline.advance(next);
                    info!(stage = stage.name(), index, "Stage complete");
                    if pipeline.current_stage().is_some() && !self.stage_delay.is_zero() {
                        self.clock.sleep(self.stage_delay).await;
                    }
                }
                Err(e) => {
                    error!(stage = stage.name(), index, error = %e, "Stage failed");
                    pipeline.fail(e.kind.to_string());
                    return;
                }
            }
        }

        pipeline.complete();
        info!(artifacts = pipeline.context().artifacts.len(), "Pipeline complete");
    }

    /// Continue a pipeline from its current index.
    ///
    /// Completed pipelines are left untouched. An errored pipeline has its
    /// error cleared and re-runs the stage that failed.
    #[instrument(skip(self, pipeline), fields(pipeline_id = %pipeline.id()))]
    pub async fn resume(&self, pipeline: &mut Pipeline) {
        if pipeline.is_complete() {
            debug!("Pipeline already complete");
            return;
        }
        info!(from_step = *pipeline.current_step_index(), "Resuming pipeline");
        pipeline.clear_error();
        self.execute(pipeline).await;
    }
}
