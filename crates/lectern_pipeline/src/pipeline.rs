//! One pipeline run.

use crate::{GenerationContext, PipelineState, Stage};
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// A pipeline run: fixed stages, progress, and the context they share.
///
/// `current_step_index` only grows and never exceeds the number of steps.
/// After a failure it points at the stage that failed.
#[derive(Clone, Getters)]
pub struct Pipeline {
    id: Uuid,
    steps: Vec<Arc<dyn Stage>>,
    current_step_index: usize,
    state: PipelineState,
    context: GenerationContext,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    error: Option<String>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("id", &self.id)
            .field("steps", &self.step_names())
            .field("current_step_index", &self.current_step_index)
            .field("state", &self.state)
            .field("error", &self.error)
            .finish()
    }
}

impl Pipeline {
    /// Pipeline at step 0 in `Init`.
    pub fn new(steps: Vec<Arc<dyn Stage>>, context: GenerationContext) -> Self {
        Self {
            id: Uuid::new_v4(),
            steps,
            current_step_index: 0,
            state: PipelineState::Init,
            context,
            started_at: Utc::now(),
            completed_at: None,
            error: None,
        }
    }

    /// Stage names in execution order.
    pub fn step_names(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.name().to_string()).collect()
    }

    /// The stage at the current index, if any remain.
    pub fn current_stage(&self) -> Option<&Arc<dyn Stage>> {
        self.steps.get(self.current_step_index)
    }

    /// Whether every stage ran.
    pub fn is_complete(&self) -> bool {
        self.state == PipelineState::Complete
    }

    /// Snapshot for transport callers.
    pub fn summary(&self) -> PipelineSummary {
        let failed_stage = match self.state {
            PipelineState::Error => self.current_stage().map(|s| s.name().to_string()),
            _ => None,
        };
        let end = self.completed_at.unwrap_or_else(Utc::now);
        PipelineSummary {
            id: self.id,
            state: self.state,
            current_step_index: self.current_step_index,
            total_steps: self.steps.len(),
            failed_stage,
            error: self.error.clone(),
            artifacts: self.context.artifacts.names(),
            elapsed_ms: (end - self.started_at).num_milliseconds().max(0),
        }
    }

    pub(crate) fn enter(&mut self, state: PipelineState) {
        self.state = state;
    }

    pub(crate) fn advance(&mut self, context: GenerationContext) {
        self.context = context;
        self.current_step_index = (self.current_step_index + 1).min(self.steps.len());
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.state = PipelineState::Error;
        self.error = Some(message);
    }

    pub(crate) fn complete(&mut self) {
        self.state = PipelineState::Complete;
        self.completed_at = Some(Utc::now());
    }

    pub(crate) fn clear_error(&mut self) {
        self.error = None;
    }
}

/// Serializable view of a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineSummary {
    /// Pipeline id
    pub id: Uuid,
    /// Current state
    pub state: PipelineState,
    /// Index of the next (or failed) stage
    pub current_step_index: usize,
    /// Number of stages
    pub total_steps: usize,
    /// Name of the stage that failed
    pub failed_stage: Option<String>,
    /// Failure message
    pub error: Option<String>,
    /// Produced artifact names
    pub artifacts: Vec<String>,
    /// Milliseconds from start to completion, or to now
    pub elapsed_ms: i64,
}
