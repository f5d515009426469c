//! Workbook stages.

mod workbook;

pub use workbook::{
    AssemblyStage, DomainInferenceStage, ExportStage, PromptStage, SectionDraftStage,
    VisualsStage, workbook_stages,
};

use crate::GenerationConfig;
use lectern_error::{PipelineError, PipelineErrorKind};
use lectern_interface::{PromptBuilder, parse_reply};
use lectern_models::CompletionGateway;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Model access shared by the model-backed stages.
#[derive(Clone)]
pub struct StageServices {
    gateway: Arc<CompletionGateway>,
    prompts: Arc<dyn PromptBuilder>,
}

impl std::fmt::Debug for StageServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageServices")
            .field("gateway", &self.gateway)
            .finish_non_exhaustive()
    }
}

impl StageServices {
    /// Services over a gateway and prompt builder.
    pub fn new(gateway: Arc<CompletionGateway>, prompts: Arc<dyn PromptBuilder>) -> Self {
        Self { gateway, prompts }
    }

    /// Prompt the configured models for `stage` and parse the JSON reply.
    ///
    /// The primary model is tried first and the fallback once. A failure of
    /// both becomes [`PipelineErrorKind::StageFailed`] carrying the
    /// fallback's message.
    pub async fn ask(
        &self,
        stage: &str,
        params: &Value,
        config: &GenerationConfig,
    ) -> Result<Value, PipelineError> {
        let prompt = self.prompts.stage_prompt(stage, params);
        let response = self
            .gateway
            .complete_with_fallback(
                &prompt,
                config.primary_model(),
                config.fallback_model(),
                &config.options(),
            )
            .await
            .map_err(|e| {
                PipelineError::new(PipelineErrorKind::StageFailed {
                    stage: stage.to_string(),
                    message: e.kind.to_string(),
                })
            })?;
        debug!(
            stage,
            model = %response.model,
            cost = response.cost,
            "Stage reply received"
        );
        Ok(parse_reply(&response.content))
    }
}
