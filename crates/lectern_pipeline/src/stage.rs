//! The stage seam.

use crate::GenerationContext;
use async_trait::async_trait;
use lectern_error::PipelineError;

/// One named unit of work.
///
/// A stage receives the context by value and returns the next one. The
/// returned artifacts must include every artifact it was given; the
/// engine fails the stage otherwise.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Stage name, also used to pick the pipeline state.
    fn name(&self) -> &str;

    /// Human-readable summary of what the stage produces.
    fn description(&self) -> &str;

    /// Transform the context.
    async fn execute(&self, context: GenerationContext) -> Result<GenerationContext, PipelineError>;
}
