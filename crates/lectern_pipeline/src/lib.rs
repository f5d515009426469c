//! Staged workbook generation.
//!
//! A [`Pipeline`] runs a fixed, ordered list of [`Stage`]s over a shared
//! [`GenerationContext`]. Stages run strictly one after another; the first
//! failure stops the run and leaves the produced artifacts in place for
//! inspection or [`PipelineEngine::resume`].
//!
//! # Example
//!
//! ```rust,ignore
//! use lectern_pipeline::{PipelineEngine, StageServices, workbook_stages};
//!
//! let stages = workbook_stages(StageServices::new(gateway, prompts), sink);
//! let engine = PipelineEngine::from_settings(stages, &config.pipeline, clock);
//! let pipeline = engine.start(request).await?;
//! println!("{:?}", pipeline.summary());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod context;
mod engine;
mod pipeline;
mod stage;
mod stages;
mod state;

pub use context::{Artifacts, GenerationConfig, GenerationContext};
pub use engine::PipelineEngine;
pub use pipeline::{Pipeline, PipelineSummary};
pub use stage::Stage;
pub use stages::{
    AssemblyStage, DomainInferenceStage, ExportStage, PromptStage, SectionDraftStage,
    StageServices, VisualsStage, workbook_stages,
};
pub use state::PipelineState;
