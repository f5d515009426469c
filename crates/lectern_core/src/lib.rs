//! Core data types for the Lectern document generation pipeline.
//!
//! This crate provides the plain data shared by every other crate: the
//! normalized completion request/response, provider families, model
//! records, and the worksheet and workbook request/result types.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod completion;
mod content;
mod family;
mod model;
mod workbook;
mod worksheet;

pub use completion::{
    CompletionOptions, CompletionOptionsBuilder, CompletionRequest, CompletionResponse,
    FinishReason, TokenUsage,
};
pub use content::{ContentType, Difficulty, WorksheetLength};
pub use family::ProviderFamily;
pub use model::{ModelRecord, Pricing};
pub use workbook::{MAX_SECTIONS, WorkbookRequest, WorkbookRequestBuilder};
pub use worksheet::{
    ContentFailure, GeneratedContent, QualityMetrics, VisualAsset, WorksheetGenerationResult,
    WorksheetRequest,
};
