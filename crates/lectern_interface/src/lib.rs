//! Trait definitions for the Lectern document generation pipeline.
//!
//! These are the seams between the orchestration core and its
//! collaborators: provider-family adapters, content and visual providers,
//! health probes, the prompt builder, and the document sink.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod prompt;
mod traits;

pub use prompt::{PromptBuilder, TemplatePromptBuilder, parse_reply, strip_fence};
pub use traits::{CompletionAdapter, ContentProvider, DocumentSink, HealthProbe, VisualProvider};
