//! Provider family adapters and the completion gateway.
//!
//! A model id is resolved to its [`ProviderFamily`](lectern_core::ProviderFamily)
//! through the [`ModelCatalog`], never by inspecting the name. Each family
//! has one [`CompletionAdapter`](lectern_interface::CompletionAdapter):
//!
//! - [`OpenAiAdapter`]: chat completions
//! - [`AnthropicAdapter`]: messages
//! - [`GeminiAdapter`]: generateContent, with long-context pricing
//!
//! [`CompletionGateway`] dispatches by catalog lookup and adds
//! primary/fallback escalation and concurrent batches.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod anthropic;
mod catalog;
mod gateway;
mod gemini;
mod metrics;
mod openai;
mod wire;

pub use anthropic::AnthropicAdapter;
pub use catalog::ModelCatalog;
pub use gateway::{AdapterProbe, CompletionGateway};
pub use gemini::GeminiAdapter;
pub use metrics::LlmMetrics;
pub use openai::OpenAiAdapter;
