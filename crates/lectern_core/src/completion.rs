//! Normalized completion request and response types.

use serde::{Deserialize, Serialize};

/// Per-call generation options.
///
/// # Examples
///
/// ```
/// use lectern_core::CompletionOptions;
///
/// let options = CompletionOptions::builder()
///     .temperature(0.2f32)
///     .max_tokens(512u32)
///     .system_message("You are a careful teacher.")
///     .build()
///     .unwrap();
///
/// assert_eq!(options.max_tokens, Some(512));
/// assert!(CompletionOptions::default().temperature.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, derive_builder::Builder)]
#[builder(default, setter(into, strip_option))]
pub struct CompletionOptions {
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Maximum number of tokens to generate
    pub max_tokens: Option<u32>,
    /// System instruction sent ahead of the prompt
    pub system_message: Option<String>,
}

impl CompletionOptions {
    /// Creates a new options builder.
    pub fn builder() -> CompletionOptionsBuilder {
        CompletionOptionsBuilder::default()
    }
}

/// One entry of a batch completion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Prompt text
    pub prompt: String,
    /// Model identifier from the catalog
    pub model: String,
    /// Generation options
    #[serde(default)]
    pub options: CompletionOptions,
}

impl CompletionRequest {
    /// Creates a request with default options.
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            options: CompletionOptions::default(),
        }
    }

    /// Replaces the options.
    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }
}

/// Token accounting for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt tokens
    pub input: u64,
    /// Completion tokens
    pub output: u64,
    /// Input plus output
    pub total: u64,
}

impl TokenUsage {
    /// Builds usage from input/output counts, deriving the total.
    pub fn new(input: u64, output: u64) -> Self {
        Self {
            input,
            output,
            total: input + output,
        }
    }
}

/// Why generation stopped.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FinishReason {
    /// Model completed naturally.
    Stop,
    /// Hit max_tokens limit.
    Length,
    /// Hit a stop sequence.
    StopSequence,
    /// Model requested tool/function call.
    ToolUse,
    /// Content was filtered.
    ContentFilter,
    /// Other/unknown reason.
    Other,
}

/// The normalized response every provider family is mapped onto.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Generated text
    pub content: String,
    /// Token accounting
    pub token_usage: TokenUsage,
    /// Cost in USD computed by the family's pricing function
    pub cost: f64,
    /// Model that served the call
    pub model: String,
    /// Why generation stopped
    pub finish_reason: FinishReason,
}
