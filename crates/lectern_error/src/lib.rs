//! Error types for the Lectern workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! Taxonomy:
//! - [`ValidationError`]: bad caller input, fatal
//! - [`ProviderError`]: auth, rate-limit, transient, unknown-service,
//!   unavailable; only transient is retryable
//! - [`ContentError`]: some or all content types failed; carried in
//!   results rather than raised
//! - [`PipelineError`]: a stage failed, fatal to the pipeline
//!
//! # Examples
//!
//! ```
//! use lectern_error::{LecternResult, ProviderError};
//!
//! fn call_upstream() -> LecternResult<String> {
//!     Err(ProviderError::classify(None, "Connection refused"))?
//! }
//!
//! assert!(call_upstream().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod content;
mod error;
mod json;
mod pipeline;
mod provider;
mod validation;

pub use config::ConfigError;
pub use content::{ContentError, ContentErrorKind};
pub use error::{LecternError, LecternErrorKind, LecternResult};
pub use json::JsonError;
pub use pipeline::{PipelineError, PipelineErrorKind};
pub use provider::{ProviderError, ProviderErrorKind, RetryableError};
pub use validation::{ValidationError, ValidationErrorKind};
