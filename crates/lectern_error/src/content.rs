//! Per-content-type failure reporting for multi-part generation.

/// Why content could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ContentErrorKind {
    /// Every provider in the chain for one content type failed
    #[display("All {} provider(s) failed for '{}': {}", attempts, content_type, last_error)]
    AllProvidersFailed {
        /// Content type that could not be produced
        content_type: String,
        /// Number of providers attempted
        attempts: usize,
        /// Message of the last provider failure
        last_error: String,
    },
    /// Some content types failed; the result is still returned, degraded
    #[display("{} of {} content type(s) failed: {}", failed.len(), requested, failed.join(", "))]
    Aggregate {
        /// Content types that failed
        failed: Vec<String>,
        /// Number of content types requested
        requested: usize,
    },
    /// Every requested content type failed; the result has no sections
    #[display("No content generated; every content type failed: {}", failed.join(", "))]
    NothingGenerated {
        /// Content types that failed, in request order
        failed: Vec<String>,
    },
}

/// Content generation error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Content Error: {} at line {} in {}", kind, line, file)]
pub struct ContentError {
    /// The specific error condition
    pub kind: ContentErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl ContentError {
    /// Create a new ContentError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ContentErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
