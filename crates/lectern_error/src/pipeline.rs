//! Pipeline error types.

/// Specific error conditions for pipeline execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum PipelineErrorKind {
    /// A stage raised; the message is what callers read back as `pipeline.error`
    #[display("{}", message)]
    StageFailed {
        /// Stage name
        stage: String,
        /// Error message
        message: String,
    },
    /// An artifact would be replaced by a value of a different type
    #[display("Artifact '{}' already holds {} and cannot become {}", name, existing, attempted)]
    ArtifactConflict {
        /// Artifact name
        name: String,
        /// Type already stored
        existing: String,
        /// Type the stage tried to store
        attempted: String,
    },
    /// A stage returned a context missing an artifact it received
    #[display("Stage '{}' dropped artifact '{}'", stage, name)]
    ArtifactRemoved {
        /// Stage name
        stage: String,
        /// Artifact name
        name: String,
    },
    /// A stage needs an artifact no earlier stage produced
    #[display("Required artifact missing: {}", _0)]
    MissingArtifact(String),
    /// A stage needs a state entry no earlier stage produced
    #[display("Required state entry missing: {}", _0)]
    MissingState(String),
    /// The document sink rejected the assembled document
    #[display("Export failed: {}", _0)]
    Export(String),
}

/// Error type for pipeline operations.
///
/// # Examples
///
/// ```
/// use lectern_error::{PipelineError, PipelineErrorKind};
///
/// let err = PipelineError::new(PipelineErrorKind::MissingArtifact("outline".into()));
/// assert!(format!("{}", err).contains("outline"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Pipeline Error: {} at line {} in {}", kind, line, file)]
pub struct PipelineError {
    /// The specific error condition
    pub kind: PipelineErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl PipelineError {
    /// Create a new PipelineError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PipelineErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
