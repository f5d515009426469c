//! Top-level error wrapper types.

use crate::{ConfigError, ContentError, JsonError, PipelineError, ProviderError, ValidationError};

/// Every error family the workspace can raise.
///
/// # Examples
///
/// ```
/// use lectern_error::{LecternError, ProviderError};
///
/// let err: LecternError = ProviderError::classify(Some(401), "bad key").into();
/// assert!(format!("{}", err).contains("Authentication failed"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum LecternErrorKind {
    /// Upstream provider error
    #[from(ProviderError)]
    Provider(ProviderError),
    /// Caller input rejected
    #[from(ValidationError)]
    Validation(ValidationError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Pipeline execution error
    #[from(PipelineError)]
    Pipeline(PipelineError),
    /// Content generation error
    #[from(ContentError)]
    Content(ContentError),
}

/// Lectern error with kind discrimination.
///
/// # Examples
///
/// ```
/// use lectern_error::{ConfigError, LecternResult};
///
/// fn might_fail() -> LecternResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// assert!(might_fail().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Lectern Error: {}", _0)]
pub struct LecternError(Box<LecternErrorKind>);

impl LecternError {
    /// Create a new error from a kind.
    pub fn new(kind: LecternErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &LecternErrorKind {
        &self.0
    }

    /// The provider error inside, if this is one.
    pub fn as_provider(&self) -> Option<&ProviderError> {
        match self.kind() {
            LecternErrorKind::Provider(err) => Some(err),
            _ => None,
        }
    }
}

// Generic From implementation for any type that converts to LecternErrorKind
impl<T> From<T> for LecternError
where
    T: Into<LecternErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Lectern operations.
pub type LecternResult<T> = std::result::Result<T, LecternError>;
