//! Provider error types and the HTTP failure classification table.

/// Classified failure of a call to an upstream provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ProviderErrorKind {
    /// Credentials rejected (HTTP 401/403). Fatal.
    #[display("Authentication failed (HTTP {}): {}", status_code, message)]
    Auth {
        /// HTTP status code
        status_code: u16,
        /// Error message
        message: String,
    },
    /// Upstream throttling signal (HTTP 429). Surfaced to the caller, not retried.
    #[display("Rate limited by provider: {}", _0)]
    RateLimited(String),
    /// No response or HTTP 5xx. Retryable.
    #[display("Transient failure: {}", message)]
    Transient {
        /// HTTP status code, `None` when no response arrived
        status_code: Option<u16>,
        /// Error message
        message: String,
    },
    /// Any other HTTP failure. Fatal.
    #[display("Unknown service error (HTTP {}): {}", status_code, message)]
    UnknownService {
        /// HTTP status code
        status_code: u16,
        /// Error message
        message: String,
    },
    /// Provider is not configured (missing credentials or not registered).
    #[display("Provider unavailable: {}", _0)]
    Unavailable(String),
    /// Model id not present in the model catalog.
    #[display("Unknown model: {}", _0)]
    UnknownModel(String),
    /// Provider answered but the payload could not be understood.
    #[display("Invalid provider response: {}", _0)]
    InvalidResponse(String),
    /// The request body could not be encoded. Nothing was sent.
    #[display("Invalid provider request: {}", _0)]
    InvalidRequest(String),
}

impl ProviderErrorKind {
    /// Classify an HTTP outcome.
    ///
    /// `None` means the request never produced a response (connect failure,
    /// timeout).
    pub fn classify(status_code: Option<u16>, message: impl Into<String>) -> Self {
        let message = message.into();
        match status_code {
            None => ProviderErrorKind::Transient {
                status_code: None,
                message,
            },
            Some(code @ (401 | 403)) => ProviderErrorKind::Auth {
                status_code: code,
                message,
            },
            Some(429) => ProviderErrorKind::RateLimited(message),
            Some(code @ 500..=599) => ProviderErrorKind::Transient {
                status_code: Some(code),
                message,
            },
            Some(code) => ProviderErrorKind::UnknownService {
                status_code: code,
                message,
            },
        }
    }

    /// Check if this error type should be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderErrorKind::Transient { .. })
    }

    /// Short label used in logs and metrics.
    pub fn classification(&self) -> &'static str {
        match self {
            ProviderErrorKind::Auth { .. } => "auth",
            ProviderErrorKind::RateLimited(_) => "rate_limit",
            ProviderErrorKind::Transient { .. } => "transient",
            ProviderErrorKind::UnknownService { .. } => "unknown_service",
            ProviderErrorKind::Unavailable(_) => "unavailable",
            ProviderErrorKind::UnknownModel(_) => "unknown_model",
            ProviderErrorKind::InvalidResponse(_) => "invalid_response",
            ProviderErrorKind::InvalidRequest(_) => "invalid_request",
        }
    }
}

/// Provider error with source location tracking.
///
/// # Examples
///
/// ```
/// use lectern_error::{ProviderError, ProviderErrorKind, RetryableError};
///
/// let err = ProviderError::classify(Some(503), "Service unavailable");
/// assert!(err.is_retryable());
///
/// let err = ProviderError::classify(Some(401), "bad key");
/// assert!(matches!(err.kind, ProviderErrorKind::Auth { .. }));
/// assert!(!err.is_retryable());
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Provider Error: {} at line {} in {}", kind, line, file)]
pub struct ProviderError {
    /// The kind of error that occurred
    pub kind: ProviderErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ProviderError {
    /// Create a new ProviderError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ProviderErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Classify an HTTP outcome into a located error.
    #[track_caller]
    pub fn classify(status_code: Option<u16>, message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::classify(status_code, message))
    }

    /// Short label used in logs and metrics.
    pub fn classification(&self) -> &'static str {
        self.kind.classification()
    }
}

impl From<ProviderErrorKind> for ProviderError {
    #[track_caller]
    fn from(kind: ProviderErrorKind) -> Self {
        Self::new(kind)
    }
}

/// Trait for errors that support retry logic.
///
/// Transient failures (no response, 5xx) return true. Authentication,
/// throttling and malformed-request failures return false: throttling is
/// left to the caller's own backoff decisions.
pub trait RetryableError {
    /// Returns true if this error should trigger a retry.
    fn is_retryable(&self) -> bool;
}

impl RetryableError for ProviderError {
    fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}
