//! JSON encoding errors.

/// Failure to encode or decode a named document as JSON.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Cannot encode {} as JSON: {} at line {} in {}", document, message, line, file)]
pub struct JsonError {
    /// What was being encoded, e.g. "worksheet result"
    pub document: String,
    /// Message from the serializer
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl JsonError {
    /// Record a failure for `document` at the caller's location.
    ///
    /// ```
    /// use lectern_error::JsonError;
    ///
    /// let err = JsonError::new("pipeline summary", "key must be a string");
    /// assert!(err.to_string().starts_with("Cannot encode pipeline summary"));
    /// ```
    #[track_caller]
    pub fn new(document: impl Into<String>, message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            document: document.into(),
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
