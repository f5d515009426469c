//! Invalid or unreadable configuration.

/// A configuration file failed to load or validate.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Invalid configuration: {} at line {} in {}", message, line, file)]
pub struct ConfigError {
    /// Error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ConfigError {
    /// Record `message` at the caller's location.
    ///
    /// # Examples
    ///
    /// ```
    /// use lectern_error::ConfigError;
    ///
    /// let err = ConfigError::new("rate_limit.window_ms must be positive");
    /// assert!(err.message.contains("window_ms"));
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
