//! Error types for the tool module.

/// Errors that can occur during tool execution.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ToolError {
    /// Arguments could not be decoded into what the tool expects.
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    /// The tool ran and failed.
    #[error("execution failed: {0}")]
    Execution(String),
}

impl ToolError {
    /// Create an invalid arguments error.
    #[must_use]
    pub fn invalid_args(msg: impl Into<String>) -> Self {
        Self::InvalidArgs(msg.into())
    }

    /// Create an execution error.
    #[must_use]
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidArgs(err.to_string())
    }
}
