//! Tool value objects — error type returned by tool invocations
//!
//! Error codes are surfaced back to the model inside the tool loop so it
//! can correct its own call (`INVALID_ARGUMENT`, `NOT_FOUND`) or give up
//! (`EXECUTION_FAILED`, `TIMEOUT`).

use serde::{Deserialize, Serialize};

/// Error that occurred during tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolError {
    /// Error code (e.g., "NOT_FOUND", "INVALID_ARGUMENT")
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl ToolError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", format!("Resource not found: {}", resource.into()))
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new("INVALID_ARGUMENT", message)
    }

    pub fn execution_failed(message: impl Into<String>) -> Self {
        Self::new("EXECUTION_FAILED", message)
    }

    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::new("TIMEOUT", format!("Operation timed out: {}", operation.into()))
    }
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ToolError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        assert_eq!(ToolError::not_found("get_time").code, "NOT_FOUND");
        assert_eq!(ToolError::invalid_argument("missing path").code, "INVALID_ARGUMENT");
        assert_eq!(ToolError::execution_failed("io error").code, "EXECUTION_FAILED");
        assert_eq!(ToolError::timeout("web_search").code, "TIMEOUT");
    }

    #[test]
    fn test_display() {
        let err = ToolError::invalid_argument("Missing required argument: path");
        assert_eq!(err.to_string(), "[INVALID_ARGUMENT] Missing required argument: path");
    }
}
