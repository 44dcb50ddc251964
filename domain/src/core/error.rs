//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid model identifier: {0}")]
    InvalidModel(String),

    #[error("Invalid priority {0}: must be between 1 and 10")]
    InvalidPriority(u8),

    #[error("Invalid tool name: {0}")]
    InvalidToolName(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = DomainError::InvalidPriority(12);
        assert_eq!(error.to_string(), "Invalid priority 12: must be between 1 and 10");
    }
}
