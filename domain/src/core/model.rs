//! Model identifier value object

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::error::DomainError;

/// Identifier of an LLM model as understood by the invocation runtime
/// (e.g. "gpt-4o", "gpt-4o-mini").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Model(String);

impl Model {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Model {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidModel(s.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let model: Model = "gpt-4o".parse().unwrap();
        assert_eq!(model.as_str(), "gpt-4o");
        assert_eq!(model.to_string(), "gpt-4o");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let model: Model = "  gpt-4o-mini ".parse().unwrap();
        assert_eq!(model.as_str(), "gpt-4o-mini");
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!("".parse::<Model>().is_err());
        assert!("   ".parse::<Model>().is_err());
    }
}
