//! Agent specification — immutable description of a model-backed agent
//!
//! An [`AgentSpec`] carries everything the invocation runtime needs to run
//! an agent: a model identifier, a display name, a system prompt, and a
//! typed parameter bag. It constructs nothing itself and is never mutated
//! once a task unit binds to it.

use serde::{Deserialize, Serialize};

use crate::core::model::Model;

/// Result-shape contract the runtime is asked to honor for a stage.
///
/// Stages that expect structured output (the analyzer, the tool planner,
/// the tool coder) request `Json`; free-form stages use `Text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    #[default]
    Text,
    Json,
}

/// Typed parameter bag attached to an [`AgentSpec`].
///
/// `retries` is honored by the invocation runtime at the transport level;
/// the task layer never retries on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentParams {
    /// Transport-level retry attempts for the invocation runtime.
    pub retries: u32,
    /// Requested response shape.
    pub response_format: ResponseFormat,
}

impl Default for AgentParams {
    fn default() -> Self {
        Self {
            retries: 1,
            response_format: ResponseFormat::Text,
        }
    }
}

impl AgentParams {
    pub fn json() -> Self {
        Self {
            response_format: ResponseFormat::Json,
            ..Self::default()
        }
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }
}

/// Immutable description of a model-backed agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Model identifier passed to the invocation runtime.
    pub model: Model,
    /// Display name (also used in status events and logs).
    pub name: String,
    /// Fixed system prompt.
    pub system_prompt: String,
    /// Typed parameter bag.
    #[serde(default)]
    pub params: AgentParams,
}

impl AgentSpec {
    pub fn new(model: Model, name: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            model,
            name: name.into(),
            system_prompt: system_prompt.into(),
            params: AgentParams::default(),
        }
    }

    pub fn with_params(mut self, params: AgentParams) -> Self {
        self.params = params;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = AgentParams::default();
        assert_eq!(params.retries, 1);
        assert_eq!(params.response_format, ResponseFormat::Text);
    }

    #[test]
    fn test_json_params() {
        let params = AgentParams::json().with_retries(3);
        assert_eq!(params.response_format, ResponseFormat::Json);
        assert_eq!(params.retries, 3);
    }

    #[test]
    fn test_spec_construction() {
        let spec = AgentSpec::new(Model::new("gpt-4o"), "task solver", "You solve tasks.")
            .with_params(AgentParams::json());

        assert_eq!(spec.name, "task solver");
        assert_eq!(spec.model.as_str(), "gpt-4o");
        assert_eq!(spec.params.response_format, ResponseFormat::Json);
    }
}
