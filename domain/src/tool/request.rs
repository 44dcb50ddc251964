//! Tool synthesis request and result types
//!
//! A [`ToolRequest`] describes a capability gap found by the tool planner;
//! the synthesizer turns it into a [`GeneratedTool`] whose `code` is a Lua
//! module defining exactly one top-level function named after the tool.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::error::DomainError;

/// True when `name` is a valid tool identifier: starts with a letter or
/// underscore, continues with letters, digits, or underscores.
pub fn is_valid_tool_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Request for a tool that does not exist yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRequest {
    /// Requested function name; must be a valid identifier.
    pub tool_name: String,
    /// What the tool should do.
    pub description: String,
    /// Positional argument names.
    #[serde(default)]
    pub args: Vec<String>,
    /// Named arguments with default values.
    #[serde(default)]
    pub kwargs: BTreeMap<String, String>,
    /// Expected return type name, if any.
    #[serde(default)]
    pub returns: Option<String>,
}

impl ToolRequest {
    pub fn new(tool_name: impl Into<String>, description: impl Into<String>) -> Result<Self, DomainError> {
        let tool_name = tool_name.into();
        if !is_valid_tool_name(&tool_name) {
            return Err(DomainError::InvalidToolName(tool_name));
        }
        Ok(Self {
            tool_name,
            description: description.into(),
            args: Vec::new(),
            kwargs: BTreeMap::new(),
            returns: None,
        })
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_kwarg(mut self, name: impl Into<String>, default: impl Into<String>) -> Self {
        self.kwargs.insert(name.into(), default.into());
        self
    }

    pub fn with_returns(mut self, returns: impl Into<String>) -> Self {
        self.returns = Some(returns.into());
        self
    }
}

/// Source produced by the code-generation agent for one [`ToolRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedTool {
    /// Function name; must match the originating request.
    pub name: String,
    /// Lua source defining the function.
    pub code: String,
    /// Tool description carried into the registered definition.
    #[serde(default)]
    pub description: String,
}
