//! Executable tool handles
//!
//! A [`ToolHandle`] pairs a [`ToolDefinition`] with the callable behind it.
//! The callable is a tagged variant, set at the point of definition:
//! [`ToolFn::Plain`] receives only its arguments, [`ToolFn::Contextual`]
//! additionally receives a read-only snapshot of the conversation history.
//! The variant is never inferred from the callable's shape.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::history::History;

use super::entities::ToolDefinition;
use super::value_objects::ToolError;

/// Arguments passed to a tool invocation, keyed by parameter name.
pub type ToolArgs = HashMap<String, Value>;

/// Boxed future returned by every tool invocation.
pub type ToolFuture = BoxFuture<'static, Result<Value, ToolError>>;

/// Read-only context handed to context-consuming tools.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    /// Snapshot of the conversation history at invocation time.
    pub history: History,
}

impl ToolContext {
    pub fn new(history: History) -> Self {
        Self { history }
    }
}

type PlainFn = dyn Fn(ToolArgs) -> ToolFuture + Send + Sync;
type ContextualFn = dyn Fn(ToolContext, ToolArgs) -> ToolFuture + Send + Sync;

/// Tagged tool callable — plain or context-consuming.
#[derive(Clone)]
pub enum ToolFn {
    Plain(Arc<PlainFn>),
    Contextual(Arc<ContextualFn>),
}

impl std::fmt::Debug for ToolFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolFn::Plain(_) => write!(f, "ToolFn::Plain"),
            ToolFn::Contextual(_) => write!(f, "ToolFn::Contextual"),
        }
    }
}

/// A named, executable tool: definition plus callable.
#[derive(Debug, Clone)]
pub struct ToolHandle {
    pub definition: ToolDefinition,
    func: ToolFn,
}

impl ToolHandle {
    /// Create a plain tool from a definition and a callable.
    pub fn plain<F>(definition: ToolDefinition, func: F) -> Self
    where
        F: Fn(ToolArgs) -> ToolFuture + Send + Sync + 'static,
    {
        Self {
            definition,
            func: ToolFn::Plain(Arc::new(func)),
        }
    }

    /// Create a context-consuming tool from a definition and a callable.
    pub fn contextual<F>(definition: ToolDefinition, func: F) -> Self
    where
        F: Fn(ToolContext, ToolArgs) -> ToolFuture + Send + Sync + 'static,
    {
        Self {
            definition,
            func: ToolFn::Contextual(Arc::new(func)),
        }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn is_contextual(&self) -> bool {
        matches!(self.func, ToolFn::Contextual(_))
    }

    /// Validate required arguments, then invoke the callable.
    ///
    /// Plain tools ignore the context; contextual tools receive it.
    pub async fn invoke(&self, ctx: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        for param in self.definition.required_parameters() {
            if !args.contains_key(&param.name) {
                return Err(ToolError::invalid_argument(format!(
                    "Missing required argument: {}",
                    param.name
                )));
            }
        }

        match &self.func {
            ToolFn::Plain(f) => f(args).await,
            ToolFn::Contextual(f) => f(ctx.clone(), args).await,
        }
    }
}
