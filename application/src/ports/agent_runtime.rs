//! Agent runtime port
//!
//! The invocation runtime receives an agent specification, the resolved
//! tool callables, and the composed prompt; it drives the model call and
//! the tool loop, and returns the final text together with an ordered
//! message trace. Tool requests and tool returns in the trace share a call
//! identifier so callers can pair them.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use conductor_domain::{AgentSpec, History, ToolHandle, ToolInvocation};

/// Errors surfaced by the invocation runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Tool loop error: {0}")]
    ToolLoop(String),
}

/// One dynamic addition to the system prompt (history text, tool
/// inventory, current date). Rendered as a titled section.
#[derive(Debug, Clone)]
pub struct ContextSection {
    pub title: String,
    pub body: String,
}

impl ContextSection {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn render(&self) -> String {
        format!("## {}\n\n{}", self.title, self.body)
    }
}

/// Entry in the runtime's message trace.
#[derive(Debug, Clone)]
pub enum TraceEvent {
    /// The model requested a tool call.
    Requested { id: String, tool: String, args: Value },
    /// A tool call finished; correlated with its request by `id`.
    Returned { id: String, output: String, is_error: bool },
}

/// Result of one agent run: final text plus the ordered message trace.
#[derive(Debug, Clone, Default)]
pub struct TaskOutput {
    pub text: String,
    pub trace: Vec<TraceEvent>,
}

impl TaskOutput {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            trace: Vec::new(),
        }
    }

    /// Pair request and return events by call identifier, preserving
    /// request order. Requests without a matching return are recorded
    /// with an empty result.
    pub fn paired_tool_results(&self) -> Vec<ToolInvocation> {
        let mut invocations = Vec::new();
        for event in &self.trace {
            let TraceEvent::Requested { id, tool, args } = event else {
                continue;
            };
            let result = self
                .trace
                .iter()
                .find_map(|e| match e {
                    TraceEvent::Returned { id: rid, output, .. } if rid == id => {
                        Some(output.clone())
                    }
                    _ => None,
                })
                .unwrap_or_default();

            invocations.push(ToolInvocation {
                tool: tool.clone(),
                args: args.clone(),
                result,
            });
        }
        invocations
    }
}

/// Port to the model-invocation runtime.
///
/// The runtime owns the tool loop: it executes tool calls through the
/// supplied handles (cloning `history` into the context of contextual
/// tools) and applies `spec.params.retries` at the transport level.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    async fn run(
        &self,
        spec: &AgentSpec,
        tools: &[Arc<ToolHandle>],
        history: &History,
        prompt: &str,
        sections: &[ContextSection],
    ) -> Result<TaskOutput, RuntimeError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_paired_tool_results() {
        let output = TaskOutput {
            text: "done".to_string(),
            trace: vec![
                TraceEvent::Requested {
                    id: "call_1".to_string(),
                    tool: "get_datetime".to_string(),
                    args: json!({}),
                },
                TraceEvent::Requested {
                    id: "call_2".to_string(),
                    tool: "web_search".to_string(),
                    args: json!({"query": "weather"}),
                },
                TraceEvent::Returned {
                    id: "call_2".to_string(),
                    output: "sunny".to_string(),
                    is_error: false,
                },
                TraceEvent::Returned {
                    id: "call_1".to_string(),
                    output: "12:30".to_string(),
                    is_error: false,
                },
            ],
        };

        let paired = output.paired_tool_results();
        assert_eq!(paired.len(), 2);
        assert_eq!(paired[0].tool, "get_datetime");
        assert_eq!(paired[0].result, "12:30");
        assert_eq!(paired[1].tool, "web_search");
        assert_eq!(paired[1].result, "sunny");
    }

    #[test]
    fn test_unmatched_request_yields_empty_result() {
        let output = TaskOutput {
            text: String::new(),
            trace: vec![TraceEvent::Requested {
                id: "call_1".to_string(),
                tool: "get_datetime".to_string(),
                args: json!({}),
            }],
        };

        let paired = output.paired_tool_results();
        assert_eq!(paired.len(), 1);
        assert!(paired[0].result.is_empty());
    }

    #[test]
    fn test_context_section_render() {
        let section = ContextSection::new("Task history", "empty");
        assert_eq!(section.render(), "## Task history\n\nempty");
    }
}
