//! Chat-completions runtime adapter
//!
//! Drives the native tool-use loop against an OpenAI-compatible API:
//! send the composed prompt with the tool schemas, execute every tool
//! call the model requests through the bound handles, feed the results
//! back, and stop when the model answers without tool calls or the turn
//! limit is reached.
//!
//! Transport-level retries honor `AgentSpec::params.retries`; nothing
//! above this adapter retries.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use conductor_application::ports::agent_runtime::{
    AgentRuntime, ContextSection, RuntimeError, TaskOutput, TraceEvent,
};
use conductor_domain::{AgentSpec, History, ResponseFormat, ToolContext, ToolHandle};

use super::schema::to_api_tool;
use super::wire::{
    ApiErrorEnvelope, ChatMessage, ChatRequest, ChatResponse, ResponseMessage, WireToolCall,
};

/// Default cap on tool-use turns within one run.
pub const DEFAULT_MAX_TOOL_TURNS: usize = 8;

pub struct ChatRuntime {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    max_tool_turns: usize,
}

impl ChatRuntime {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            max_tool_turns: DEFAULT_MAX_TOOL_TURNS,
        }
    }

    pub fn with_max_tool_turns(mut self, max_tool_turns: usize) -> Self {
        self.max_tool_turns = max_tool_turns.max(1);
        self
    }

    async fn send_chat(&self, request: &ChatRequest) -> Result<ChatResponse, RuntimeError> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut builder = self.client.post(&url).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| RuntimeError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or(body);
            return Err(RuntimeError::Api(format!("{}: {}", status.as_u16(), message)));
        }

        response
            .json::<ChatResponse>()
            .await
            .map_err(|e| RuntimeError::Decode(e.to_string()))
    }

    async fn send_with_retries(
        &self,
        request: &ChatRequest,
        retries: u32,
    ) -> Result<ChatResponse, RuntimeError> {
        let mut attempt: u32 = 0;
        loop {
            match self.send_chat(request).await {
                Ok(response) => return Ok(response),
                Err(error) if attempt < retries && is_retryable(&error) => {
                    attempt += 1;
                    warn!(%error, attempt, "Chat request failed; retrying");
                    tokio::time::sleep(Duration::from_millis(300 * attempt as u64)).await;
                }
                Err(error) => return Err(error),
            }
        }
    }

    /// Execute one requested tool call and return its textual result.
    async fn execute_call(
        &self,
        call: &WireToolCall,
        tools: &[Arc<ToolHandle>],
        history: &History,
        trace: &mut Vec<TraceEvent>,
    ) -> ChatMessage {
        let args_value: Value =
            serde_json::from_str(&call.function.arguments).unwrap_or(Value::Object(Default::default()));
        let args: HashMap<String, Value> = match &args_value {
            Value::Object(map) => map.clone().into_iter().collect(),
            _ => HashMap::new(),
        };

        trace.push(TraceEvent::Requested {
            id: call.id.clone(),
            tool: call.function.name.clone(),
            args: args_value,
        });

        let (output, is_error) = match tools.iter().find(|h| h.name() == call.function.name) {
            Some(handle) => {
                let ctx = ToolContext::new(history.clone());
                match handle.invoke(&ctx, args).await {
                    Ok(value) => (value_to_text(&value), false),
                    // Tool errors go back to the model so it can adjust
                    // its call; they do not abort the run.
                    Err(error) => (error.to_string(), true),
                }
            }
            None => (
                format!("Tool not found: {}", call.function.name),
                true,
            ),
        };

        debug!(tool = %call.function.name, is_error, "Tool call finished");
        trace.push(TraceEvent::Returned {
            id: call.id.clone(),
            output: output.clone(),
            is_error,
        });

        ChatMessage::tool_result(&call.id, output)
    }
}

#[async_trait]
impl AgentRuntime for ChatRuntime {
    async fn run(
        &self,
        spec: &AgentSpec,
        tools: &[Arc<ToolHandle>],
        history: &History,
        prompt: &str,
        sections: &[ContextSection],
    ) -> Result<TaskOutput, RuntimeError> {
        let mut messages = vec![
            ChatMessage::system(compose_system(spec, sections)),
            ChatMessage::user(prompt),
        ];

        let tool_schemas: Option<Vec<Value>> = if tools.is_empty() {
            None
        } else {
            Some(tools.iter().map(|h| to_api_tool(&h.definition)).collect())
        };
        let response_format = match spec.params.response_format {
            ResponseFormat::Json => Some(serde_json::json!({"type": "json_object"})),
            ResponseFormat::Text => None,
        };

        let mut trace = Vec::new();
        let mut final_text = String::new();
        let mut turns = 0usize;

        loop {
            let request = ChatRequest {
                model: spec.model.as_str().to_string(),
                messages: messages.clone(),
                tools: tool_schemas.clone(),
                response_format: response_format.clone(),
            };

            let response = self.send_with_retries(&request, spec.params.retries).await?;
            let message: ResponseMessage = response
                .choices
                .into_iter()
                .next()
                .map(|choice| choice.message)
                .ok_or_else(|| RuntimeError::Decode("Response carried no choices".to_string()))?;

            if let Some(content) = &message.content
                && !content.is_empty()
            {
                final_text = content.clone();
            }

            let calls = message.tool_calls.unwrap_or_default();
            if calls.is_empty() {
                break;
            }

            turns += 1;
            if turns > self.max_tool_turns {
                warn!(max = self.max_tool_turns, "Tool loop exceeded max turns");
                break;
            }

            messages.push(ChatMessage::assistant_with_calls(
                message.content.clone(),
                calls.clone(),
            ));
            for call in &calls {
                let result = self.execute_call(call, tools, history, &mut trace).await;
                messages.push(result);
            }
        }

        Ok(TaskOutput {
            text: final_text,
            trace,
        })
    }
}

/// Fixed system prompt plus rendered context sections.
fn compose_system(spec: &AgentSpec, sections: &[ContextSection]) -> String {
    let mut parts = vec![spec.system_prompt.clone()];
    for section in sections {
        parts.push(section.render());
    }
    parts.join("\n\n")
}

/// Render a tool's return value for the model: bare strings stay bare,
/// everything else is JSON.
fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_retryable(error: &RuntimeError) -> bool {
    match error {
        RuntimeError::Transport(_) => true,
        RuntimeError::Api(message) => {
            message.starts_with("429") || message.starts_with('5')
        }
        _ => false,
    }
}
