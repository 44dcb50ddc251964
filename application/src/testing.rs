//! Shared test doubles for the application layer.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use conductor_domain::{
    AgentSpec, History, StatusUpdate, TaskState, ToolDefinition, ToolHandle,
};

use crate::ports::agent_runtime::{AgentRuntime, ContextSection, RuntimeError, TaskOutput};
use crate::ports::script_engine::{ScriptEngine, ScriptError};
use crate::ports::status::StatusSink;

/// A plain tool handle whose invocation returns `"<name>-result"`.
pub fn tool(name: &str) -> Arc<ToolHandle> {
    let reply = format!("{}-result", name);
    Arc::new(ToolHandle::plain(
        ToolDefinition::new(name, format!("test tool {}", name)),
        move |_args| {
            let reply = reply.clone();
            Box::pin(async move { Ok(Value::String(reply)) })
        },
    ))
}

/// One call observed by [`MockRuntime`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub agent: String,
    pub prompt: String,
    pub tool_names: Vec<String>,
    pub section_titles: Vec<String>,
}

/// Scripted runtime: responses are queued per agent name; unscripted
/// calls return empty text.
#[derive(Default)]
pub struct MockRuntime {
    scripted: Mutex<HashMap<String, VecDeque<Result<TaskOutput, String>>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockRuntime {
    pub fn push_text(&self, agent: &str, text: &str) {
        self.push(agent, Ok(TaskOutput::from_text(text)));
    }

    pub fn push_output(&self, agent: &str, output: TaskOutput) {
        self.push(agent, Ok(output));
    }

    pub fn push_error(&self, agent: &str, message: &str) {
        self.push(agent, Err(message.to_string()));
    }

    fn push(&self, agent: &str, response: Result<TaskOutput, String>) {
        self.scripted
            .lock()
            .unwrap()
            .entry(agent.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.prompt).collect()
    }

    pub fn calls_for(&self, agent: &str) -> usize {
        self.calls().iter().filter(|c| c.agent == agent).count()
    }
}

#[async_trait]
impl AgentRuntime for MockRuntime {
    async fn run(
        &self,
        spec: &AgentSpec,
        tools: &[Arc<ToolHandle>],
        _history: &History,
        prompt: &str,
        sections: &[ContextSection],
    ) -> Result<TaskOutput, RuntimeError> {
        self.calls.lock().unwrap().push(RecordedCall {
            agent: spec.name.clone(),
            prompt: prompt.to_string(),
            tool_names: tools.iter().map(|t| t.name().to_string()).collect(),
            section_titles: sections.iter().map(|s| s.title.clone()).collect(),
        });

        let response = self
            .scripted
            .lock()
            .unwrap()
            .get_mut(&spec.name)
            .and_then(|queue| queue.pop_front());

        match response {
            Some(Ok(output)) => Ok(output),
            Some(Err(message)) => Err(RuntimeError::Api(message)),
            None => Ok(TaskOutput::default()),
        }
    }
}

/// Script engine double: vetting rejects source containing `FORBIDDEN`;
/// loading returns an echo tool and counts invocations.
#[derive(Default)]
pub struct MockEngine {
    loads: Mutex<Vec<String>>,
}

impl MockEngine {
    pub fn load_count(&self) -> usize {
        self.loads.lock().unwrap().len()
    }
}

impl ScriptEngine for MockEngine {
    fn vet_source(&self, code: &str) -> Result<(), ScriptError> {
        if code.contains("FORBIDDEN") {
            return Err(ScriptError::Vetting("forbidden construct".to_string()));
        }
        Ok(())
    }

    fn load_tool(
        &self,
        path: &Path,
        definition: ToolDefinition,
    ) -> Result<Arc<ToolHandle>, ScriptError> {
        if !path.exists() {
            return Err(ScriptError::Load(format!("no such file: {}", path.display())));
        }
        self.loads.lock().unwrap().push(definition.name.clone());
        let name = definition.name.clone();
        Ok(Arc::new(ToolHandle::plain(definition, move |_args| {
            let name = name.clone();
            Box::pin(async move { Ok(Value::String(format!("loaded:{}", name))) })
        })))
    }
}

/// Status sink that records every update.
#[derive(Default)]
pub struct CollectingSink {
    updates: Mutex<Vec<StatusUpdate>>,
}

impl CollectingSink {
    pub fn updates(&self) -> Vec<StatusUpdate> {
        self.updates.lock().unwrap().clone()
    }

    pub fn states(&self) -> Vec<TaskState> {
        self.updates().into_iter().map(|u| u.state).collect()
    }
}

impl StatusSink for CollectingSink {
    fn on_status(&self, update: &StatusUpdate) {
        self.updates.lock().unwrap().push(update.clone());
    }
}
