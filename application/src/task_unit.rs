//! Task unit — the live, executable binding of a task definition
//!
//! A [`TaskUnit`] merges a [`TaskDef`] with a resolved agent specification
//! and a materialized tool list, and runs it through the invocation
//! runtime while emitting lifecycle status events.
//!
//! No retries happen at this layer; transport retries belong to the
//! runtime and are configured through `AgentSpec::params`.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use conductor_domain::{
    AgentSpec, History, StatusUpdate, SymbolTable, TaskDef, TaskState, ToolHandle, ToolSet,
    ToolSetError,
};

use crate::ports::agent_runtime::{AgentRuntime, ContextSection, RuntimeError, TaskOutput};
use crate::ports::status::StatusSink;

/// Errors from constructing or running a task unit.
#[derive(Error, Debug)]
pub enum TaskError {
    /// Neither the constructor nor the task definition supplied an agent.
    #[error("Agent specification required for task '{0}'")]
    AgentSpecRequired(String),

    /// A toolset member could not be resolved or merged.
    #[error(transparent)]
    Resolution(#[from] ToolSetError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// A tool synthesis step failed (carried when synthesis is bounded
    /// like any other stage).
    #[error("Tool synthesis failed: {0}")]
    Synthesis(String),

    #[error("Stage timed out after {0:?}")]
    Timeout(Duration),

    #[error("Operation cancelled")]
    Cancelled,
}

/// A task definition bound to a concrete agent and tool set.
pub struct TaskUnit {
    task_def: TaskDef,
    agent: AgentSpec,
    tools: Vec<Arc<ToolHandle>>,
    runtime: Arc<dyn AgentRuntime>,
    status: Arc<dyn StatusSink>,
}

impl std::fmt::Debug for TaskUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskUnit")
            .field("task_def", &self.task_def)
            .field("agent", &self.agent)
            .field("tools", &self.tool_names())
            .finish_non_exhaustive()
    }
}

impl TaskUnit {
    /// Bind a task definition.
    ///
    /// The agent is the override when given, otherwise the definition's
    /// own. The effective toolset is the definition's toolset unioned with
    /// the override (override wins on shared names), materialized against
    /// the symbol table.
    pub fn new(
        task_def: TaskDef,
        agent_override: Option<AgentSpec>,
        toolset_override: Option<ToolSet>,
        symbols: &SymbolTable,
        runtime: Arc<dyn AgentRuntime>,
        status: Arc<dyn StatusSink>,
    ) -> Result<Self, TaskError> {
        let agent = agent_override
            .or_else(|| task_def.agent.clone())
            .ok_or_else(|| TaskError::AgentSpecRequired(task_def.name.clone()))?;

        let mut merged = task_def.toolset.clone().unwrap_or_default();
        if let Some(extra) = &toolset_override {
            merged = merged | extra;
        }
        let tools = merged.materialize(symbols)?;

        debug!(
            task = %task_def.name,
            agent = %agent.name,
            tools = tools.len(),
            "Task unit bound"
        );

        Ok(Self {
            task_def,
            agent,
            tools,
            runtime,
            status,
        })
    }

    pub fn task_def(&self) -> &TaskDef {
        &self.task_def
    }

    pub fn agent(&self) -> &AgentSpec {
        &self.agent
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|h| h.name()).collect()
    }

    /// Add a tool to the live binding. The runtime reads the current tool
    /// list on every run, so a tool registered here (e.g. one synthesized
    /// mid-flow) is visible to the next invocation without a rebuild.
    pub fn register_tool(&mut self, handle: Arc<ToolHandle>) {
        if let Some(existing) = self.tools.iter_mut().find(|h| h.name() == handle.name()) {
            *existing = handle;
        } else {
            self.tools.push(handle);
        }
    }

    /// Add every resolvable member of a toolset to the live binding.
    pub fn register_toolset(
        &mut self,
        toolset: &ToolSet,
        symbols: &SymbolTable,
    ) -> Result<(), TaskError> {
        for handle in toolset.materialize(symbols)? {
            self.register_tool(handle);
        }
        Ok(())
    }

    /// Execute the task.
    ///
    /// The effective query is the definition's query, suffixed with
    /// `extra` when provided (`"{query}: {extra}"`). Emits a running
    /// status event before invocation and a completed/failed event after;
    /// a runtime error is re-raised after the failed event so the caller
    /// decides whether it degrades or aborts.
    pub async fn run(
        &self,
        history: &History,
        extra: Option<&str>,
        sections: &[ContextSection],
    ) -> Result<TaskOutput, TaskError> {
        let query = match extra {
            Some(extra) if !extra.is_empty() => format!("{}: {}", self.task_def.query, extra),
            _ => self.task_def.query.clone(),
        };

        self.emit(TaskState::Running, format!("Running: {}", query));

        match self
            .runtime
            .run(&self.agent, &self.tools, history, &query, sections)
            .await
        {
            Ok(output) => {
                self.emit(TaskState::Completed, "Completed");
                Ok(output)
            }
            Err(error) => {
                self.emit(TaskState::Failed, error.to_string());
                Err(error.into())
            }
        }
    }

    /// Synchronous entry point; wraps [`run`](Self::run) in a
    /// current-thread runtime.
    pub fn run_sync(
        &self,
        history: &History,
        extra: Option<&str>,
        sections: &[ContextSection],
    ) -> Result<TaskOutput, TaskError> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| RuntimeError::Transport(format!("Failed to create runtime: {}", e)))?;
        rt.block_on(self.run(history, extra, sections))
    }

    fn emit(&self, state: TaskState, message: impl Into<String>) {
        self.status
            .on_status(&StatusUpdate::new(&self.task_def.name, state, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CollectingSink, MockRuntime, tool};
    use conductor_domain::{Model, ToolSet};

    fn spec() -> AgentSpec {
        AgentSpec::new(Model::new("gpt-4o"), "test agent", "You are a test agent.")
    }

    #[test]
    fn test_agent_spec_required() {
        let runtime = Arc::new(MockRuntime::default());
        let symbols = SymbolTable::new();

        let err = TaskUnit::new(
            TaskDef::new("orphan", "do something"),
            None,
            None,
            &symbols,
            runtime,
            Arc::new(CollectingSink::default()),
        )
        .unwrap_err();

        assert!(matches!(err, TaskError::AgentSpecRequired(name) if name == "orphan"));
    }

    #[test]
    fn test_toolset_merge_override_wins() {
        let runtime = Arc::new(MockRuntime::default());
        let mut symbols = SymbolTable::new();
        symbols.register(tool("shared")).unwrap();
        symbols.register(tool("from_def")).unwrap();

        let def_set = ToolSet::from_names(["shared", "from_def"]).unwrap();
        let mut override_set = ToolSet::new();
        let override_shared = tool("shared");
        override_set.insert_handle(Arc::clone(&override_shared)).unwrap();

        let unit = TaskUnit::new(
            TaskDef::new("t", "q").with_toolset(def_set),
            Some(spec()),
            Some(override_set),
            &symbols,
            runtime,
            Arc::new(CollectingSink::default()),
        )
        .unwrap();

        assert_eq!(unit.tool_names(), vec!["shared", "from_def"]);
        // The override's binding won for the shared name.
        assert!(unit.tools.iter().any(|h| Arc::ptr_eq(h, &override_shared)));
    }

    #[tokio::test]
    async fn test_run_composes_query_and_emits_events() {
        let runtime = Arc::new(MockRuntime::default());
        runtime.push_text("test agent", "42");
        let sink = Arc::new(CollectingSink::default());

        let unit = TaskUnit::new(
            TaskDef::new("answer", "compute the answer"),
            Some(spec()),
            None,
            &SymbolTable::new(),
            Arc::clone(&runtime) as Arc<dyn AgentRuntime>,
            Arc::clone(&sink) as Arc<dyn StatusSink>,
        )
        .unwrap();

        let output = unit
            .run(&History::default(), Some("with context"), &[])
            .await
            .unwrap();
        assert_eq!(output.text, "42");

        let prompts = runtime.prompts();
        assert_eq!(prompts[0], "compute the answer: with context");

        let states = sink.states();
        assert_eq!(states, vec![TaskState::Running, TaskState::Completed]);
    }

    #[tokio::test]
    async fn test_run_failure_emits_failed_and_propagates() {
        let runtime = Arc::new(MockRuntime::default());
        runtime.push_error("test agent", "boom");
        let sink = Arc::new(CollectingSink::default());

        let unit = TaskUnit::new(
            TaskDef::new("fragile", "explode"),
            Some(spec()),
            None,
            &SymbolTable::new(),
            Arc::clone(&runtime) as Arc<dyn AgentRuntime>,
            Arc::clone(&sink) as Arc<dyn StatusSink>,
        )
        .unwrap();

        let err = unit.run(&History::default(), None, &[]).await.unwrap_err();
        assert!(matches!(err, TaskError::Runtime(_)));
        assert_eq!(sink.states(), vec![TaskState::Running, TaskState::Failed]);
    }

    #[tokio::test]
    async fn test_register_tool_replaces_by_name() {
        let runtime = Arc::new(MockRuntime::default());
        let mut symbols = SymbolTable::new();
        symbols.register(tool("a")).unwrap();

        let mut unit = TaskUnit::new(
            TaskDef::new("t", "q").with_toolset(ToolSet::from_names(["a"]).unwrap()),
            Some(spec()),
            None,
            &symbols,
            runtime,
            Arc::new(CollectingSink::default()),
        )
        .unwrap();

        let replacement = tool("a");
        unit.register_tool(Arc::clone(&replacement));
        assert_eq!(unit.tools.len(), 1);
        assert!(Arc::ptr_eq(&unit.tools[0], &replacement));

        unit.register_tool(tool("b"));
        assert_eq!(unit.tool_names(), vec!["a", "b"]);
    }
}
