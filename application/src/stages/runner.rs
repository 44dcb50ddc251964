//! Task runner stage
//!
//! Executes one subtask through a task unit bound to the resolved
//! toolset, and normalizes the runtime's message trace into paired tool
//! results for the history record.

use std::sync::Arc;

use conductor_domain::{
    AgentSpec, History, Model, StagePrompt, SymbolTable, TaskDef, TaskRecord, ToolSet,
};

use crate::ports::agent_runtime::AgentRuntime;
use crate::ports::status::StatusSink;
use crate::stages::{TASK_SOLVER_AGENT, task_history_section};
use crate::task_unit::{TaskError, TaskUnit};

pub struct TaskRunner {
    model: Model,
    runtime: Arc<dyn AgentRuntime>,
    status: Arc<dyn StatusSink>,
}

impl TaskRunner {
    pub fn new(model: Model, runtime: Arc<dyn AgentRuntime>, status: Arc<dyn StatusSink>) -> Self {
        Self { model, runtime, status }
    }

    /// Run one subtask with the given toolset bound.
    ///
    /// A definition without its own agent gets the default task-solver
    /// agent. The returned record carries the free-form result plus the
    /// tool invocations extracted from the trace.
    pub async fn run(
        &self,
        task_def: &TaskDef,
        toolset: ToolSet,
        symbols: &SymbolTable,
        history: &History,
    ) -> Result<TaskRecord, TaskError> {
        let agent = task_def.agent.clone().unwrap_or_else(|| {
            AgentSpec::new(self.model.clone(), TASK_SOLVER_AGENT, StagePrompt::task_runner())
        });

        let unit = TaskUnit::new(
            task_def.clone(),
            Some(agent),
            Some(toolset),
            symbols,
            Arc::clone(&self.runtime),
            Arc::clone(&self.status),
        )?;

        let sections = [task_history_section(history)];
        let output = unit.run(history, None, &sections).await?;

        Ok(TaskRecord::new(&task_def.query, &output.text)
            .with_tool_results(output.paired_tool_results()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::agent_runtime::{TaskOutput, TraceEvent};
    use crate::ports::status::NullStatusSink;
    use crate::testing::{MockRuntime, tool};
    use serde_json::json;

    #[tokio::test]
    async fn test_run_binds_tools_and_pairs_results() {
        let runtime = Arc::new(MockRuntime::default());
        runtime.push_output(
            TASK_SOLVER_AGENT,
            TaskOutput {
                text: "The current time is 12:30".to_string(),
                trace: vec![
                    TraceEvent::Requested {
                        id: "call_1".to_string(),
                        tool: "get_datetime".to_string(),
                        args: json!({}),
                    },
                    TraceEvent::Returned {
                        id: "call_1".to_string(),
                        output: "12:30".to_string(),
                        is_error: false,
                    },
                ],
            },
        );

        let mut symbols = SymbolTable::new();
        symbols.register(tool("get_datetime")).unwrap();
        let toolset = ToolSet::from_names(["get_datetime"]).unwrap();

        let runner = TaskRunner::new(
            Model::new("gpt-4o"),
            Arc::clone(&runtime) as Arc<dyn AgentRuntime>,
            Arc::new(NullStatusSink),
        );

        let record = runner
            .run(
                &TaskDef::new("time_info", "get the current time"),
                toolset,
                &symbols,
                &History::default(),
            )
            .await
            .unwrap();

        assert_eq!(record.query, "get the current time");
        assert!(record.result.contains("12:30"));
        assert_eq!(record.tool_results.len(), 1);
        assert_eq!(record.tool_results[0].tool, "get_datetime");
        assert_eq!(record.tool_results[0].result, "12:30");

        let call = &runtime.calls()[0];
        assert_eq!(call.tool_names, vec!["get_datetime"]);
        assert!(call.section_titles.contains(&"Task history".to_string()));
    }

    #[tokio::test]
    async fn test_run_uses_task_agent_when_present() {
        let runtime = Arc::new(MockRuntime::default());
        runtime.push_text("web specialist", "found it");

        let task_def = TaskDef::new("search", "search the web").with_agent(AgentSpec::new(
            Model::new("gpt-4o-mini"),
            "web specialist",
            "You are a web search expert.",
        ));

        let runner = TaskRunner::new(
            Model::new("gpt-4o"),
            Arc::clone(&runtime) as Arc<dyn AgentRuntime>,
            Arc::new(NullStatusSink),
        );

        let record = runner
            .run(&task_def, ToolSet::new(), &SymbolTable::new(), &History::default())
            .await
            .unwrap();

        assert_eq!(record.result, "found it");
        assert_eq!(runtime.calls()[0].agent, "web specialist");
    }
}
