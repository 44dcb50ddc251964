//! Aggregator stage
//!
//! Synthesizes the single final answer from the full record of the
//! current query: subtask results, tool outputs, and failures.

use std::sync::Arc;

use conductor_domain::{AgentSpec, History, Model, StagePrompt, SymbolTable, TaskDef};

use crate::ports::agent_runtime::AgentRuntime;
use crate::ports::status::StatusSink;
use crate::stages::{AGGREGATOR_AGENT, task_history_section};
use crate::task_unit::{TaskError, TaskUnit};

pub struct Aggregator {
    model: Model,
    runtime: Arc<dyn AgentRuntime>,
    status: Arc<dyn StatusSink>,
}

impl Aggregator {
    pub fn new(model: Model, runtime: Arc<dyn AgentRuntime>, status: Arc<dyn StatusSink>) -> Self {
        Self { model, runtime, status }
    }

    /// Produce the final natural-language answer for the current entry.
    pub async fn aggregate(&self, history: &History) -> Result<String, TaskError> {
        let agent = AgentSpec::new(
            self.model.clone(),
            AGGREGATOR_AGENT,
            StagePrompt::aggregator(),
        );

        let user_query = history
            .current()
            .map(|entry| entry.user_query.clone())
            .unwrap_or_default();

        let task_def = TaskDef::new(
            "aggregation",
            format!(
                "Compose the final answer to the user's query from the recorded task results. Query: {}",
                user_query
            ),
        );

        let unit = TaskUnit::new(
            task_def,
            Some(agent),
            None,
            &SymbolTable::new(),
            Arc::clone(&self.runtime),
            Arc::clone(&self.status),
        )?;

        let sections = [task_history_section(history)];
        let output = unit.run(history, None, &sections).await?;
        Ok(output.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::status::NullStatusSink;
    use crate::testing::MockRuntime;
    use conductor_domain::TaskRecord;

    #[tokio::test]
    async fn test_aggregate_returns_final_text() {
        let runtime = Arc::new(MockRuntime::default());
        runtime.push_text(AGGREGATOR_AGENT, "It is 12:30.");

        let mut history = History::default();
        history.begin("what time is it?");
        history.record_task(TaskRecord::new("get the current time", "12:30"));

        let aggregator = Aggregator::new(
            Model::new("gpt-4o"),
            Arc::clone(&runtime) as Arc<dyn AgentRuntime>,
            Arc::new(NullStatusSink),
        );

        let answer = aggregator.aggregate(&history).await.unwrap();
        assert_eq!(answer, "It is 12:30.");

        // The user's query is embedded in the stage query, and the task
        // history rides along as a section.
        let call = &runtime.calls()[0];
        assert!(call.prompt.contains("what time is it?"));
        assert!(call.section_titles.contains(&"Task history".to_string()));
    }
}
