//! Question analyzer stage
//!
//! Decomposes a user query into prioritized subtask definitions, or
//! decides that none are needed. The verdict is a tagged union; a direct
//! textual answer is legal and treated by the orchestrator as a
//! zero-subtask run.

use std::sync::Arc;

use conductor_domain::{
    AgentParams, AgentSpec, Analysis, History, Model, StagePrompt, SymbolTable, TaskDef,
    parse_analysis,
};

use crate::ports::agent_runtime::AgentRuntime;
use crate::ports::status::StatusSink;
use crate::stages::{ANALYZER_AGENT, conversation_section, current_date_section};
use crate::task_unit::{TaskError, TaskUnit};

pub struct QuestionAnalyzer {
    model: Model,
    runtime: Arc<dyn AgentRuntime>,
    status: Arc<dyn StatusSink>,
}

impl QuestionAnalyzer {
    pub fn new(model: Model, runtime: Arc<dyn AgentRuntime>, status: Arc<dyn StatusSink>) -> Self {
        Self { model, runtime, status }
    }

    /// Analyze `query` against the conversation history.
    ///
    /// Decomposed verdicts come back sorted ascending by priority.
    pub async fn analyze(&self, query: &str, history: &History) -> Result<Analysis, TaskError> {
        let agent = AgentSpec::new(self.model.clone(), ANALYZER_AGENT, StagePrompt::analyzer())
            .with_params(AgentParams::json());
        let task_def = TaskDef::new(
            "task_analysis",
            "Analyze the query and produce the subtask list. Query",
        );

        let unit = TaskUnit::new(
            task_def,
            Some(agent),
            None,
            &SymbolTable::new(),
            Arc::clone(&self.runtime),
            Arc::clone(&self.status),
        )?;

        let sections = [conversation_section(history), current_date_section()];
        let output = unit.run(history, Some(query), &sections).await?;

        Ok(parse_analysis(&output.text))
    }

    pub fn analyze_sync(&self, query: &str, history: &History) -> Result<Analysis, TaskError> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                crate::ports::agent_runtime::RuntimeError::Transport(format!(
                    "Failed to create runtime: {}",
                    e
                ))
            })?;
        rt.block_on(self.analyze(query, history))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::status::NullStatusSink;
    use crate::testing::MockRuntime;

    fn analyzer(runtime: Arc<MockRuntime>) -> QuestionAnalyzer {
        QuestionAnalyzer::new(Model::new("gpt-4o"), runtime, Arc::new(NullStatusSink))
    }

    #[tokio::test]
    async fn test_analyze_decomposes_and_sorts() {
        let runtime = Arc::new(MockRuntime::default());
        runtime.push_text(
            ANALYZER_AGENT,
            r#"[
                {"name": "b", "query": "second step", "priority": 4},
                {"name": "a", "query": "first step", "priority": 2}
            ]"#,
        );

        let verdict = analyzer(Arc::clone(&runtime))
            .analyze("do the thing", &History::default())
            .await
            .unwrap();

        let Analysis::Decomposed(tasks) = verdict else {
            panic!("expected decomposed verdict");
        };
        assert_eq!(tasks[0].name, "a");
        assert_eq!(tasks[1].name, "b");

        // Query text is appended to the fixed stage query.
        let prompts = runtime.prompts();
        assert!(prompts[0].ends_with(": do the thing"));
    }

    #[tokio::test]
    async fn test_analyze_empty_for_greeting() {
        let runtime = Arc::new(MockRuntime::default());
        runtime.push_text(ANALYZER_AGENT, "[]");

        let verdict = analyzer(runtime)
            .analyze("Hello!", &History::default())
            .await
            .unwrap();
        assert!(verdict.is_empty());
    }

    #[tokio::test]
    async fn test_analyze_includes_history_and_date_sections() {
        let runtime = Arc::new(MockRuntime::default());
        runtime.push_text(ANALYZER_AGENT, "[]");

        analyzer(Arc::clone(&runtime))
            .analyze("hi", &History::default())
            .await
            .unwrap();

        let call = &runtime.calls()[0];
        assert!(call.section_titles.contains(&"Conversation history".to_string()));
        assert!(call.section_titles.contains(&"Current date and time".to_string()));
    }
}
