//! Bounded conversation history
//!
//! [`History`] records past queries, their subtask results, and final
//! answers. It is bounded: appending beyond `max_items` evicts the oldest
//! entry (FIFO). Only the orchestrator holds a mutable reference; pipeline
//! stages receive read views and return values, so there is no hidden
//! aliasing between stages.
//!
//! The serialized shape (`{ items: [...], max_items }`) is the interchange
//! format used by the on-disk history store.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;

pub const DEFAULT_MAX_ITEMS: usize = 10;

/// One tool invocation extracted from a task run's message trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub tool: String,
    pub args: Value,
    pub result: String,
}

/// Record of a single executed subtask.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub query: String,
    pub result: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_results: Vec<ToolInvocation>,
}

impl TaskRecord {
    pub fn new(query: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            result: result.into(),
            tool_results: Vec::new(),
        }
    }

    pub fn with_tool_results(mut self, tool_results: Vec<ToolInvocation>) -> Self {
        self.tool_results = tool_results;
        self
    }
}

/// One user query with its subtask records and final answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub user_query: String,
    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
    #[serde(default)]
    pub final_result: Option<String>,
}

impl HistoryEntry {
    pub fn new(user_query: impl Into<String>) -> Self {
        Self {
            user_query: user_query.into(),
            tasks: Vec::new(),
            final_result: None,
        }
    }
}

/// Bounded, append-evicting record of past queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct History {
    max_items: usize,
    items: VecDeque<HistoryEntry>,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITEMS)
    }
}

impl History {
    pub fn new(max_items: usize) -> Self {
        Self {
            max_items: max_items.max(1),
            items: VecDeque::new(),
        }
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.items.iter()
    }

    /// Append an entry, evicting the oldest when the bound is exceeded.
    pub fn push(&mut self, entry: HistoryEntry) {
        self.items.push_back(entry);
        while self.items.len() > self.max_items {
            self.items.pop_front();
        }
    }

    /// Start a fresh entry for a new user query.
    pub fn begin(&mut self, user_query: impl Into<String>) {
        self.push(HistoryEntry::new(user_query));
    }

    /// The most recent entry, if any.
    pub fn current(&self) -> Option<&HistoryEntry> {
        self.items.back()
    }

    pub fn current_mut(&mut self) -> Option<&mut HistoryEntry> {
        self.items.back_mut()
    }

    /// Append a task record to the current entry. No-op without one.
    pub fn record_task(&mut self, record: TaskRecord) {
        if let Some(entry) = self.items.back_mut() {
            entry.tasks.push(record);
        }
    }

    /// Set the final answer on the current entry. No-op without one.
    pub fn set_final_result(&mut self, result: impl Into<String>) {
        if let Some(entry) = self.items.back_mut() {
            entry.final_result = Some(result.into());
        }
    }

    /// Compact rendering of finished exchanges, for the analyzer's context.
    pub fn conversation_text(&self) -> String {
        let mut lines = Vec::new();
        for entry in &self.items {
            if let Some(result) = &entry.final_result {
                lines.push(format!("user: {}\nassistant: {}", entry.user_query, result));
            }
        }
        lines.join("\n")
    }

    /// Full rendering including per-task results, for the runner and
    /// aggregator context.
    pub fn task_text(&self) -> String {
        let mut out = String::new();
        for entry in &self.items {
            out.push_str(&format!("query: {}\n", entry.user_query));
            for task in &entry.tasks {
                out.push_str(&format!("  task: {}\n  result: {}\n", task.query, task.result));
            }
            if let Some(result) = &entry.final_result {
                out.push_str(&format!("answer: {}\n", result));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_evicts_oldest() {
        let mut history = History::new(3);
        for i in 0..4 {
            history.begin(format!("query {}", i));
        }

        assert_eq!(history.len(), 3);
        let first = history.iter().next().unwrap();
        assert_eq!(first.user_query, "query 1");
        assert_eq!(history.current().unwrap().user_query, "query 3");
    }

    #[test]
    fn test_record_task_and_final_result() {
        let mut history = History::new(5);
        history.begin("what time is it?");
        history.record_task(TaskRecord::new("get the current time", "12:30"));
        history.set_final_result("It is 12:30.");

        let entry = history.current().unwrap();
        assert_eq!(entry.tasks.len(), 1);
        assert_eq!(entry.tasks[0].result, "12:30");
        assert_eq!(entry.final_result.as_deref(), Some("It is 12:30."));
    }

    #[test]
    fn test_record_task_without_entry_is_noop() {
        let mut history = History::new(5);
        history.record_task(TaskRecord::new("q", "r"));
        history.set_final_result("answer");
        assert!(history.is_empty());
    }

    #[test]
    fn test_max_items_floor_of_one() {
        let mut history = History::new(0);
        history.begin("a");
        history.begin("b");
        assert_eq!(history.len(), 1);
        assert_eq!(history.current().unwrap().user_query, "b");
    }

    #[test]
    fn test_conversation_text_skips_unfinished() {
        let mut history = History::new(5);
        history.begin("first");
        history.set_final_result("done");
        history.begin("second");

        let text = history.conversation_text();
        assert!(text.contains("first"));
        assert!(!text.contains("second"));
    }

    #[test]
    fn test_serde_round_trip() {
        let mut history = History::new(2);
        history.begin("q1");
        history.record_task(
            TaskRecord::new("subtask", "result").with_tool_results(vec![ToolInvocation {
                tool: "get_datetime".to_string(),
                args: serde_json::json!({"format": "%H:%M"}),
                result: "12:30".to_string(),
            }]),
        );
        history.set_final_result("answer");

        let json = serde_json::to_string(&history).unwrap();
        let restored: History = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.max_items(), 2);
        assert_eq!(restored.len(), 1);
        let entry = restored.current().unwrap();
        assert_eq!(entry.tasks[0].tool_results[0].tool, "get_datetime");
        assert_eq!(entry.final_result.as_deref(), Some("answer"));
    }
}
