//! The four fixed pipeline stages
//!
//! Each stage is a specialized [`TaskUnit`](crate::task_unit::TaskUnit)
//! configuration: a fixed system prompt, a result-shape contract, and the
//! dynamic context sections the stage needs. Stages receive read views of
//! the history and return values; they never mutate shared state.

pub mod aggregator;
pub mod analyzer;
pub mod runner;
pub mod synthesizer;
pub mod tool_planner;

use conductor_domain::History;

use crate::ports::agent_runtime::ContextSection;

/// Agent display names, used to key status events and logs.
pub const ANALYZER_AGENT: &str = "question analyzer";
pub const TOOL_PLANNER_AGENT: &str = "tool planner";
pub const TOOL_CODER_AGENT: &str = "tool coder";
pub const TASK_SOLVER_AGENT: &str = "task solver";
pub const AGGREGATOR_AGENT: &str = "aggregator";

/// Section carrying the finished-exchange view of the conversation.
pub(crate) fn conversation_section(history: &History) -> ContextSection {
    let text = history.conversation_text();
    let body = if text.is_empty() { "(none)".to_string() } else { text };
    ContextSection::new("Conversation history", body)
}

/// Section carrying the full per-task view of the history.
pub(crate) fn task_history_section(history: &History) -> ContextSection {
    let text = history.task_text();
    let body = if text.is_empty() { "(none)".to_string() } else { text };
    ContextSection::new("Task history", body)
}

/// Section carrying the current wall-clock date and time.
pub(crate) fn current_date_section() -> ContextSection {
    ContextSection::new(
        "Current date and time",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

/// Section listing every resolvable tool name.
pub(crate) fn tool_inventory_section(names: &[&str]) -> ContextSection {
    let body = if names.is_empty() {
        "(none)".to_string()
    } else {
        names.join(", ")
    };
    ContextSection::new("Available tools", body)
}
