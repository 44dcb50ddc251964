//! Stage result types
//!
//! The analyzer's verdict is a tagged union rather than a loose sum of
//! `list | none | string`: callers switch on the variant.

use crate::task::TaskDef;
use crate::tool::request::ToolRequest;
use crate::tool::set::ToolSet;

pub mod parser;

/// Verdict of the question analyzer.
#[derive(Debug, Clone)]
pub enum Analysis {
    /// The query needs no subtasks (greetings, small talk).
    Empty,
    /// The analyzer answered directly; treated as a zero-subtask run whose
    /// text is recorded for the aggregator.
    Direct(String),
    /// Prioritized subtask definitions, sorted ascending by priority.
    Decomposed(Vec<TaskDef>),
}

impl Analysis {
    pub fn is_empty(&self) -> bool {
        matches!(self, Analysis::Empty)
    }

    pub fn task_count(&self) -> usize {
        match self {
            Analysis::Decomposed(tasks) => tasks.len(),
            _ => 0,
        }
    }
}

/// Result of the tool planner stage: existing tools to bind, plus
/// requests for capabilities that must be synthesized first.
#[derive(Debug, Clone, Default)]
pub struct ToolPlan {
    pub toolset: ToolSet,
    pub tool_requests: Vec<ToolRequest>,
}

impl ToolPlan {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.toolset.is_empty() && self.tool_requests.is_empty()
    }
}
