//! Task definitions and status events
//!
//! A [`TaskDef`] is the declarative description of one unit of work: the
//! query an agent should execute, its scheduling priority, and optionally
//! the agent and toolset to run it with. Task definitions are produced by
//! the analyzer stage and consumed by the runner stage.

use serde::{Deserialize, Serialize};

use crate::agent::AgentSpec;
use crate::core::error::DomainError;
use crate::tool::set::ToolSet;

/// Scheduling priority in `1..=10`. Lower values execute first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(u8);

impl Priority {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn new(value: u8) -> Result<Self, DomainError> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(DomainError::InvalidPriority(value));
        }
        Ok(Self(value))
    }

    /// Clamp an arbitrary integer into the valid range. Used when parsing
    /// model output, where out-of-range values are corrected rather than
    /// rejected.
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(Self::MIN as i64, Self::MAX as i64) as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self(5)
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Declarative description of one unit of work.
///
/// The `query` field is a command for an agent, not a question to answer
/// about. `agent` and `toolset` may be omitted here and supplied when the
/// task unit is constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDef {
    pub name: String,
    pub query: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toolset: Option<ToolSet>,
}

impl TaskDef {
    pub fn new(name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            query: query.into(),
            priority: Priority::default(),
            agent: None,
            toolset: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_agent(mut self, agent: AgentSpec) -> Self {
        self.agent = Some(agent);
        self
    }

    pub fn with_toolset(mut self, toolset: ToolSet) -> Self {
        self.toolset = Some(toolset);
        self
    }

    /// Sort a batch of definitions into execution order (priority ascending).
    pub fn sort_by_priority(defs: &mut [TaskDef]) {
        defs.sort_by_key(|d| d.priority);
    }
}

/// Lifecycle state of a running task unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskState::Pending => "pending",
            TaskState::Running => "running",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Status event emitted at task boundaries.
///
/// `progress` is a best-effort percentage; consumers must tolerate `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub task: String,
    pub state: TaskState,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
}

impl StatusUpdate {
    pub fn new(task: impl Into<String>, state: TaskState, message: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            state,
            message: message.into(),
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress.min(100));
        self
    }
}
