//! Application layer for conductor
//!
//! This crate defines the ports through which the pipeline talks to the
//! outside world (invocation runtime, script engine, history store, status
//! consumers) and the use cases built on them: the [`TaskUnit`] execution
//! model, the four pipeline stages, and the [`Conductor`] orchestrator.

pub mod orchestrator;
pub mod ports;
pub mod stages;
pub mod task_unit;

#[cfg(test)]
pub(crate) mod testing;

pub use orchestrator::{Conductor, ConductorBuilder, PipelineError};
pub use ports::{
    agent_runtime::{AgentRuntime, ContextSection, RuntimeError, TaskOutput, TraceEvent},
    history_store::{HistoryStore, StoreError},
    script_engine::{ScriptEngine, ScriptError},
    status::{NullStatusSink, StatusSink},
};
pub use stages::{
    aggregator::Aggregator,
    analyzer::QuestionAnalyzer,
    runner::TaskRunner,
    synthesizer::{SynthesisError, Synthesizer},
    tool_planner::ToolPlanner,
};
pub use task_unit::{TaskError, TaskUnit};
