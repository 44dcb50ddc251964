//! Tool planner stage
//!
//! Given one subtask and the inventory of resolvable tool names, selects
//! the existing tools to bind and proposes synthesis requests only for
//! genuine gaps. Names the model invents are dropped here; requests are
//! handed to the synthesizer by the orchestrator.

use std::sync::Arc;

use tracing::warn;

use conductor_domain::{
    AgentParams, AgentSpec, History, Model, StagePrompt, SymbolTable, TaskDef, ToolEntry,
    ToolPlan, ToolSet, parse_tool_plan,
};

use crate::ports::agent_runtime::AgentRuntime;
use crate::ports::status::StatusSink;
use crate::stages::{TOOL_PLANNER_AGENT, tool_inventory_section};
use crate::task_unit::{TaskError, TaskUnit};

pub struct ToolPlanner {
    model: Model,
    runtime: Arc<dyn AgentRuntime>,
    status: Arc<dyn StatusSink>,
}

impl ToolPlanner {
    pub fn new(model: Model, runtime: Arc<dyn AgentRuntime>, status: Arc<dyn StatusSink>) -> Self {
        Self { model, runtime, status }
    }

    /// Plan the toolset for one subtask.
    ///
    /// An unparseable reply degrades to the empty plan: a subtask without
    /// tools can still run on pure reasoning.
    pub async fn plan(
        &self,
        task_def: &TaskDef,
        symbols: &SymbolTable,
        history: &History,
    ) -> Result<ToolPlan, TaskError> {
        let agent = AgentSpec::new(
            self.model.clone(),
            TOOL_PLANNER_AGENT,
            StagePrompt::tool_planner(),
        )
        .with_params(AgentParams::json());

        let stage_def = TaskDef::new(
            "tool_planning",
            format!("Select or create tools for this task: {}", task_def.query),
        );

        let unit = TaskUnit::new(
            stage_def,
            Some(agent),
            None,
            &SymbolTable::new(),
            Arc::clone(&self.runtime),
            Arc::clone(&self.status),
        )?;

        let sections = [tool_inventory_section(&symbols.names())];
        let output = unit.run(history, None, &sections).await?;

        let Some(plan) = parse_tool_plan(&output.text) else {
            warn!(task = %task_def.name, "Tool planner reply was not a plan; using no tools");
            return Ok(ToolPlan::empty());
        };

        Ok(Self::retain_known(plan, symbols, &task_def.name))
    }

    /// Keep only toolset names that actually resolve; requests pass
    /// through untouched.
    fn retain_known(plan: ToolPlan, symbols: &SymbolTable, task: &str) -> ToolPlan {
        let mut toolset = ToolSet::new();
        for name in plan.toolset.names() {
            if symbols.contains(name) {
                if let Ok(entry) = ToolEntry::named(name) {
                    toolset.insert_or_replace(entry);
                }
            } else {
                warn!(task, tool = name, "Planner selected unknown tool; dropped");
            }
        }
        ToolPlan {
            toolset,
            tool_requests: plan.tool_requests,
        }
    }
}
