//! Tool synthesizer
//!
//! Turns a [`ToolRequest`] into an executable, persisted, resolvable tool:
//! code generation through the runtime, static vetting, persistence to
//! `<tools_dir>/<name>.lua`, sandboxed load, and registration into the
//! symbol table.
//!
//! Synthesis is cached by name: a name that already resolves, or whose
//! file already exists on disk, never re-invokes the code-generation
//! agent. Callers treat a synthesis error as a degraded subtask, not a
//! pipeline failure.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use conductor_domain::{
    AgentParams, AgentSpec, History, Model, StagePrompt, SymbolTable, TaskDef, ToolDefinition,
    ToolHandle, ToolParameter, ToolRequest, parse_generated_tool,
};

use crate::ports::agent_runtime::AgentRuntime;
use crate::ports::script_engine::{ScriptEngine, ScriptError};
use crate::ports::status::StatusSink;
use crate::stages::{TOOL_CODER_AGENT, tool_inventory_section};
use crate::task_unit::{TaskError, TaskUnit};

/// Lua modules generated tools are allowed to require.
pub const ALLOWED_MODULES: &[&str] = &["string", "table", "math", "os", "io", "json"];

/// Errors from one synthesis attempt.
#[derive(Error, Debug)]
pub enum SynthesisError {
    /// The code-generation agent did not produce a usable tool.
    #[error("Code generation failed: {0}")]
    Generation(String),

    /// The generated function name does not match the request.
    #[error("Generated tool named '{actual}', expected '{expected}'")]
    NameMismatch { expected: String, actual: String },

    /// Vetting, loading, or symbol extraction failed.
    #[error(transparent)]
    Script(#[from] ScriptError),

    /// Writing the tool file failed.
    #[error("Failed to persist tool: {0}")]
    Persist(#[from] std::io::Error),

    /// The code-generation agent call itself failed.
    #[error(transparent)]
    Task(#[from] TaskError),
}

impl From<SynthesisError> for TaskError {
    fn from(error: SynthesisError) -> Self {
        match error {
            SynthesisError::Task(task) => task,
            other => TaskError::Synthesis(other.to_string()),
        }
    }
}

pub struct Synthesizer {
    model: Model,
    runtime: Arc<dyn AgentRuntime>,
    engine: Arc<dyn ScriptEngine>,
    status: Arc<dyn StatusSink>,
    tools_dir: PathBuf,
    cache_dir: PathBuf,
}

impl Synthesizer {
    pub fn new(
        model: Model,
        runtime: Arc<dyn AgentRuntime>,
        engine: Arc<dyn ScriptEngine>,
        status: Arc<dyn StatusSink>,
        tools_dir: PathBuf,
        cache_dir: PathBuf,
    ) -> Self {
        Self {
            model,
            runtime,
            engine,
            status,
            tools_dir,
            cache_dir,
        }
    }

    /// Path of the persisted file for a tool name.
    pub fn tool_path(&self, name: &str) -> PathBuf {
        self.tools_dir.join(format!("{}.lua", name))
    }

    /// Synthesize (or recover) the tool described by `request` and
    /// register it into `symbols`.
    pub async fn synthesize(
        &self,
        request: &ToolRequest,
        symbols: &mut SymbolTable,
        history: &History,
    ) -> Result<Arc<ToolHandle>, SynthesisError> {
        // Cache by name: an existing binding wins outright.
        if let Some(handle) = symbols.get(&request.tool_name) {
            debug!(tool = %request.tool_name, "Synthesis skipped: name already resolves");
            return Ok(handle);
        }

        // A file from an earlier run is reloaded, not regenerated.
        let path = self.tool_path(&request.tool_name);
        if path.exists() {
            debug!(tool = %request.tool_name, "Synthesis skipped: persisted file found");
            let handle = self.load_and_register(&path, request, None, symbols)?;
            return Ok(handle);
        }

        let generated = self.generate(request, symbols, history).await?;
        if generated.name != request.tool_name {
            return Err(SynthesisError::NameMismatch {
                expected: request.tool_name.clone(),
                actual: generated.name,
            });
        }

        // Vet before anything touches disk.
        self.engine.vet_source(&generated.code)?;

        std::fs::create_dir_all(&self.tools_dir)?;
        std::fs::write(&path, &generated.code)?;
        info!(tool = %request.tool_name, path = %path.display(), "Tool persisted");

        let description = if generated.description.is_empty() {
            None
        } else {
            Some(generated.description.as_str())
        };
        self.load_and_register(&path, request, description, symbols)
    }

    /// Run the code-generation agent for `request`.
    async fn generate(
        &self,
        request: &ToolRequest,
        symbols: &SymbolTable,
        history: &History,
    ) -> Result<conductor_domain::GeneratedTool, SynthesisError> {
        let agent = AgentSpec::new(
            self.model.clone(),
            TOOL_CODER_AGENT,
            StagePrompt::tool_coder(ALLOWED_MODULES, &self.cache_dir.to_string_lossy()),
        )
        .with_params(AgentParams::json().with_retries(3));

        let stage_def = TaskDef::new("tool_request", "Write the tool function for this request");
        let unit = TaskUnit::new(
            stage_def,
            Some(agent),
            None,
            &SymbolTable::new(),
            Arc::clone(&self.runtime),
            Arc::clone(&self.status),
        )?;

        let request_json = serde_json::to_string(request)
            .map_err(|e| SynthesisError::Generation(e.to_string()))?;
        let sections = [tool_inventory_section(&symbols.names())];
        let output = unit.run(history, Some(&request_json), &sections).await?;

        parse_generated_tool(&output.text, Some(&request.tool_name)).ok_or_else(|| {
            SynthesisError::Generation(format!(
                "No tool definition in response for '{}'",
                request.tool_name
            ))
        })
    }

    fn load_and_register(
        &self,
        path: &Path,
        request: &ToolRequest,
        description: Option<&str>,
        symbols: &mut SymbolTable,
    ) -> Result<Arc<ToolHandle>, SynthesisError> {
        let definition =
            definition_from_request(request, description.unwrap_or(&request.description));
        let handle = self.engine.load_tool(path, definition)?;
        symbols.register_replace(Arc::clone(&handle));
        Ok(handle)
    }
}

/// Build the tool definition implied by a request: positional args are
/// required strings, kwargs are optional with their defaults noted.
pub fn definition_from_request(request: &ToolRequest, description: &str) -> ToolDefinition {
    let mut definition = ToolDefinition::new(&request.tool_name, description);
    for arg in &request.args {
        definition = definition.with_parameter(ToolParameter::new(arg, "", true));
    }
    for (name, default) in &request.kwargs {
        definition = definition
            .with_parameter(ToolParameter::new(name, format!("default: {}", default), false));
    }
    definition
}
