//! Script engine port
//!
//! Loads persisted generated-tool source into an isolated, sandboxed
//! module and hands back a callable. Vetting is a separate operation so
//! the synthesizer can reject bad source before anything touches disk.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use conductor_domain::{ToolDefinition, ToolHandle};

/// Errors from vetting or loading generated tool source.
#[derive(Error, Debug)]
pub enum ScriptError {
    /// Static inspection rejected the source before execution.
    #[error("Source rejected: {0}")]
    Vetting(String),

    /// The source failed to load or execute.
    #[error("Load failed: {0}")]
    Load(String),

    /// The module loaded but does not define the expected function.
    #[error("Generation contract violation: function '{0}' not found in module")]
    MissingFunction(String),
}

/// Port to the sandboxed script engine.
pub trait ScriptEngine: Send + Sync {
    /// Statically inspect source against the module allow-list and the
    /// forbidden-construct list. Must be called before `load_tool`.
    fn vet_source(&self, code: &str) -> Result<(), ScriptError>;

    /// Load `path` as an isolated module and extract the function named
    /// by `definition.name` as a callable tool. The loader tolerates
    /// hand-edited files as long as that function exists.
    fn load_tool(&self, path: &Path, definition: ToolDefinition) -> Result<Arc<ToolHandle>, ScriptError>;
}
