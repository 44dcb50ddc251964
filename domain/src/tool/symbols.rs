//! Explicit symbol table for tool resolution
//!
//! Bare tool names resolve against this table and nothing else. It is
//! built once at startup (builtin tools plus previously generated tools)
//! and passed explicitly to every resolution call; no ambient namespace
//! or call-stack introspection is ever consulted.

use std::sync::Arc;

use super::handle::ToolHandle;
use super::set::ToolSetError;

/// Insertion-ordered mapping of tool name to callable.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    handles: Vec<Arc<ToolHandle>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handles.iter().any(|h| h.name() == name)
    }

    /// Ordered names, for the "these tools exist" prompt section.
    pub fn names(&self) -> Vec<&str> {
        self.handles.iter().map(|h| h.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ToolHandle>> {
        self.handles.iter()
    }

    /// Strict registration: duplicate names are configuration mistakes.
    pub fn register(&mut self, handle: Arc<ToolHandle>) -> Result<(), ToolSetError> {
        if self.contains(handle.name()) {
            return Err(ToolSetError::DuplicateTool(handle.name().to_string()));
        }
        self.handles.push(handle);
        Ok(())
    }

    /// Replace registration: used when a synthesized tool is injected
    /// mid-flow and may shadow an earlier load of the same file.
    pub fn register_replace(&mut self, handle: Arc<ToolHandle>) {
        if let Some(existing) = self.handles.iter_mut().find(|h| h.name() == handle.name()) {
            *existing = handle;
        } else {
            self.handles.push(handle);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<ToolHandle>> {
        self.handles.iter().find(|h| h.name() == name).map(Arc::clone)
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<ToolHandle>, ToolSetError> {
        self.get(name).ok_or_else(|| ToolSetError::Unresolved(name.to_string()))
    }

    /// Snapshot of the plain (non-contextual) tools. Injected into the
    /// namespace of generated tool modules so they can call builtins.
    pub fn plain_snapshot(&self) -> Vec<Arc<ToolHandle>> {
        self.handles
            .iter()
            .filter(|h| !h.is_contextual())
            .map(Arc::clone)
            .collect()
    }
}
