//! Ordered, deduplicated tool collections
//!
//! A [`ToolSet`] is an insertion-ordered sequence of [`ToolEntry`] values,
//! unique by name. Two add semantics coexist and are chosen per call site:
//!
//! - **strict** (`insert_*`): re-adding an existing name is a
//!   [`ToolSetError::DuplicateTool`] error. Used at explicit construction
//!   time to catch configuration mistakes early.
//! - **replace** (`insert_or_replace_*`, the `|` union): the second
//!   insertion wins. Used for mid-flow tool injection, where a freshly
//!   synthesized tool may legitimately shadow an earlier binding.
//!
//! Entries created from a live [`ToolHandle`] carry their binding inline;
//! entries created from a bare name resolve lazily against the
//! [`SymbolTable`](super::symbols::SymbolTable) at materialization time.
//! A set serializes to a plain name list.

use std::sync::Arc;

use serde::de::{SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use super::handle::ToolHandle;
use super::symbols::SymbolTable;

/// Errors raised by tool collections and resolution.
#[derive(Debug, Error)]
pub enum ToolSetError {
    /// Strict insertion encountered an existing name.
    #[error("Duplicate tool: {0}")]
    DuplicateTool(String),

    /// `remove` was asked for a name that is not in the set.
    #[error("Tool not in set: {0}")]
    MissingTool(String),

    /// A name could not be resolved in any reachable namespace.
    #[error("Tool not found: {0}")]
    Unresolved(String),

    /// A tool name is empty or not a valid identifier.
    #[error("Invalid tool name: {0:?}")]
    InvalidName(String),
}

/// One member of a [`ToolSet`]: a name, optionally with an inline binding.
#[derive(Debug, Clone)]
pub struct ToolEntry {
    name: String,
    binding: Option<Arc<ToolHandle>>,
}

impl ToolEntry {
    pub fn named(name: impl Into<String>) -> Result<Self, ToolSetError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ToolSetError::InvalidName(name));
        }
        Ok(Self { name, binding: None })
    }

    pub fn bound(handle: Arc<ToolHandle>) -> Self {
        Self {
            name: handle.name().to_string(),
            binding: Some(handle),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn binding(&self) -> Option<&Arc<ToolHandle>> {
        self.binding.as_ref()
    }

    /// Resolve to a callable: inline binding first, then the symbol table.
    pub fn resolve(&self, symbols: &SymbolTable) -> Result<Arc<ToolHandle>, ToolSetError> {
        if let Some(handle) = &self.binding {
            return Ok(Arc::clone(handle));
        }
        symbols
            .get(&self.name)
            .ok_or_else(|| ToolSetError::Unresolved(self.name.clone()))
    }
}

/// Insertion-ordered collection of tools, unique by name.
#[derive(Debug, Clone, Default)]
pub struct ToolSet {
    entries: Vec<ToolEntry>,
}

impl ToolSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from bare names, strict on duplicates.
    pub fn from_names<I, S>(names: I) -> Result<Self, ToolSetError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for name in names {
            set.insert(ToolEntry::named(name)?)?;
        }
        Ok(set)
    }

    /// Build a set from live handles, strict on duplicates.
    pub fn from_handles<I>(handles: I) -> Result<Self, ToolSetError>
    where
        I: IntoIterator<Item = Arc<ToolHandle>>,
    {
        let mut set = Self::new();
        for handle in handles {
            set.insert(ToolEntry::bound(handle))?;
        }
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Ordered names, for prompt injection.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolEntry> {
        self.entries.iter()
    }

    /// Strict insertion: errors when the name is already present.
    pub fn insert(&mut self, entry: ToolEntry) -> Result<(), ToolSetError> {
        if self.contains(entry.name()) {
            return Err(ToolSetError::DuplicateTool(entry.name().to_string()));
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn insert_name(&mut self, name: impl Into<String>) -> Result<(), ToolSetError> {
        self.insert(ToolEntry::named(name)?)
    }

    pub fn insert_handle(&mut self, handle: Arc<ToolHandle>) -> Result<(), ToolSetError> {
        self.insert(ToolEntry::bound(handle))
    }

    /// Replace insertion: an existing entry with the same name is
    /// overwritten in place, keeping its position.
    pub fn insert_or_replace(&mut self, entry: ToolEntry) {
        if let Some(existing) = self.entries.iter_mut().find(|e| e.name == entry.name) {
            *existing = entry;
        } else {
            self.entries.push(entry);
        }
    }

    pub fn insert_or_replace_handle(&mut self, handle: Arc<ToolHandle>) {
        self.insert_or_replace(ToolEntry::bound(handle));
    }

    /// Remove an entry by name; missing names are an error.
    pub fn remove(&mut self, name: &str) -> Result<ToolEntry, ToolSetError> {
        let index = self
            .entries
            .iter()
            .position(|e| e.name == name)
            .ok_or_else(|| ToolSetError::MissingTool(name.to_string()))?;
        Ok(self.entries.remove(index))
    }

    /// Resolve one member by name; `None` when the name is not in the set
    /// or cannot be resolved.
    pub fn get(&self, name: &str, symbols: &SymbolTable) -> Option<Arc<ToolHandle>> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .and_then(|e| e.resolve(symbols).ok())
    }

    /// Resolve every member. Fails on the first unresolvable name.
    pub fn materialize(&self, symbols: &SymbolTable) -> Result<Vec<Arc<ToolHandle>>, ToolSetError> {
        self.entries.iter().map(|e| e.resolve(symbols)).collect()
    }

    /// Union with replace semantics: right operand wins on shared names.
    pub fn union(mut self, other: &ToolSet) -> ToolSet {
        for entry in &other.entries {
            self.insert_or_replace(entry.clone());
        }
        self
    }
}

impl std::ops::BitOr<&ToolSet> for ToolSet {
    type Output = ToolSet;

    fn bitor(self, rhs: &ToolSet) -> ToolSet {
        self.union(rhs)
    }
}

impl Serialize for ToolSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.entries.len()))?;
        for entry in &self.entries {
            seq.serialize_element(entry.name())?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for ToolSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NameListVisitor;

        impl<'de> Visitor<'de> for NameListVisitor {
            type Value = ToolSet;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a list of tool names")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<ToolSet, A::Error> {
                let mut set = ToolSet::new();
                while let Some(name) = seq.next_element::<String>()? {
                    let entry = ToolEntry::named(name).map_err(serde::de::Error::custom)?;
                    // Interchange data may repeat a name; last write wins.
                    set.insert_or_replace(entry);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_seq(NameListVisitor)
    }
}
