//! History persistence port
//!
//! Persistence is a collaborator, not a core concern: the orchestrator
//! saves through this port after each query when a store is configured,
//! and a save failure is logged rather than surfaced to the caller.

use thiserror::Error;

use conductor_domain::History;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Port for persisting conversation history between runs.
pub trait HistoryStore: Send + Sync {
    fn save(&self, history: &History) -> Result<(), StoreError>;

    /// Load the persisted history, or `None` when nothing was saved yet.
    fn load(&self) -> Result<Option<History>, StoreError>;
}
