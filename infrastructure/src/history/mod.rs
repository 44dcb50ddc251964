//! JSON history persistence
//!
//! Saves the bounded history to a single JSON document after each query
//! and restores it at startup. Shape matches the domain serialization:
//! `{ "max_items": N, "items": [...] }`.

use std::path::PathBuf;

use tracing::debug;

use conductor_application::ports::history_store::{HistoryStore, StoreError};
use conductor_domain::History;

pub struct JsonHistoryStore {
    path: PathBuf,
}

impl JsonHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl HistoryStore for JsonHistoryStore {
    fn save(&self, history: &History) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(history)?;
        std::fs::write(&self.path, json)?;
        debug!(path = %self.path.display(), entries = history.len(), "History saved");
        Ok(())
    }

    fn load(&self) -> Result<Option<History>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&self.path)?;
        let history = serde_json::from_str(&json)?;
        Ok(Some(history))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conductor_domain::TaskRecord;

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonHistoryStore::new(dir.path().join("state").join("history.json"));

        let mut history = History::new(5);
        history.begin("what time is it?");
        history.record_task(TaskRecord::new("get the current time", "12:30"));
        history.set_final_result("It is 12:30.");

        store.save(&history).unwrap();
        let restored = store.load().unwrap().unwrap();

        assert_eq!(restored.len(), 1);
        assert_eq!(restored.max_items(), 5);
        let entry = restored.current().unwrap();
        assert_eq!(entry.user_query, "what time is it?");
        assert_eq!(entry.final_result.as_deref(), Some("It is 12:30."));
    }

    #[test]
    fn test_load_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonHistoryStore::new(dir.path().join("absent.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_load_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "not json at all").unwrap();

        let store = JsonHistoryStore::new(path);
        assert!(matches!(store.load(), Err(StoreError::Serde(_))));
    }
}
