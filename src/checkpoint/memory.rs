use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{Checkpoint, CheckpointStore};
use crate::error::CheckpointError;

/// Process-local checkpoint store. Entries are kept as serialized JSON so
/// they go through the same encode/decode path as the durable store.
#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw record as-is, bypassing encoding.
    pub fn insert_raw(&self, task_id: &str, data: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(task_id.to_string(), data.to_string());
        }
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn save(&self, task_id: &str, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        let data = checkpoint.to_json()?;
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| CheckpointError::Database(e.to_string()))?;
        entries.insert(task_id.to_string(), data);
        Ok(())
    }

    async fn load(&self, task_id: &str) -> Option<Checkpoint> {
        let data = {
            let entries = self.entries.lock().ok()?;
            entries.get(task_id)?.clone()
        };
        Checkpoint::from_json(&data)
    }

    async fn remove(&self, task_id: &str) -> Result<(), CheckpointError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| CheckpointError::Database(e.to_string()))?;
        entries.remove(task_id);
        Ok(())
    }

    async fn pending(&self) -> Result<Vec<(String, Checkpoint)>, CheckpointError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| CheckpointError::Database(e.to_string()))?;
        let mut pending: Vec<(String, Checkpoint)> = entries
            .iter()
            .filter_map(|(id, data)| Checkpoint::from_json(data).map(|c| (id.clone(), c)))
            .collect();
        pending.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(pending)
    }
}
