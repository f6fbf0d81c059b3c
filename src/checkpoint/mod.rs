//! Checkpoint ledger - durable record of a multipart session's progress
//!
//! - `memory`: process-local store
//! - `db`: turso-backed store that survives restarts

mod db;
mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CheckpointError;
use crate::planner::{UploadPlan, MAX_PARTS};

pub use db::DbCheckpointStore;
pub use memory::MemoryCheckpointStore;

/// A part the remote store acknowledged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartResult {
    pub number: u32,
    pub integrity_tag: String,
}

impl PartResult {
    pub fn new(number: u32, integrity_tag: impl Into<String>) -> Self {
        Self {
            number,
            integrity_tag: integrity_tag.into(),
        }
    }
}

/// Everything needed to resume a multipart session without in-memory state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub object_key: String,
    pub file_size: u64,
    pub part_size: u64,
    pub upload_id: String,
    pub done_parts: Vec<PartResult>,
    pub file_hash: String,
}

impl Checkpoint {
    pub fn new(
        object_key: impl Into<String>,
        plan: &UploadPlan,
        upload_id: impl Into<String>,
        file_hash: impl Into<String>,
    ) -> Self {
        Self {
            object_key: object_key.into(),
            file_size: plan.file_size,
            part_size: plan.part_size,
            upload_id: upload_id.into(),
            done_parts: Vec::new(),
            file_hash: file_hash.into(),
        }
    }

    /// Record a confirmed part, replacing any earlier entry for the same number.
    pub fn record_part(&mut self, part: PartResult) {
        match self
            .done_parts
            .binary_search_by_key(&part.number, |p| p.number)
        {
            Ok(idx) => self.done_parts[idx] = part,
            Err(idx) => self.done_parts.insert(idx, part),
        }
    }

    pub fn is_done(&self, part_number: u32) -> bool {
        self.done_parts.iter().any(|p| p.number == part_number)
    }

    pub fn plan(&self) -> UploadPlan {
        UploadPlan::multipart(self.file_size, self.part_size)
    }

    /// Whether this checkpoint can continue an upload of `object_key`
    /// whose current content hashes to `file_hash` and is `file_size` long.
    pub fn matches(&self, object_key: &str, file_size: u64, file_hash: &str) -> bool {
        if self.file_hash != file_hash
            || self.file_size != file_size
            || self.object_key != object_key
            || self.part_size == 0
            || self.upload_id.is_empty()
            || self.file_size.div_ceil(self.part_size) > MAX_PARTS
        {
            return false;
        }

        let plan = self.plan();
        self.done_parts.iter().all(|p| plan.contains_part(p.number))
    }

    pub fn to_json(&self) -> Result<String, CheckpointError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a stored record; a broken record reads as absent.
    pub fn from_json(data: &str) -> Option<Self> {
        match serde_json::from_str::<Checkpoint>(data) {
            Ok(mut checkpoint) => {
                checkpoint.done_parts.sort_by_key(|p| p.number);
                checkpoint.done_parts.dedup_by_key(|p| p.number);
                Some(checkpoint)
            }
            Err(e) => {
                log::warn!("Discarding unreadable checkpoint: {}", e);
                None
            }
        }
    }
}

/// Keyed persistence of checkpoints. No business logic lives here.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn save(&self, task_id: &str, checkpoint: &Checkpoint) -> Result<(), CheckpointError>;

    /// Missing, corrupt or unreadable entries all come back as `None`.
    async fn load(&self, task_id: &str) -> Option<Checkpoint>;

    async fn remove(&self, task_id: &str) -> Result<(), CheckpointError>;

    /// Every readable checkpoint, for offering resumable uploads after a restart.
    async fn pending(&self) -> Result<Vec<(String, Checkpoint)>, CheckpointError>;
}
