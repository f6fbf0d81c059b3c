use tokio_util::sync::CancellationToken;

use super::{UploadCoordinator, UploadState};
use crate::checkpoint::Checkpoint;
use crate::error::UploadResult;
use crate::planner::UploadPlan;
use crate::task::UploadTask;

impl UploadCoordinator {
    /// Reuse the stored checkpoint when it still describes this file, else
    /// initiate a new remote session and persist its first checkpoint.
    ///
    /// Returns `None` when the attempt was interrupted before a session was
    /// opened. Once `initiate` is sent it is allowed to finish so the new
    /// upload id always lands in the ledger.
    pub(super) async fn open_session(
        &self,
        task: &UploadTask,
        plan: UploadPlan,
        file_hash: String,
        cancel: &CancellationToken,
    ) -> UploadResult<Option<Checkpoint>> {
        let file_size = task.source.size();

        match self.checkpoints.load(&self.task_id).await {
            Some(checkpoint) if checkpoint.matches(&task.object_key, file_size, &file_hash) => {
                self.advance(UploadState::Resuming);
                log::info!(
                    "multipart_resume: {} upload_id={} done_parts={}",
                    self.task_id,
                    checkpoint.upload_id,
                    checkpoint.done_parts.len()
                );
                return Ok(Some(checkpoint));
            }
            Some(stale) => self.discard_stale(stale).await,
            None => {}
        }

        if cancel.is_cancelled() || !self.advance(UploadState::Starting) {
            return Ok(None);
        }

        let upload_id = self
            .store
            .initiate(&task.object_key, &task.object_meta())
            .await?;
        let checkpoint = Checkpoint::new(&task.object_key, &plan, upload_id, file_hash);
        self.persist(&checkpoint).await;

        log::info!(
            "multipart_initiated: {} upload_id={} parts={} part_size={}",
            self.task_id,
            checkpoint.upload_id,
            plan.part_count,
            plan.part_size
        );
        Ok(Some(checkpoint))
    }

    /// Drop a checkpoint that no longer matches the file and release its
    /// remote session. Failures are logged only.
    pub(super) async fn discard_stale(&self, stale: Checkpoint) {
        log::info!(
            "Discarding stale checkpoint for {} (upload_id={})",
            self.task_id,
            stale.upload_id
        );

        if let Err(e) = self.checkpoints.remove(&self.task_id).await {
            log::warn!("Failed to remove stale checkpoint for {}: {}", self.task_id, e);
        }

        if stale.upload_id.is_empty() {
            return;
        }
        if let Err(e) = self
            .store
            .abort_upload(&stale.object_key, &stale.upload_id)
            .await
        {
            log::warn!(
                "Failed to abort stale multipart upload {}: {}",
                stale.upload_id,
                e
            );
        }
    }

    /// Save the checkpoint. A failed save costs resumability, not the upload.
    pub(super) async fn persist(&self, checkpoint: &Checkpoint) {
        if let Err(e) = self.checkpoints.save(&self.task_id, checkpoint).await {
            log::warn!("Failed to save checkpoint for {}: {}", self.task_id, e);
        }
    }
}
