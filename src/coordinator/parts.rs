use futures_util::stream::{FuturesUnordered, StreamExt};
use std::collections::VecDeque;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::{UploadCoordinator, UploadState};
use crate::checkpoint::{Checkpoint, PartResult};
use crate::config::UploadConfig;
use crate::error::{UploadError, UploadResult};
use crate::planner::UploadPlan;
use crate::progress::ProgressTracker;
use crate::task::{CompletedUpload, UploadOutcome, UploadTask};
use crate::worker::PartUploadWorker;

impl UploadCoordinator {
    /// Upload every part the checkpoint does not have yet, at most
    /// `config.parallel` at a time, then complete the session.
    pub(super) async fn upload_parts(
        &self,
        task: &UploadTask,
        config: &UploadConfig,
        mut checkpoint: Checkpoint,
        cancel: &CancellationToken,
    ) -> UploadResult<UploadOutcome> {
        // Part boundaries come from the checkpoint so a resumed session
        // keeps the part size it was started with
        let plan = checkpoint.plan();
        let upload_id = checkpoint.upload_id.clone();
        let worker = PartUploadWorker::new(self.store.clone(), cancel.clone());

        let mut pending: VecDeque<u32> = (1..=plan.part_count)
            .filter(|n| !checkpoint.is_done(*n))
            .collect();
        let mut confirmed = plan.bytes_for(checkpoint.done_parts.iter().map(|p| p.number));

        let mut progress = ProgressTracker::new(
            &self.task_id,
            task.on_progress.as_ref(),
            plan.file_size,
            plan.part_count,
            confirmed,
        );
        if confirmed > 0 {
            progress.report(confirmed, checkpoint.done_parts.len() as u32);
        }

        log::info!(
            "multipart_parts: {} remaining={} of {} parallel={}",
            self.task_id,
            pending.len(),
            plan.part_count,
            config.parallel
        );

        let mut in_flight = FuturesUnordered::new();
        loop {
            while in_flight.len() < config.parallel {
                let Some(part_number) = pending.pop_front() else {
                    break;
                };
                in_flight.push(self.send_part(
                    &worker,
                    task,
                    &upload_id,
                    &plan,
                    part_number,
                    config,
                    cancel,
                ));
            }

            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(self.interrupted()),
                next = in_flight.next() => next,
            };
            let Some(result) = next else {
                break;
            };

            let part = result?;
            confirmed += plan.part_len(part.number);
            checkpoint.record_part(part);
            self.persist(&checkpoint).await;
            progress.report(confirmed, checkpoint.done_parts.len() as u32);
        }
        drop(in_flight);

        if checkpoint.done_parts.len() != plan.part_count as usize {
            return Err(UploadError::Incomplete {
                done: checkpoint.done_parts.len(),
                total: plan.part_count,
            });
        }

        // Past this point pause and cancel no longer apply
        if !self.advance(UploadState::Completing) {
            return Ok(self.interrupted());
        }

        let etag = self
            .store
            .complete_upload(&checkpoint.object_key, &upload_id, &checkpoint.done_parts)
            .await?;

        if let Err(e) = self.checkpoints.remove(&self.task_id).await {
            log::warn!("Failed to remove checkpoint for {}: {}", self.task_id, e);
        }
        self.set_state(UploadState::Completed);
        progress.finish();

        log::info!(
            "multipart_complete: {} key={} parts={}",
            self.task_id,
            checkpoint.object_key,
            plan.part_count
        );

        Ok(UploadOutcome::Completed(CompletedUpload {
            object_key: checkpoint.object_key,
            etag,
            upload_id: Some(upload_id),
            part_count: plan.part_count,
        }))
    }

    /// Read and upload one part, retrying transport failures with a linear
    /// backoff. The backoff wait is cut short by the cancellation token.
    #[allow(clippy::too_many_arguments)]
    async fn send_part(
        &self,
        worker: &PartUploadWorker,
        task: &UploadTask,
        upload_id: &str,
        plan: &UploadPlan,
        part_number: u32,
        config: &UploadConfig,
        cancel: &CancellationToken,
    ) -> UploadResult<PartResult> {
        let (start, end) = plan.part_range(part_number);
        let mut attempt: u32 = 0;

        loop {
            let data = task.source.read_range(start, end - start).await?;
            match worker
                .upload_part(upload_id, &task.object_key, part_number, data)
                .await
            {
                Ok(part) => return Ok(part),
                Err(UploadError::Store(e)) if e.is_retryable() && attempt < config.part_retries => {
                    attempt += 1;
                    log::warn!(
                        "part_retry: {} part={} attempt={} error={}",
                        self.task_id,
                        part_number,
                        attempt,
                        e
                    );
                    let backoff = Duration::from_millis(config.retry_backoff_ms * attempt as u64);
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(UploadError::Aborted(part_number)),
                        _ = tokio::time::sleep(backoff) => {}
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}
