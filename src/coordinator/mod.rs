//! Upload coordinator - resumable multipart upload lifecycle
//!
//! - `state`: lifecycle states
//! - `session`: checkpoint reuse or a fresh remote session
//! - `parts`: bounded part pool, incremental checkpoints, finalization

mod parts;
mod session;
mod state;

use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::checkpoint::{Checkpoint, CheckpointStore};
use crate::config::UploadConfig;
use crate::error::{UploadError, UploadResult};
use crate::hasher;
use crate::planner::{self, UploadPlan};
use crate::simple;
use crate::store::ObjectStore;
use crate::task::{UploadOutcome, UploadTask};

pub use state::UploadState;

/// Drives one task's uploads: hashing, checkpoint reuse, the part pool,
/// pause/resume/cancel.
///
/// Share it behind an `Arc` so `pause`/`cancel` can be called while
/// `upload` is awaited elsewhere. Only one coordinator may work on a given
/// task id at a time; that is up to the caller.
pub struct UploadCoordinator {
    task_id: String,
    store: Arc<dyn ObjectStore>,
    checkpoints: Arc<dyn CheckpointStore>,
    config: UploadConfig,
    state: watch::Sender<UploadState>,
    cancel: Mutex<CancellationToken>,
    // Held for the whole attempt; cancel() waits on it before cleaning up
    attempt: tokio::sync::Mutex<()>,
}

impl UploadCoordinator {
    pub fn new(
        task_id: impl Into<String>,
        store: Arc<dyn ObjectStore>,
        checkpoints: Arc<dyn CheckpointStore>,
    ) -> Self {
        let (state, _) = watch::channel(UploadState::Idle);
        Self {
            task_id: task_id.into(),
            store,
            checkpoints,
            config: UploadConfig::default(),
            state,
            cancel: Mutex::new(CancellationToken::new()),
            attempt: tokio::sync::Mutex::new(()),
        }
    }

    pub fn with_config(mut self, config: UploadConfig) -> Self {
        self.config = config;
        self
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn state(&self) -> UploadState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadState> {
        self.state.subscribe()
    }

    /// The stored checkpoint for this task, if any.
    pub async fn checkpoint(&self) -> Option<Checkpoint> {
        self.checkpoints.load(&self.task_id).await
    }

    /// Run one upload attempt to completion, pause, cancellation or failure.
    ///
    /// Files above the multipart threshold are resumable: a matching
    /// checkpoint is continued, anything else starts a new session. On
    /// failure the checkpoint is kept so the next call resumes.
    pub async fn upload(&self, task: UploadTask) -> UploadResult<UploadOutcome> {
        let _attempt = self
            .attempt
            .try_lock()
            .map_err(|_| UploadError::AlreadyRunning(self.task_id.clone()))?;
        self.run_attempt(task).await
    }

    /// Continue a paused task from its checkpoint.
    ///
    /// Waits for the paused attempt to unwind first, so calling this right
    /// after `pause()` is fine.
    pub async fn resume(&self, task: UploadTask) -> UploadResult<UploadOutcome> {
        if self.state() != UploadState::Paused {
            return Err(UploadError::NotPaused(self.task_id.clone()));
        }

        let _attempt = self.attempt.lock().await;
        // A cancel may have won the lock first
        if self.state() != UploadState::Paused {
            return Err(UploadError::NotPaused(self.task_id.clone()));
        }

        log::info!("upload_resume: {}", self.task_id);
        self.run_attempt(task).await
    }

    /// One attempt; the caller holds the attempt lock.
    async fn run_attempt(&self, task: UploadTask) -> UploadResult<UploadOutcome> {
        let config = task.effective_config(&self.config);
        config.validate()?;

        let cancel = self.begin_attempt();
        let plan = planner::decide(task.source.size(), &config);

        let result = if plan.use_multipart {
            self.run_multipart(&task, &config, plan, &cancel).await
        } else {
            self.run_simple(&task, &cancel).await
        };

        match result {
            Ok(outcome) => Ok(outcome),
            Err(e) if cancel.is_cancelled() => {
                log::debug!("upload_interrupted: {} error={}", self.task_id, e);
                Ok(self.interrupted())
            }
            Err(e) => {
                self.set_state(UploadState::Failed);
                log::warn!("upload_failed: {} error={}", self.task_id, e);
                Err(e)
            }
        }
    }

    /// Abort in-flight parts and stop dispatching. Confirmed parts are
    /// already in the checkpoint. Returns false if nothing was running.
    pub fn pause(&self) -> bool {
        let paused = self.interrupt(UploadState::Paused);
        if paused {
            log::info!("upload_pause: {}", self.task_id);
        }
        paused
    }

    /// Abort in-flight parts, abort the remote session and delete the
    /// checkpoint.
    ///
    /// Works from the stored checkpoint alone, so a task left over from a
    /// previous run can be cancelled too.
    pub async fn cancel(&self) -> UploadResult<()> {
        self.interrupt(UploadState::Cancelled);

        // Wait for a running attempt to unwind
        let _attempt = self.attempt.lock().await;

        if let Some(checkpoint) = self.checkpoints.load(&self.task_id).await {
            match self
                .store
                .abort_upload(&checkpoint.object_key, &checkpoint.upload_id)
                .await
            {
                Ok(()) => log::info!(
                    "upload_abort: {} upload_id={}",
                    self.task_id,
                    checkpoint.upload_id
                ),
                Err(e) => log::warn!(
                    "Failed to abort multipart upload {} for {}: {}",
                    checkpoint.upload_id,
                    self.task_id,
                    e
                ),
            }
        }

        self.checkpoints.remove(&self.task_id).await?;

        if self.state() != UploadState::Completed {
            self.set_state(UploadState::Cancelled);
        }
        log::info!("upload_cancel: {}", self.task_id);
        Ok(())
    }

    async fn run_simple(
        &self,
        task: &UploadTask,
        cancel: &CancellationToken,
    ) -> UploadResult<UploadOutcome> {
        self.set_state(UploadState::Uploading);

        // A multipart checkpoint left under this task belongs to another file
        if let Some(stale) = self.checkpoints.load(&self.task_id).await {
            self.discard_stale(stale).await;
        }

        let completed = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(self.interrupted()),
            result = simple::upload_simple(self.store.as_ref(), &self.task_id, task) => result?,
        };

        self.set_state(UploadState::Completed);
        Ok(UploadOutcome::Completed(completed))
    }

    async fn run_multipart(
        &self,
        task: &UploadTask,
        config: &UploadConfig,
        plan: UploadPlan,
        cancel: &CancellationToken,
    ) -> UploadResult<UploadOutcome> {
        self.set_state(UploadState::Hashing);
        log::info!(
            "multipart_start: {} key={} total_bytes={}",
            self.task_id,
            task.object_key,
            plan.file_size
        );

        let file_hash = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(self.interrupted()),
            result = hasher::hash_source(task.source.as_ref()) => result?,
        };

        let Some(checkpoint) = self.open_session(task, plan, file_hash, cancel).await? else {
            return Ok(self.interrupted());
        };

        if cancel.is_cancelled() || !self.advance(UploadState::Uploading) {
            return Ok(self.interrupted());
        }

        self.upload_parts(task, config, checkpoint, cancel).await
    }

    fn begin_attempt(&self) -> CancellationToken {
        let token = CancellationToken::new();
        if let Ok(mut current) = self.cancel.lock() {
            *current = token.clone();
        }
        token
    }

    fn set_state(&self, next: UploadState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            log::debug!("upload_state: {} {} -> {}", self.task_id, previous, next);
        }
    }

    /// Move a running attempt to `next`. Returns false if the attempt was
    /// paused or cancelled in the meantime.
    fn advance(&self, next: UploadState) -> bool {
        let mut running = false;
        self.state.send_if_modified(|state| {
            if !state.is_active() {
                return false;
            }
            running = true;
            if *state == next {
                return false;
            }
            *state = next;
            true
        });
        running
    }

    fn interrupt(&self, next: UploadState) -> bool {
        let interrupted = self.state.send_if_modified(|state| {
            if state.is_active() {
                *state = next;
                true
            } else {
                false
            }
        });

        if interrupted {
            if let Ok(token) = self.cancel.lock() {
                token.cancel();
            }
        }
        interrupted
    }

    fn interrupted(&self) -> UploadOutcome {
        match self.state() {
            UploadState::Cancelled => UploadOutcome::Cancelled,
            _ => UploadOutcome::Paused,
        }
    }
}
