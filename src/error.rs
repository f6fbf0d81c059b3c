//! Error types for uploads, the remote store and the checkpoint ledger

use thiserror::Error;

pub type UploadResult<T> = Result<T, UploadError>;
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by an [`ObjectStore`](crate::store::ObjectStore) implementation.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The request never got a usable answer (timeout, connection reset, bad response).
    #[error("transport error: {0}")]
    Transport(String),

    /// The store answered and refused the request.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The store answered but left out a field we need (upload id, etag).
    #[error("response is missing {0}")]
    MissingField(&'static str),
}

impl StoreError {
    /// Whether the same request may succeed if sent again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Transport(_))
    }
}

/// Errors raised by a [`CheckpointStore`](crate::checkpoint::CheckpointStore).
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint database error: {0}")]
    Database(String),

    #[error("failed to encode checkpoint: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to read file: {0}")]
    Read(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error("invalid upload configuration: {0}")]
    InvalidConfig(String),

    #[error("an upload is already running for task {0}")]
    AlreadyRunning(String),

    #[error("task {0} is not paused")]
    NotPaused(String),

    /// A worker observed the attempt's cancellation token.
    #[error("part {0} aborted")]
    Aborted(u32),

    #[error("missing upload parts: {done} of {total} confirmed")]
    Incomplete { done: usize, total: u32 },
}
