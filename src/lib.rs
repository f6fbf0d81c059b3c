//! Resumable multipart uploads to S3-compatible object storage.
//!
//! A file above the multipart threshold is cut into parts and uploaded by a
//! bounded pool. Each confirmed part is written to a durable checkpoint, so
//! a paused, failed or interrupted upload continues where it stopped as
//! long as the file content is unchanged. Small files go up in one PUT.

pub mod checkpoint;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod hasher;
pub mod planner;
pub mod progress;
pub mod registry;
pub mod simple;
pub mod source;
pub mod store;
pub mod task;
pub mod worker;

pub use checkpoint::{
    Checkpoint, CheckpointStore, DbCheckpointStore, MemoryCheckpointStore, PartResult,
};
pub use config::UploadConfig;
pub use coordinator::{UploadCoordinator, UploadState};
pub use error::{CheckpointError, StoreError, UploadError, UploadResult};
pub use planner::UploadPlan;
pub use progress::{ProgressFn, UploadProgress};
pub use registry::UploadRegistry;
pub use source::{BytesSource, FileSource, UploadSource};
pub use store::{ObjectMeta, ObjectStore, S3Config, S3ObjectStore};
pub use task::{CompletedUpload, UploadOutcome, UploadTask};
