use serde::{Deserialize, Serialize};

use crate::error::{UploadError, UploadResult};

/// Files strictly larger than this go through a multipart session: 10MB
pub const MULTIPART_THRESHOLD: u64 = 10 * 1024 * 1024;
/// Part size: 5MB per chunk
pub const PART_SIZE: u64 = 5 * 1024 * 1024;
/// Concurrent uploads: 3 parts in parallel
pub const CONCURRENCY: usize = 3;
/// Retries per part for transport errors
pub const PART_RETRIES: u32 = 2;
/// Backoff step between part retries
pub const RETRY_BACKOFF_MS: u64 = 500;

/// Upload tuning shared by every task of a coordinator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UploadConfig {
    pub multipart_threshold: u64,
    pub part_size: u64,
    pub parallel: usize,
    pub part_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            multipart_threshold: MULTIPART_THRESHOLD,
            part_size: PART_SIZE,
            parallel: CONCURRENCY,
            part_retries: PART_RETRIES,
            retry_backoff_ms: RETRY_BACKOFF_MS,
        }
    }
}

impl UploadConfig {
    pub fn validate(&self) -> UploadResult<()> {
        if self.part_size == 0 {
            return Err(UploadError::InvalidConfig(
                "part_size must be greater than zero".to_string(),
            ));
        }
        if self.parallel == 0 {
            return Err(UploadError::InvalidConfig(
                "parallel must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
