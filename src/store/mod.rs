//! Remote object store surface consumed by the upload core
//!
//! - `s3`: implementation on the AWS S3 SDK (S3, Cloudflare R2, MinIO)

mod s3;

use async_trait::async_trait;
use std::collections::HashMap;

use crate::checkpoint::PartResult;
use crate::error::StoreResult;

pub use s3::{S3Config, S3ObjectStore};

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Headers attached when an object (or multipart session) is created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMeta {
    pub content_type: Option<String>,
    pub metadata: HashMap<String, String>,
}

impl ObjectMeta {
    pub fn content_type(&self) -> &str {
        self.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE)
    }
}

/// Operations of an S3-style object store.
///
/// Implementations surface their own transport errors; retry policy for
/// parts belongs to the coordinator.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Open a multipart session and return its upload id.
    async fn initiate(&self, object_key: &str, meta: &ObjectMeta) -> StoreResult<String>;

    /// Upload one numbered part and return its integrity tag (ETag).
    async fn upload_part(
        &self,
        object_key: &str,
        upload_id: &str,
        part_number: u32,
        data: Vec<u8>,
    ) -> StoreResult<String>;

    /// Finalize a session. `parts` are ordered by number.
    async fn complete_upload(
        &self,
        object_key: &str,
        upload_id: &str,
        parts: &[PartResult],
    ) -> StoreResult<Option<String>>;

    /// Discard a session and release the parts stored server-side.
    async fn abort_upload(&self, object_key: &str, upload_id: &str) -> StoreResult<()>;

    /// Single-request upload for small payloads.
    async fn put_object(
        &self,
        object_key: &str,
        data: Vec<u8>,
        meta: &ObjectMeta,
    ) -> StoreResult<Option<String>>;
}
