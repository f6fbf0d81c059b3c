//! Single-part upload, aborted by the attempt's cancellation token

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::checkpoint::PartResult;
use crate::error::{UploadError, UploadResult};
use crate::store::ObjectStore;

/// Uploads exactly one part of a multipart session.
///
/// No retries happen here: a store error comes back unchanged and the
/// coordinator decides what to do with it.
#[derive(Clone)]
pub struct PartUploadWorker {
    store: Arc<dyn ObjectStore>,
    cancel: CancellationToken,
}

impl PartUploadWorker {
    pub fn new(store: Arc<dyn ObjectStore>, cancel: CancellationToken) -> Self {
        Self { store, cancel }
    }

    pub async fn upload_part(
        &self,
        upload_id: &str,
        object_key: &str,
        part_number: u32,
        data: Vec<u8>,
    ) -> UploadResult<PartResult> {
        if self.cancel.is_cancelled() {
            return Err(UploadError::Aborted(part_number));
        }

        let len = data.len();
        let etag = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                log::debug!("part_aborted: {} part={}", object_key, part_number);
                return Err(UploadError::Aborted(part_number));
            }
            result = self.store.upload_part(object_key, upload_id, part_number, data) => result?,
        };

        log::debug!(
            "part_uploaded: {} part={} bytes={}",
            object_key,
            part_number,
            len
        );
        Ok(PartResult::new(part_number, etag))
    }
}
