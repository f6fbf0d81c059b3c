//! Single-request upload for small files

use crate::error::UploadResult;
use crate::progress::ProgressTracker;
use crate::store::ObjectStore;
use crate::task::{CompletedUpload, UploadTask};

/// Upload the whole source with one PUT.
///
/// The transfer is not observable mid-flight, so progress is reported only
/// at 0 before the request and 100 after it. No checkpoint, no retry.
pub async fn upload_simple(
    store: &dyn ObjectStore,
    task_id: &str,
    task: &UploadTask,
) -> UploadResult<CompletedUpload> {
    let file_size = task.source.size();
    let mut progress =
        ProgressTracker::new(task_id, task.on_progress.as_ref(), file_size, 1, 0);
    progress.report(0, 0);

    log::info!(
        "simple_upload_start: {} key={} bytes={}",
        task_id,
        task.object_key,
        file_size
    );

    // Read file into memory for small files
    let data = task.source.read_range(0, file_size).await?;
    let etag = store
        .put_object(&task.object_key, data, &task.object_meta())
        .await?;

    progress.finish();
    log::info!("simple_upload_finish: {} key={}", task_id, task.object_key);

    Ok(CompletedUpload {
        object_key: task.object_key.clone(),
        etag,
        upload_id: None,
        part_count: 1,
    })
}
