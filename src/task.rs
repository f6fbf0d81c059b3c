use std::collections::HashMap;
use std::sync::Arc;

use crate::config::UploadConfig;
use crate::progress::{ProgressFn, UploadProgress};
use crate::source::UploadSource;
use crate::store::ObjectMeta;

/// One upload attempt as described by the caller. Never persisted.
#[derive(Clone)]
pub struct UploadTask {
    pub source: Arc<dyn UploadSource>,
    pub object_key: String,
    pub content_type: Option<String>,
    pub metadata: HashMap<String, String>,
    pub part_size: Option<u64>,
    pub parallel: Option<usize>,
    pub on_progress: Option<ProgressFn>,
}

impl UploadTask {
    pub fn new(source: Arc<dyn UploadSource>, object_key: impl Into<String>) -> Self {
        Self {
            source,
            object_key: object_key.into(),
            content_type: None,
            metadata: HashMap::new(),
            part_size: None,
            parallel: None,
            on_progress: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_part_size(mut self, part_size: u64) -> Self {
        self.part_size = Some(part_size);
        self
    }

    pub fn with_parallel(mut self, parallel: usize) -> Self {
        self.parallel = Some(parallel);
        self
    }

    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&UploadProgress) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    /// Coordinator defaults with this task's overrides applied.
    pub fn effective_config(&self, base: &UploadConfig) -> UploadConfig {
        UploadConfig {
            part_size: self.part_size.unwrap_or(base.part_size),
            parallel: self.parallel.unwrap_or(base.parallel),
            ..base.clone()
        }
    }

    /// Content type plus `filename` / `filesize` metadata, like the web client sets.
    pub fn object_meta(&self) -> ObjectMeta {
        let mut metadata = self.metadata.clone();
        if let Some(name) = self.source.name() {
            metadata
                .entry("filename".to_string())
                .or_insert_with(|| urlencoding::encode(name).into_owned());
        }
        metadata
            .entry("filesize".to_string())
            .or_insert_with(|| self.source.size().to_string());

        ObjectMeta {
            content_type: self.content_type.clone(),
            metadata,
        }
    }
}

/// A finished upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedUpload {
    pub object_key: String,
    pub etag: Option<String>,
    /// Multipart session id; `None` for single-request uploads.
    pub upload_id: Option<String>,
    pub part_count: u32,
}

/// How an attempt ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Completed(CompletedUpload),
    Paused,
    Cancelled,
}
