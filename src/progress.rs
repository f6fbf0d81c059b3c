use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Progress payload handed to the caller's callback
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UploadProgress {
    pub task_id: String,
    pub percent: f64,
    pub uploaded_bytes: u64,
    pub total_bytes: u64,
    pub completed_parts: u32,
    pub total_parts: u32,
    pub speed: f64, // bytes per second
}

pub type ProgressFn = Arc<dyn Fn(&UploadProgress) + Send + Sync>;

/// Turns confirmed bytes into callback events for one attempt.
///
/// Percent never goes backwards within an attempt and never passes 100.
pub(crate) struct ProgressTracker<'a> {
    task_id: &'a str,
    callback: Option<&'a ProgressFn>,
    total_bytes: u64,
    total_parts: u32,
    baseline_bytes: u64,
    start_time: Instant,
    last_percent: f64,
}

impl<'a> ProgressTracker<'a> {
    pub(crate) fn new(
        task_id: &'a str,
        callback: Option<&'a ProgressFn>,
        total_bytes: u64,
        total_parts: u32,
        baseline_bytes: u64,
    ) -> Self {
        Self {
            task_id,
            callback,
            total_bytes,
            total_parts,
            baseline_bytes,
            start_time: Instant::now(),
            last_percent: 0.0,
        }
    }

    pub(crate) fn report(&mut self, uploaded_bytes: u64, completed_parts: u32) {
        let raw = if self.total_bytes > 0 {
            (uploaded_bytes as f64 / self.total_bytes as f64) * 100.0
        } else {
            0.0
        };
        self.emit(raw, uploaded_bytes, completed_parts);
    }

    pub(crate) fn finish(&mut self) {
        self.emit(100.0, self.total_bytes, self.total_parts);
    }

    fn emit(&mut self, raw_percent: f64, uploaded_bytes: u64, completed_parts: u32) {
        let percent = raw_percent.clamp(0.0, 100.0).max(self.last_percent);
        self.last_percent = percent;

        let Some(callback) = self.callback else {
            return;
        };

        let elapsed = self.start_time.elapsed().as_secs_f64();
        let speed = if elapsed > 0.0 {
            uploaded_bytes.saturating_sub(self.baseline_bytes) as f64 / elapsed
        } else {
            0.0
        };

        callback(&UploadProgress {
            task_id: self.task_id.to_string(),
            percent,
            uploaded_bytes,
            total_bytes: self.total_bytes,
            completed_parts,
            total_parts: self.total_parts,
            speed,
        });
    }
}
