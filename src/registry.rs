//! Caller-owned table of live coordinators, keyed by task id

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::coordinator::UploadCoordinator;

/// Lets one part of an application start an upload and another pause or
/// cancel it by task id.
///
/// Holding a coordinator here does not keep an upload running; entries are
/// removed by whoever owns the task once it is done.
#[derive(Default)]
pub struct UploadRegistry {
    coordinators: Mutex<HashMap<String, Arc<UploadCoordinator>>>,
}

impl UploadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a coordinator under its task id, returning the one it replaced.
    pub fn insert(&self, coordinator: Arc<UploadCoordinator>) -> Option<Arc<UploadCoordinator>> {
        let task_id = coordinator.task_id().to_string();
        let mut map = self.coordinators.lock().ok()?;
        map.insert(task_id, coordinator)
    }

    pub fn get(&self, task_id: &str) -> Option<Arc<UploadCoordinator>> {
        self.coordinators.lock().ok()?.get(task_id).cloned()
    }

    pub fn remove(&self, task_id: &str) -> Option<Arc<UploadCoordinator>> {
        self.coordinators.lock().ok()?.remove(task_id)
    }

    pub fn len(&self) -> usize {
        self.coordinators.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pause every running upload. Returns how many were paused.
    pub fn pause_all(&self) -> usize {
        let coordinators: Vec<Arc<UploadCoordinator>> = match self.coordinators.lock() {
            Ok(map) => map.values().cloned().collect(),
            Err(_) => return 0,
        };
        let paused = coordinators.iter().filter(|c| c.pause()).count();
        if paused > 0 {
            log::info!("Paused {} running uploads", paused);
        }
        paused
    }
}
