#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use resumable_upload::error::StoreResult;
use resumable_upload::{ObjectMeta, ObjectStore, PartResult, StoreError};

pub const MIB: usize = 1024 * 1024;

/// Deterministic, non-repeating-looking payload.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[derive(Debug, Default, Clone)]
pub struct Calls {
    pub initiated: Vec<String>,
    pub parts: Vec<u32>,
    pub completed: Vec<(String, Vec<PartResult>)>,
    pub aborted: Vec<String>,
    pub puts: Vec<(String, usize, ObjectMeta)>,
}

#[derive(Default)]
struct Behaviour {
    hang: HashSet<u32>,
    fail: HashSet<u32>,
    fail_once: HashSet<u32>,
    initiate_delay: Option<Duration>,
    complete_delay: Option<Duration>,
}

/// In-memory object store that records every call.
#[derive(Default)]
pub struct MockStore {
    calls: Mutex<Calls>,
    behaviour: Mutex<Behaviour>,
    next_id: Mutex<u32>,
}

impl MockStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Parts with this number never answer.
    pub fn hang_part(&self, part_number: u32) {
        self.behaviour.lock().unwrap().hang.insert(part_number);
    }

    /// Parts with this number are always rejected.
    pub fn fail_part(&self, part_number: u32) {
        self.behaviour.lock().unwrap().fail.insert(part_number);
    }

    /// The next upload of this part fails with a transport error.
    pub fn fail_part_once(&self, part_number: u32) {
        self.behaviour.lock().unwrap().fail_once.insert(part_number);
    }

    /// `initiate` answers only after `delay`.
    pub fn slow_initiate(&self, delay: Duration) {
        self.behaviour.lock().unwrap().initiate_delay = Some(delay);
    }

    /// `complete_upload` answers only after `delay`.
    pub fn slow_complete(&self, delay: Duration) {
        self.behaviour.lock().unwrap().complete_delay = Some(delay);
    }

    pub fn heal(&self) {
        *self.behaviour.lock().unwrap() = Behaviour::default();
    }

    pub fn calls(&self) -> Calls {
        self.calls.lock().unwrap().clone()
    }

    pub fn reset_calls(&self) {
        *self.calls.lock().unwrap() = Calls::default();
    }

    pub fn sorted_parts(&self) -> Vec<u32> {
        let mut parts = self.calls().parts;
        parts.sort_unstable();
        parts
    }
}

#[async_trait]
impl ObjectStore for MockStore {
    async fn initiate(&self, object_key: &str, _meta: &ObjectMeta) -> StoreResult<String> {
        let delay = self.behaviour.lock().unwrap().initiate_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            format!("upload-{}", *next)
        };
        self.calls
            .lock()
            .unwrap()
            .initiated
            .push(object_key.to_string());
        Ok(id)
    }

    async fn upload_part(
        &self,
        _object_key: &str,
        _upload_id: &str,
        part_number: u32,
        data: Vec<u8>,
    ) -> StoreResult<String> {
        let (hang, fail, fail_once) = {
            let mut behaviour = self.behaviour.lock().unwrap();
            (
                behaviour.hang.contains(&part_number),
                behaviour.fail.contains(&part_number),
                behaviour.fail_once.remove(&part_number),
            )
        };

        if hang {
            std::future::pending::<()>().await;
        }
        // Let sibling parts interleave
        tokio::time::sleep(Duration::from_millis(5)).await;

        if fail {
            return Err(StoreError::Rejected(format!("part {} refused", part_number)));
        }
        if fail_once {
            return Err(StoreError::Transport("connection reset".to_string()));
        }

        self.calls.lock().unwrap().parts.push(part_number);
        Ok(format!("etag-{}-{}", part_number, data.len()))
    }

    async fn complete_upload(
        &self,
        _object_key: &str,
        upload_id: &str,
        parts: &[PartResult],
    ) -> StoreResult<Option<String>> {
        let delay = self.behaviour.lock().unwrap().complete_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.calls
            .lock()
            .unwrap()
            .completed
            .push((upload_id.to_string(), parts.to_vec()));
        Ok(Some(format!("final-{}", upload_id)))
    }

    async fn abort_upload(&self, _object_key: &str, upload_id: &str) -> StoreResult<()> {
        self.calls
            .lock()
            .unwrap()
            .aborted
            .push(upload_id.to_string());
        Ok(())
    }

    async fn put_object(
        &self,
        object_key: &str,
        data: Vec<u8>,
        meta: &ObjectMeta,
    ) -> StoreResult<Option<String>> {
        self.calls
            .lock()
            .unwrap()
            .puts
            .push((object_key.to_string(), data.len(), meta.clone()));
        Ok(Some("put-etag".to_string()))
    }
}

/// Poll `check` until it holds, failing the test after a few seconds.
pub async fn wait_until<F>(mut check: F)
where
    F: FnMut() -> bool,
{
    for _ in 0..500 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

pub fn etags(parts: &[PartResult]) -> HashMap<u32, String> {
    parts
        .iter()
        .map(|p| (p.number, p.integrity_tag.clone()))
        .collect()
}
