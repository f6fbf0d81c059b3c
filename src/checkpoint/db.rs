use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio::sync::Mutex;
use turso::{Builder, Connection};

use super::{Checkpoint, CheckpointStore};
use crate::error::CheckpointError;

/// Get SQL for creating the checkpoint table
fn get_table_sql() -> &'static str {
    "
    CREATE TABLE IF NOT EXISTS upload_checkpoints (
        task_id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        updated_at INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_checkpoints_updated ON upload_checkpoints(updated_at);
    "
}

fn db_err(e: impl std::fmt::Display) -> CheckpointError {
    CheckpointError::Database(e.to_string())
}

/// Checkpoint store backed by a local turso database file.
pub struct DbCheckpointStore {
    // Serialize access: the connection's page cache is not safe under concurrent use
    conn: Mutex<Connection>,
}

impl DbCheckpointStore {
    /// Open (or create) the database at `db_path` and make sure the table exists.
    pub async fn open(db_path: &Path) -> Result<Self, CheckpointError> {
        let path = db_path
            .to_str()
            .ok_or_else(|| db_err(format!("Non UTF-8 database path: {}", db_path.display())))?;
        let db = Builder::new_local(path).build().await.map_err(db_err)?;
        let conn = db.connect().map_err(db_err)?;

        conn.execute_batch(get_table_sql()).await.map_err(db_err)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Delete checkpoints not updated within `max_age`. Returns how many were removed.
    pub async fn cleanup_stale(&self, max_age: Duration) -> Result<usize, CheckpointError> {
        let conn = self.conn.lock().await;
        let cutoff = chrono::Utc::now().timestamp() - max_age.as_secs() as i64;

        let mut rows = conn
            .query(
                "SELECT task_id FROM upload_checkpoints WHERE updated_at < ?1",
                turso::params![cutoff],
            )
            .await
            .map_err(db_err)?;

        let mut task_ids: Vec<String> = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err)? {
            task_ids.push(row.get(0).map_err(db_err)?);
        }

        for task_id in &task_ids {
            conn.execute(
                "DELETE FROM upload_checkpoints WHERE task_id = ?1",
                turso::params![task_id.clone()],
            )
            .await
            .map_err(db_err)?;
        }

        if !task_ids.is_empty() {
            log::info!("checkpoint_cleanup: removed={}", task_ids.len());
        }
        Ok(task_ids.len())
    }

    async fn load_raw(&self, task_id: &str) -> Result<Option<String>, CheckpointError> {
        let conn = self.conn.lock().await;
        let mut rows = conn
            .query(
                "SELECT data FROM upload_checkpoints WHERE task_id = ?1",
                turso::params![task_id],
            )
            .await
            .map_err(db_err)?;

        if let Some(row) = rows.next().await.map_err(db_err)? {
            Ok(Some(row.get(0).map_err(db_err)?))
        } else {
            Ok(None)
        }
    }
}

#[async_trait]
impl CheckpointStore for DbCheckpointStore {
    async fn save(&self, task_id: &str, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        let data = checkpoint.to_json()?;
        let now = chrono::Utc::now().timestamp();
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO upload_checkpoints (task_id, data, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT (task_id) DO UPDATE SET data = ?2, updated_at = ?3",
            turso::params![task_id, data, now],
        )
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn load(&self, task_id: &str) -> Option<Checkpoint> {
        match self.load_raw(task_id).await {
            Ok(Some(data)) => Checkpoint::from_json(&data),
            Ok(None) => None,
            Err(e) => {
                log::warn!("Failed to load checkpoint {}: {}", task_id, e);
                None
            }
        }
    }

    async fn remove(&self, task_id: &str) -> Result<(), CheckpointError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "DELETE FROM upload_checkpoints WHERE task_id = ?1",
            turso::params![task_id],
        )
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn pending(&self) -> Result<Vec<(String, Checkpoint)>, CheckpointError> {
        let conn = self.conn.lock().await;
        let mut rows = conn
            .query(
                "SELECT task_id, data FROM upload_checkpoints ORDER BY updated_at DESC",
                (),
            )
            .await
            .map_err(db_err)?;

        let mut pending = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err)? {
            let task_id: String = row.get(0).map_err(db_err)?;
            let data: String = row.get(1).map_err(db_err)?;
            if let Some(checkpoint) = Checkpoint::from_json(&data) {
                pending.push((task_id, checkpoint));
            }
        }
        Ok(pending)
    }
}
