use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::store::SyncEntry;

/// On-disk shape of the persisted state. The `taskSyncData` field name is
/// part of the wire format and must survive migrations.
#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedState {
    #[serde(default, rename = "taskSyncData")]
    task_sync_data: HashMap<String, SyncEntry>,
}

/// Persisted sync-store snapshot, one JSON document per vault.
#[derive(Debug, Clone)]
pub struct SyncStateFile {
    path: PathBuf,
}

impl SyncStateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted snapshot. A missing file is an empty store, not an
    /// error.
    pub fn load(&self) -> Result<HashMap<String, SyncEntry>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        let state: PersistedState = serde_json::from_str(&raw)?;
        Ok(state.task_sync_data)
    }

    /// Atomically replace the persisted snapshot.
    ///
    /// Crash-safety guarantee: the new content is written to a `.tmp`
    /// sibling file, fsync'd, then renamed over the original. A crash before
    /// the rename leaves the original untouched; a crash after leaves a
    /// consistent new file. The `.tmp` file is cleaned up on any error path.
    pub async fn save(&self, snapshot: &HashMap<String, SyncEntry>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp_path = {
            let filename = self
                .path
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "sync.json".to_string());
            self.path.with_file_name(format!("{filename}.tmp"))
        };

        let state = PersistedState {
            task_sync_data: snapshot.clone(),
        };

        let write_result: Result<()> = async {
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)
                .await?;
            let rendered = serde_json::to_string_pretty(&state)?;
            file.write_all(rendered.as_bytes()).await?;
            file.write_all(b"\n").await?;
            file.flush().await?;
            file.sync_all().await?;
            Ok(())
        }
        .await;

        if let Err(err) = write_result {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(err);
        }

        if let Err(err) = tokio::fs::rename(&tmp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(err.into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("gtdvault-state-test-{}.json", Uuid::new_v4()))
    }

    fn entry(todo_id: &str) -> SyncEntry {
        SyncEntry {
            todo_id: todo_id.to_string(),
            task_file: format!("GTD/Tasks/202401011200_{todo_id}.md"),
            source_file: "Daily/2024-01-01.md".to_string(),
            source_line: 3,
            created: "2024-01-01T12:00:00.000Z".to_string(),
        }
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let path = temp_path();
        let state = SyncStateFile::new(&path);
        let mut snapshot = HashMap::new();
        snapshot.insert("pr66rr".to_string(), entry("pr66rr"));
        state.save(&snapshot).await.unwrap();

        let loaded = state.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get("pr66rr"), snapshot.get("pr66rr"));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn load_missing_file_returns_empty() {
        let state = SyncStateFile::new(temp_path());
        assert!(state.load().unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_overwrites_previous_snapshot() {
        let path = temp_path();
        let state = SyncStateFile::new(&path);
        let mut first = HashMap::new();
        first.insert("a".to_string(), entry("a"));
        state.save(&first).await.unwrap();

        let second = HashMap::new();
        state.save(&second).await.unwrap();
        assert!(state.load().unwrap().is_empty());
        let _ = fs::remove_file(&path);
    }

    #[tokio::test]
    async fn save_creates_parent_directories() {
        let dir = std::env::temp_dir().join(format!("gtdvault-state-dir-{}", Uuid::new_v4()));
        let path = dir.join("nested").join("sync.json");
        let state = SyncStateFile::new(&path);
        state.save(&HashMap::new()).await.unwrap();
        assert!(path.exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn wire_format_uses_task_sync_data_field() {
        let state = PersistedState {
            task_sync_data: HashMap::from([("id".to_string(), entry("id"))]),
        };
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"taskSyncData\""));
    }

    #[test]
    fn load_accepts_hand_written_state() {
        let path = temp_path();
        fs::write(
            &path,
            r#"{"taskSyncData":{"pr66rr":{"todoId":"pr66rr","taskFile":"GTD/Tasks/t.md","sourceFile":"Daily/2024-01-01.md","sourceLine":3,"created":"2024-01-01T12:00:00.000Z"}}}"#,
        )
        .unwrap();
        let state = SyncStateFile::new(&path);
        let loaded = state.load().unwrap();
        assert_eq!(loaded["pr66rr"].source_line, 3);
        let _ = fs::remove_file(&path);
    }
}
