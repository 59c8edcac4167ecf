use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The persisted link between a marker's identity and its generated task
/// note. Field names are camelCase on the wire for compatibility with
/// already-persisted state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncEntry {
    pub todo_id: String,
    /// Vault-relative path of the generated task note.
    pub task_file: String,
    /// Vault-relative path of the note the marker was found in.
    pub source_file: String,
    /// Zero-based line offset of the marker at creation time.
    pub source_line: usize,
    /// ISO-8601 creation timestamp.
    pub created: String,
}

/// In-memory mapping from `todo_id` to its sync entry.
///
/// Pure bookkeeping: no file access, no validation beyond overwrite-by-key.
/// Single-writer by construction — every reconciliation operation takes it
/// `&mut`, and map semantics guarantee at most one entry per id. The
/// invariants (no orphaned entries, entry-per-live-task) are enforced at the
/// call sites.
#[derive(Debug, Default)]
pub struct SyncStore {
    entries: HashMap<String, SyncEntry>,
}

impl SyncStore {
    /// Replace all in-memory entries. Called once at startup with the
    /// persisted snapshot.
    pub fn load(&mut self, entries: HashMap<String, SyncEntry>) {
        self.entries = entries;
    }

    /// Copy the current mapping out for persistence. Pure, no side effects.
    pub fn snapshot(&self) -> HashMap<String, SyncEntry> {
        self.entries.clone()
    }

    pub fn has(&self, todo_id: &str) -> bool {
        self.entries.contains_key(todo_id)
    }

    pub fn get(&self, todo_id: &str) -> Option<&SyncEntry> {
        self.entries.get(todo_id)
    }

    /// Insert or overwrite the entry under its own `todo_id`.
    pub fn set(&mut self, entry: SyncEntry) {
        self.entries.insert(entry.todo_id.clone(), entry);
    }

    pub fn delete(&mut self, todo_id: &str) -> Option<SyncEntry> {
        self.entries.remove(todo_id)
    }

    /// Ids of all current entries, for iteration that mutates the store as
    /// it goes.
    pub fn ids(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Remove the first entry whose `task_file` equals `path`, returning its
    /// id. Entries are expected to be unique per task file, so one removal
    /// per deleted file is sufficient.
    pub fn remove_by_task_file(&mut self, path: &str) -> Option<String> {
        let id = self
            .entries
            .iter()
            .find(|(_, entry)| entry.task_file == path)
            .map(|(id, _)| id.clone())?;
        self.entries.remove(&id);
        Some(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(todo_id: &str, task_file: &str) -> SyncEntry {
        SyncEntry {
            todo_id: todo_id.to_string(),
            task_file: task_file.to_string(),
            source_file: "notes/a.md".to_string(),
            source_line: 0,
            created: "2024-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn set_get_delete() {
        let mut store = SyncStore::default();
        assert!(store.is_empty());
        store.set(entry("id1", "GTD/Tasks/a.md"));
        assert!(store.has("id1"));
        assert_eq!(store.get("id1").unwrap().task_file, "GTD/Tasks/a.md");
        assert_eq!(store.len(), 1);
        assert!(store.delete("id1").is_some());
        assert!(!store.has("id1"));
        assert!(store.delete("id1").is_none());
    }

    #[test]
    fn set_overwrites_by_key() {
        let mut store = SyncStore::default();
        store.set(entry("id1", "GTD/Tasks/a.md"));
        store.set(entry("id1", "GTD/Tasks/b.md"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("id1").unwrap().task_file, "GTD/Tasks/b.md");
    }

    #[test]
    fn load_replaces_everything() {
        let mut store = SyncStore::default();
        store.set(entry("old", "GTD/Tasks/old.md"));
        let mut snapshot = HashMap::new();
        snapshot.insert("new".to_string(), entry("new", "GTD/Tasks/new.md"));
        store.load(snapshot);
        assert!(!store.has("old"));
        assert!(store.has("new"));
    }

    #[test]
    fn snapshot_round_trips() {
        let mut store = SyncStore::default();
        store.set(entry("id1", "GTD/Tasks/a.md"));
        let snapshot = store.snapshot();
        let mut restored = SyncStore::default();
        restored.load(snapshot);
        assert_eq!(restored.get("id1"), store.get("id1"));
    }

    #[test]
    fn remove_by_task_file_removes_one_match() {
        let mut store = SyncStore::default();
        store.set(entry("id1", "GTD/Tasks/a.md"));
        store.set(entry("id2", "GTD/Tasks/b.md"));
        assert_eq!(
            store.remove_by_task_file("GTD/Tasks/a.md").as_deref(),
            Some("id1")
        );
        assert!(store.remove_by_task_file("GTD/Tasks/a.md").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn entry_serializes_camel_case() {
        let json = serde_json::to_string(&entry("id1", "GTD/Tasks/a.md")).unwrap();
        assert!(json.contains("\"todoId\""));
        assert!(json.contains("\"taskFile\""));
        assert!(json.contains("\"sourceFile\""));
        assert!(json.contains("\"sourceLine\""));
    }
}
