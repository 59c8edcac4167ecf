use std::collections::BTreeMap;

use chrono::{Local, NaiveDate, SecondsFormat, Utc};
use tracing::{debug, info, warn};

use gtdvault_config::GtdConfig;

use crate::marker::{Marker, check_marker_line, scan_note};
use crate::note;
use crate::schema::{TaskKind, TaskStatus};
use crate::store::{SyncEntry, SyncStore};
use crate::vault::Vault;

/// The task-sync reconciliation engine.
///
/// Owns the vault collaborator and configuration; the sync store is passed
/// `&mut` into every operation so there is exactly one writer and no ambient
/// state. Each operation is a full sweep that returns a best-effort success
/// count: per-item failures are logged and skipped, never propagated, so a
/// sweep always runs its file set to completion. Operations are re-entrant —
/// an interrupted sweep resumes safely on the next invocation because every
/// decision re-checks current state.
pub struct GtdEngine<V> {
    vault: V,
    config: GtdConfig,
}

impl<V: Vault> GtdEngine<V> {
    pub fn new(vault: V, config: GtdConfig) -> Self {
        Self { vault, config }
    }

    pub fn vault(&self) -> &V {
        &self.vault
    }

    /// Scan the configured search scopes for `#TODO` markers and create a
    /// task note for each marker not yet tracked in the store.
    ///
    /// Idempotency rests solely on the store membership check: the scanner
    /// re-finds the same markers indefinitely, and only the presence of a
    /// sync entry prevents duplicate creation. A lost entry (state
    /// corruption) therefore means a duplicate task on the next scan — an
    /// accepted design constraint.
    pub async fn create_tasks_from_todos(&self, store: &mut SyncStore) -> usize {
        let mut created = 0;

        for path in self.scoped_notes().await {
            let content = match self.vault.read(&path).await {
                Ok(content) => content,
                Err(err) => {
                    warn!(path = %path, error = %err, "failed to read note while scanning");
                    continue;
                }
            };

            for marker in scan_note(&path, &content) {
                if store.has(&marker.todo_id) {
                    continue;
                }
                match self.create_task(&marker).await {
                    Ok(entry) => {
                        info!(todo_id = %marker.todo_id, task_file = %entry.task_file, "created task from marker");
                        store.set(entry);
                        created += 1;
                    }
                    Err(err) => {
                        warn!(todo_id = %marker.todo_id, path = %path, error = %err, "failed to create task from marker");
                    }
                }
            }
        }

        created
    }

    /// For every tracked entry whose task has been marked `done`, rewrite
    /// the source checkbox from unchecked to checked and retire the entry.
    ///
    /// Entries whose task file no longer exists are dropped (stale-entry
    /// garbage collection). A source line that no longer carries the
    /// unchecked pattern is left alone together with its entry: only a
    /// successful rewrite retires an entry, so a user-edited line is
    /// retried on every cycle and stays inspectable.
    pub async fn update_checkboxes_from_tasks(&self, store: &mut SyncStore) -> usize {
        let mut updated = 0;

        for todo_id in store.ids() {
            let Some(entry) = store.get(&todo_id).cloned() else {
                continue;
            };

            if !self.vault.exists(&entry.task_file).await {
                debug!(todo_id = %todo_id, task_file = %entry.task_file, "task file gone, dropping stale sync entry");
                store.delete(&todo_id);
                continue;
            }

            let meta = match self.vault.frontmatter(&entry.task_file).await {
                Ok(meta) => meta,
                Err(err) => {
                    warn!(todo_id = %todo_id, task_file = %entry.task_file, error = %err, "failed to read task front-matter");
                    continue;
                }
            };
            if status_of(&meta) != Some(TaskStatus::Done) {
                continue;
            }

            match self.propagate_completion(&entry).await {
                Ok(true) => {
                    store.delete(&todo_id);
                    updated += 1;
                    info!(todo_id = %todo_id, source_file = %entry.source_file, line = entry.source_line, "checked source checkbox");
                }
                Ok(false) => {
                    debug!(todo_id = %todo_id, source_file = %entry.source_file, line = entry.source_line, "source line no longer matches, keeping entry");
                }
                Err(err) => {
                    warn!(todo_id = %todo_id, source_file = %entry.source_file, error = %err, "checkbox propagation failed");
                }
            }
        }

        updated
    }

    /// Roll forward every task whose scheduled date lies strictly before the
    /// start of the current local day. Absent or unparsable dates classify
    /// as "not overdue" and are left untouched.
    pub async fn update_overdue_tasks(&self) -> usize {
        let mut updated = 0;
        let today = Local::now().date_naive();

        for path in self.task_files().await {
            let meta = match self.vault.frontmatter(&path).await {
                Ok(meta) => meta,
                Err(err) => {
                    warn!(path = %path, error = %err, "failed to read task front-matter");
                    continue;
                }
            };
            let Some(scheduled) = meta.get(note::SCHEDULED_KEY).and_then(|raw| parse_date(raw))
            else {
                continue;
            };
            if scheduled >= today {
                continue;
            }

            let value = today.format("%Y-%m-%d").to_string();
            match self
                .vault
                .update_frontmatter(&path, Box::new(move |fm| fm.set(note::SCHEDULED_KEY, &value)))
                .await
            {
                Ok(()) => {
                    info!(path = %path, from = %scheduled, "rolled overdue task forward");
                    updated += 1;
                }
                Err(err) => {
                    warn!(path = %path, error = %err, "failed to roll task forward");
                }
            }
        }

        updated
    }

    /// Delete every task whose status is `done`, cleaning up the matching
    /// sync entry when one is still tracked.
    pub async fn delete_completed_tasks(&self, store: &mut SyncStore) -> usize {
        self.delete_matching(store, "completed", |meta| {
            status_of(meta) == Some(TaskStatus::Done)
        })
        .await
    }

    /// Delete every task whose kind is the trash category, cleaning up the
    /// matching sync entry when one is still tracked.
    pub async fn delete_trash_tasks(&self, store: &mut SyncStore) -> usize {
        self.delete_matching(store, "trash", |meta| {
            kind_of(meta) == Some(TaskKind::Trash)
        })
        .await
    }

    // ── helpers ──────────────────────────────────────────────────────────────

    async fn create_task(&self, marker: &Marker) -> anyhow::Result<SyncEntry> {
        let now = Local::now();
        let task_id = note::task_id(&now);
        let file_name = note::task_file_name(&task_id, &marker.content);
        let dir = &self.config.tasks.dir;

        if !self.vault.dir_exists(dir).await {
            self.vault.create_dir(dir).await?;
        }

        let task_path = format!("{dir}/{file_name}");
        let body = note::render_task_note(&task_id, marker, &now);
        self.vault.create(&task_path, &body).await?;

        Ok(SyncEntry {
            todo_id: marker.todo_id.clone(),
            task_file: task_path,
            source_file: marker.source_file.clone(),
            source_line: marker.line_number,
            created: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        })
    }

    /// Rewrite the source checkbox for `entry`. `Ok(false)` means the line
    /// is out of range or no longer carries the unchecked pattern.
    async fn propagate_completion(&self, entry: &SyncEntry) -> anyhow::Result<bool> {
        let content = self.vault.read(&entry.source_file).await?;
        let mut lines: Vec<String> = content.split('\n').map(str::to_string).collect();

        let Some(line) = lines.get(entry.source_line) else {
            return Ok(false);
        };
        let Some(rewritten) = check_marker_line(line) else {
            return Ok(false);
        };

        lines[entry.source_line] = rewritten;
        self.vault.write(&entry.source_file, &lines.join("\n")).await?;
        Ok(true)
    }

    async fn delete_matching(
        &self,
        store: &mut SyncStore,
        what: &str,
        qualifies: impl Fn(&BTreeMap<String, String>) -> bool,
    ) -> usize {
        let mut deleted = 0;

        for path in self.task_files().await {
            let meta = match self.vault.frontmatter(&path).await {
                Ok(meta) => meta,
                Err(err) => {
                    warn!(path = %path, error = %err, "failed to read task front-matter");
                    continue;
                }
            };
            if !qualifies(&meta) {
                continue;
            }

            match self.vault.delete(&path).await {
                Ok(()) => {
                    deleted += 1;
                    if let Some(todo_id) = store.remove_by_task_file(&path) {
                        debug!(todo_id = %todo_id, path = %path, "removed sync entry for deleted task");
                    }
                    info!(path = %path, "deleted {what} task");
                }
                Err(err) => {
                    warn!(path = %path, error = %err, "failed to delete {what} task");
                }
            }
        }

        deleted
    }

    /// All notes inside the configured task directory.
    async fn task_files(&self) -> Vec<String> {
        let notes = match self.vault.list_notes().await {
            Ok(notes) => notes,
            Err(err) => {
                warn!(error = %err, "note enumeration failed");
                return Vec::new();
            }
        };
        let dir = &self.config.tasks.dir;
        let prefix = format!("{dir}/");
        notes
            .into_iter()
            .filter(|path| path == dir || path.starts_with(&prefix))
            .collect()
    }

    /// All notes restricted to the configured search scopes.
    async fn scoped_notes(&self) -> Vec<String> {
        let notes = match self.vault.list_notes().await {
            Ok(notes) => notes,
            Err(err) => {
                warn!(error = %err, "note enumeration failed");
                return Vec::new();
            }
        };
        notes
            .into_iter()
            .filter(|path| in_scope(path, &self.config.scan.scopes))
            .collect()
    }
}

/// Empty scope list, or a single empty-string scope, means the whole vault.
fn in_scope(path: &str, scopes: &[String]) -> bool {
    if scopes.is_empty() {
        return true;
    }
    scopes.iter().any(|scope| {
        scope.is_empty() || path == scope || path.starts_with(&format!("{scope}/"))
    })
}

fn status_of(meta: &BTreeMap<String, String>) -> Option<TaskStatus> {
    meta.get(note::STATUS_KEY)
        .and_then(|raw| TaskStatus::from_label(raw))
}

fn kind_of(meta: &BTreeMap<String, String>) -> Option<TaskKind> {
    meta.get(note::KIND_KEY)
        .and_then(|raw| TaskKind::from_label(raw))
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}
