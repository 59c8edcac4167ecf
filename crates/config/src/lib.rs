use std::fs;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

// ── Vault paths ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Root directory of the note vault. All note paths are relative to it.
    pub root: String,
    /// Path of the persisted sync-state JSON file, relative to the vault root.
    pub state_file: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            root: ".".to_string(),
            state_file: ".gtdvault/sync.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TasksConfig {
    /// Directory (inside the vault) where generated task notes are stored.
    pub dir: String,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            dir: "GTD/Tasks".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Directory prefixes searched for `#TODO` markers.
    /// An empty list, or a single empty string, means the whole vault.
    pub scopes: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            scopes: vec![String::new()],
        }
    }
}

// ── Periodic operations ───────────────────────────────────────────────────────

/// Enable flags and cadences for the five reconciliation operations.
///
/// Everything defaults to off: `watch` mode does nothing until the user opts
/// into the operations they want automated. The manual subcommands ignore
/// these flags entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoConfig {
    pub create_from_todo: bool,
    pub update_checkbox: bool,
    pub update_schedule: bool,
    pub delete_completed: bool,
    pub delete_trash: bool,
    pub create_from_todo_interval_hours: u64,
    pub update_checkbox_interval_hours: u64,
    pub update_schedule_interval_hours: u64,
    pub delete_completed_interval_hours: u64,
    pub delete_trash_interval_hours: u64,
}

impl Default for AutoConfig {
    fn default() -> Self {
        Self {
            create_from_todo: false,
            update_checkbox: false,
            update_schedule: false,
            delete_completed: false,
            delete_trash: false,
            create_from_todo_interval_hours: 1,
            update_checkbox_interval_hours: 1,
            update_schedule_interval_hours: 24,
            delete_completed_interval_hours: 24,
            delete_trash_interval_hours: 24,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GtdConfig {
    pub vault: VaultConfig,
    pub tasks: TasksConfig,
    pub scan: ScanConfig,
    pub auto: AutoConfig,
}

impl GtdConfig {
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::default();
        if let Ok(raw) = fs::read_to_string(path) {
            config = toml::from_str(&raw)?;
        }
        Ok(config)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let rendered = toml::to_string_pretty(self)?;
        fs::write(path, rendered)?;
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
