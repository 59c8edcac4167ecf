//! The narrow collaborator interface the engine uses for all file-storage
//! and metadata access. Keeping every host call behind [`Vault`] is what
//! makes the reconciliation sweeps unit-testable against [`MemVault`].

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use walkdir::WalkDir;

use crate::frontmatter::{self, Frontmatter};

/// Edit closure applied to a note's front-matter block in place.
pub type FrontmatterEdit = Box<dyn FnOnce(&mut Frontmatter) + Send>;

/// Host file-storage and metadata-index collaborator.
///
/// Paths are vault-relative with forward slashes. Implementations own the
/// mapping to real storage; the engine never touches the filesystem
/// directly.
#[async_trait]
pub trait Vault: Send + Sync {
    /// Enumerate all markdown note paths in a stable order.
    async fn list_notes(&self) -> Result<Vec<String>>;

    async fn read(&self, path: &str) -> Result<String>;

    /// Overwrite an existing note with new content.
    async fn write(&self, path: &str, content: &str) -> Result<()>;

    /// Create a new file; errors when the path already exists. The parent
    /// directory must exist (see [`Vault::create_dir`]).
    async fn create(&self, path: &str, content: &str) -> Result<()>;

    async fn delete(&self, path: &str) -> Result<()>;

    async fn exists(&self, path: &str) -> bool;

    async fn dir_exists(&self, dir: &str) -> bool;

    async fn create_dir(&self, dir: &str) -> Result<()>;

    /// Parsed front-matter of a note as a lookup map; empty when the note
    /// has no front-matter block.
    async fn frontmatter(&self, path: &str) -> Result<BTreeMap<String, String>> {
        let content = self.read(path).await?;
        Ok(frontmatter::lookup(&content))
    }

    /// Apply an edit to a note's front-matter block, preserving field order,
    /// unknown fields, and the note body.
    async fn update_frontmatter(&self, path: &str, edit: FrontmatterEdit) -> Result<()> {
        let content = self.read(path).await?;
        let Some(updated) = frontmatter::update(&content, edit) else {
            bail!("no front-matter block in {path}");
        };
        self.write(path, &updated).await
    }
}

// ── Filesystem vault ─────────────────────────────────────────────────────────

/// Vault rooted at a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

#[async_trait]
impl Vault for FsVault {
    async fn list_notes(&self) -> Result<Vec<String>> {
        let mut notes = Vec::new();
        for entry in WalkDir::new(&self.root).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.path().extension().and_then(|ext| ext.to_str()) != Some("md") {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .context("walked path outside vault root")?;
            let mut parts = Vec::new();
            for component in relative.components() {
                parts.push(component.as_os_str().to_string_lossy().to_string());
            }
            notes.push(parts.join("/"));
        }
        notes.sort();
        Ok(notes)
    }

    async fn read(&self, path: &str) -> Result<String> {
        tokio::fs::read_to_string(self.resolve(path))
            .await
            .with_context(|| format!("failed to read {path}"))
    }

    async fn write(&self, path: &str, content: &str) -> Result<()> {
        tokio::fs::write(self.resolve(path), content)
            .await
            .with_context(|| format!("failed to write {path}"))
    }

    async fn create(&self, path: &str, content: &str) -> Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(self.resolve(path))
            .await
            .with_context(|| format!("failed to create {path}"))?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        tokio::fs::remove_file(self.resolve(path))
            .await
            .with_context(|| format!("failed to delete {path}"))
    }

    async fn exists(&self, path: &str) -> bool {
        tokio::fs::try_exists(self.resolve(path)).await.unwrap_or(false)
    }

    async fn dir_exists(&self, dir: &str) -> bool {
        tokio::fs::metadata(self.resolve(dir))
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false)
    }

    async fn create_dir(&self, dir: &str) -> Result<()> {
        tokio::fs::create_dir_all(self.resolve(dir))
            .await
            .with_context(|| format!("failed to create directory {dir}"))
    }
}

// ── In-memory vault ──────────────────────────────────────────────────────────

/// In-memory vault used by unit tests and dry runs. `BTreeMap` keeps note
/// enumeration deterministic.
#[derive(Debug, Default)]
pub struct MemVault {
    files: Mutex<BTreeMap<String, String>>,
    dirs: Mutex<BTreeSet<String>>,
}

impl MemVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a note, creating or replacing it. Test convenience.
    pub fn seed(&self, path: &str, content: &str) {
        self.files
            .lock()
            .expect("mem vault lock poisoned")
            .insert(path.to_string(), content.to_string());
    }

    fn files(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.files.lock().expect("mem vault lock poisoned")
    }

    fn dirs(&self) -> std::sync::MutexGuard<'_, BTreeSet<String>> {
        self.dirs.lock().expect("mem vault lock poisoned")
    }
}

#[async_trait]
impl Vault for MemVault {
    async fn list_notes(&self) -> Result<Vec<String>> {
        Ok(self.files().keys().cloned().collect())
    }

    async fn read(&self, path: &str) -> Result<String> {
        self.files()
            .get(path)
            .cloned()
            .with_context(|| format!("no such note: {path}"))
    }

    async fn write(&self, path: &str, content: &str) -> Result<()> {
        self.files().insert(path.to_string(), content.to_string());
        Ok(())
    }

    async fn create(&self, path: &str, content: &str) -> Result<()> {
        let mut files = self.files();
        if files.contains_key(path) {
            bail!("already exists: {path}");
        }
        files.insert(path.to_string(), content.to_string());
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        if self.files().remove(path).is_none() {
            bail!("no such note: {path}");
        }
        Ok(())
    }

    async fn exists(&self, path: &str) -> bool {
        self.files().contains_key(path)
    }

    async fn dir_exists(&self, dir: &str) -> bool {
        self.dirs().contains(dir)
    }

    async fn create_dir(&self, dir: &str) -> Result<()> {
        self.dirs().insert(dir.to_string());
        Ok(())
    }
}
