// src/registry/store.rs

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use tracing::debug;

use crate::registry::entry::RegistryEntry;

/// File-backed registry store.
///
/// The store is a tiny embedded database with an explicit concurrency
/// contract: every mutation is a full load-mutate-save cycle performed while
/// holding an exclusive advisory lock on a sibling lock file, and every save
/// goes through a temp-file + rename so readers never observe a partial
/// write. The lock is an OS-level file lock (not an in-memory mutex) because
/// the writers racing here are separate invocations of the tool.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    path: PathBuf,
}

/// Exclusive advisory lock on the store.
///
/// Held for the duration of one load-mutate-save cycle; released on drop
/// (closing the descriptor releases the lock, including after a crash).
struct StoreLock {
    _file: File,
}

impl RegistryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Well-known default location: `seqr-registry.json` in the system temp
    /// directory.
    pub fn default_path() -> PathBuf {
        std::env::temp_dir().join("seqr-registry.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all entries.
    ///
    /// A missing or empty file is an empty registry. Corrupt content is an
    /// error: silently discarding entries would orphan running processes.
    pub fn load(&self) -> Result<Vec<RegistryEntry>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Vec::new());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("reading registry at {:?}", self.path));
            }
        };

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&contents)
            .with_context(|| format!("parsing registry at {:?} (corrupt store?)", self.path))
    }

    /// Replace the registry contents.
    ///
    /// Writes to a temp sibling and renames over the store path, so a reader
    /// racing this save sees either the old or the new contents, never a
    /// torn file.
    pub fn save(&self, entries: &[RegistryEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating registry directory {:?}", parent))?;
        }

        let json = serde_json::to_string_pretty(entries).context("serializing registry")?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json)
            .with_context(|| format!("writing registry temp file {:?}", tmp_path))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("replacing registry at {:?}", self.path))?;

        Ok(())
    }

    /// Add an entry, replacing any existing entry with the same PID.
    ///
    /// At most one entry per PID may exist at a time; a PID being reused by a
    /// new keep-alive process supersedes the stale record.
    pub fn add_entry(&self, entry: RegistryEntry) -> Result<()> {
        let _lock = self.lock_exclusive()?;

        let mut entries = self.load()?;
        entries.retain(|e| e.pid != entry.pid);
        debug!(pid = entry.pid, name = %entry.name, "registering process");
        entries.push(entry);

        self.save(&entries)
    }

    /// Remove the entry for `pid`, returning it if it was present.
    pub fn remove_entry(&self, pid: u32) -> Result<Option<RegistryEntry>> {
        let _lock = self.lock_exclusive()?;

        let mut entries = self.load()?;
        let idx = entries.iter().position(|e| e.pid == pid);
        let removed = idx.map(|idx| entries.remove(idx));

        if removed.is_some() {
            debug!(pid, "removing process from registry");
            self.save(&entries)?;
        }

        Ok(removed)
    }

    /// Remove every entry whose PID is in `pids`; returns how many were
    /// removed.
    ///
    /// Used by status/watch to prune stale entries in one cycle.
    pub fn remove_many(&self, pids: &[u32]) -> Result<usize> {
        if pids.is_empty() {
            return Ok(0);
        }

        let _lock = self.lock_exclusive()?;

        let mut entries = self.load()?;
        let before = entries.len();
        entries.retain(|e| !pids.contains(&e.pid));
        let removed = before - entries.len();

        if removed > 0 {
            debug!(removed, "pruning stale registry entries");
            self.save(&entries)?;
        }

        Ok(removed)
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("json.lock")
    }

    fn lock_exclusive(&self) -> Result<StoreLock> {
        let lock_path = self.lock_path();
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating registry directory {:?}", parent))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("opening registry lock file {:?}", lock_path))?;

        file.lock_exclusive()
            .with_context(|| format!("locking registry lock file {:?}", lock_path))?;

        Ok(StoreLock { _file: file })
    }
}
