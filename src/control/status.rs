// src/control/status.rs

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::Result;
use chrono::{DateTime, Local};
use tracing::warn;

use crate::control::tail::tail_lines;
use crate::registry::{is_alive, RegistryEntry, RegistryStore};

/// How many trailing log lines a snapshot shows per live process.
pub const SNAPSHOT_TAIL_LINES: usize = 10;

/// A registry entry whose PID is currently alive, with a tail of its log.
#[derive(Debug, Clone)]
pub struct LiveProcess {
    pub entry: RegistryEntry,
    pub recent: Vec<String>,
}

/// A log file with no corresponding registry entry: a previously tracked
/// process that has since finished or been removed.
#[derive(Debug, Clone)]
pub struct HistoricalLog {
    pub path: PathBuf,
    pub size: u64,
    pub modified: Option<DateTime<Local>>,
}

/// One observation of the registry and the logs directory.
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    pub live: Vec<LiveProcess>,
    pub stale: Vec<RegistryEntry>,
    pub historical: Vec<HistoricalLog>,
}

impl StatusSnapshot {
    pub fn is_empty(&self) -> bool {
        self.live.is_empty() && self.stale.is_empty() && self.historical.is_empty()
    }
}

/// Classify every registry entry as live or stale, prune the stale ones, and
/// list historical log files.
///
/// This is a read-mostly operation: a missing registry file is an empty
/// snapshot, a corrupt or unreadable one degrades to "no known processes"
/// with a warning, and a failed stale-prune is advisory (warned, not
/// propagated).
pub fn snapshot(store: &RegistryStore, logs_dir: &Path) -> Result<StatusSnapshot> {
    let entries = match store.load() {
        Ok(entries) => entries,
        Err(err) => {
            warn!(error = %err, "cannot read registry; treating as empty");
            Vec::new()
        }
    };

    let mut live = Vec::new();
    let mut stale = Vec::new();
    for entry in entries {
        if is_alive(entry.pid) {
            let recent = tail_lines(&entry.log_path, SNAPSHOT_TAIL_LINES).unwrap_or_else(|err| {
                warn!(path = ?entry.log_path, error = %err, "cannot read log tail");
                Vec::new()
            });
            live.push(LiveProcess { entry, recent });
        } else {
            stale.push(entry);
        }
    }

    if !stale.is_empty() {
        let stale_pids: Vec<u32> = stale.iter().map(|e| e.pid).collect();
        if let Err(err) = store.remove_many(&stale_pids) {
            warn!(error = %err, "failed to prune stale registry entries");
        }
    }

    let historical = historical_logs(logs_dir, &live);

    Ok(StatusSnapshot {
        live,
        stale,
        historical,
    })
}

/// Log files under `logs_dir` that no live entry owns.
fn historical_logs(logs_dir: &Path, live: &[LiveProcess]) -> Vec<HistoricalLog> {
    let entries = match std::fs::read_dir(logs_dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(err) => {
            warn!(dir = ?logs_dir, error = %err, "cannot scan log directory");
            return Vec::new();
        }
    };

    let mut logs = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("log") {
            continue;
        }
        if live.iter().any(|p| p.entry.log_path == path) {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(err) => {
                warn!(path = ?path, error = %err, "unreadable log file metadata");
                continue;
            }
        };

        logs.push(HistoricalLog {
            path,
            size: metadata.len(),
            modified: metadata
                .modified()
                .ok()
                .map(|t: SystemTime| DateTime::<Local>::from(t)),
        });
    }

    logs.sort_by(|a, b| a.path.cmp(&b.path));
    logs
}
