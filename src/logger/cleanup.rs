// src/logger/cleanup.rs

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, warn};

/// Log files older than this are removed by the retention sweep.
pub const RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Outcome of one retention sweep.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    /// Files deleted this sweep.
    pub removed: Vec<PathBuf>,
    /// Old files kept because a live registry entry still owns them.
    pub kept_live: usize,
}

/// Remove `.log` files in `logs_dir` whose last modification is older than
/// `max_age`.
///
/// `protected` holds the log paths of currently-live registry entries; those
/// files are never removed, regardless of age. A missing logs directory is an
/// empty sweep, and per-file failures are logged and skipped rather than
/// aborting the sweep.
pub fn cleanup_logs(
    logs_dir: &Path,
    max_age: Duration,
    protected: &HashSet<PathBuf>,
) -> Result<CleanupReport> {
    let mut report = CleanupReport::default();

    let entries = match std::fs::read_dir(logs_dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(report),
        Err(err) => {
            warn!(dir = ?logs_dir, error = %err, "cannot scan log directory; skipping cleanup");
            return Ok(report);
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                warn!(error = %err, "unreadable log directory entry; skipping");
                continue;
            }
        };

        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("log") {
            continue;
        }

        let age = entry
            .metadata()
            .and_then(|m| m.modified())
            .ok()
            .and_then(|mtime| mtime.elapsed().ok());

        let Some(age) = age else {
            continue;
        };

        if age <= max_age {
            continue;
        }

        if protected.contains(&path) {
            report.kept_live += 1;
            continue;
        }

        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = ?path, "removed expired log file");
                report.removed.push(path);
            }
            Err(err) => {
                warn!(path = ?path, error = %err, "failed to remove expired log file");
            }
        }
    }

    Ok(report)
}
