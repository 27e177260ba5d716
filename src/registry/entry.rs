// src/registry/entry.rs

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::queue::descriptor::{CommandDescriptor, CommandMode};

/// Durable record of one tracked keep-alive process.
///
/// Serialized into the registry store as camelCase JSON:
///
/// ```json
/// {
///   "pid": 12345,
///   "name": "api",
///   "executable": "node",
///   "arguments": ["server.js"],
///   "mode": "keepAlive",
///   "startedAt": "2026-08-07T10:15:30.123Z",
///   "logPath": "/home/user/.seqr/logs/api.log"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
    pub pid: u32,
    pub name: String,
    pub executable: String,
    pub arguments: Vec<String>,
    pub mode: CommandMode,
    pub started_at: DateTime<Utc>,
    pub log_path: PathBuf,
}

impl RegistryEntry {
    /// Build an entry for a just-spawned process.
    pub fn new(descriptor: &CommandDescriptor, pid: u32, log_path: PathBuf) -> Self {
        Self {
            pid,
            name: descriptor.name.clone(),
            executable: descriptor.executable.clone(),
            arguments: descriptor.arguments.clone(),
            mode: descriptor.mode,
            started_at: Utc::now(),
            log_path,
        }
    }

    /// Seconds since `started_at`, clamped to zero for clock skew.
    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds().max(0)
    }

    /// Human-readable uptime like `"2h 3m 45s"`.
    pub fn uptime_display(&self) -> String {
        let total = self.uptime_secs();
        let (h, rem) = (total / 3600, total % 3600);
        let (m, s) = (rem / 60, rem % 60);
        if h > 0 {
            format!("{h}h {m}m {s}s")
        } else if m > 0 {
            format!("{m}m {s}s")
        } else {
            format!("{s}s")
        }
    }

    /// The full command line for display.
    pub fn command_line(&self) -> String {
        if self.arguments.is_empty() {
            self.executable.clone()
        } else {
            format!("{} {}", self.executable, self.arguments.join(" "))
        }
    }
}
