// src/logger/writer.rs

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::logger::classify::CommandType;

/// Which output stream a log line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

/// Handle to a per-process log file.
///
/// Cloneable so the stdout and stderr reader tasks can share it; lines from
/// both streams are serialized through one writer task, which appends and
/// flushes per line so concurrent tailers see output promptly.
#[derive(Debug, Clone)]
pub struct ProcessLogger {
    tx: mpsc::UnboundedSender<LogLine>,
    path: PathBuf,
}

#[derive(Debug)]
struct LogLine {
    stream: StreamKind,
    message: String,
}

impl ProcessLogger {
    /// Open (or create) the log file for `name` and start the writer task.
    ///
    /// Errors here (unwritable directory) must not prevent the underlying
    /// command from running: the caller degrades to no persistent logging and
    /// reports the condition once.
    pub fn attach(logs_dir: &Path, name: &str, command_type: CommandType) -> Result<Self> {
        std::fs::create_dir_all(logs_dir)
            .with_context(|| format!("creating log directory {:?}", logs_dir))?;

        let path = log_file_path(logs_dir, name);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening log file {:?}", path))?;

        let (tx, mut rx) = mpsc::unbounded_channel::<LogLine>();
        let name = name.to_string();
        let task_path = path.clone();

        tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                let formatted = format_line(&name, command_type, line.stream, &line.message);
                if let Err(err) = writeln!(file, "{formatted}").and_then(|_| file.flush()) {
                    warn!(path = ?task_path, error = %err, "failed to append log line");
                }
            }
            debug!(path = ?task_path, "log writer finished");
        });

        Ok(Self { tx, path })
    }

    /// Append one output line. Never blocks and never fails the producer;
    /// lines sent after the writer task has gone are dropped.
    pub fn log(&self, stream: StreamKind, message: &str) {
        let _ = self.tx.send(LogLine {
            stream,
            message: message.to_string(),
        });
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Log file location for a process name: `<logs_dir>/<name>.log`.
pub fn log_file_path(logs_dir: &Path, name: &str) -> PathBuf {
    logs_dir.join(format!("{name}.log"))
}

/// Default logs directory: `~/.seqr/logs` (falls back to a temp-dir location
/// when no home directory is available).
pub fn default_logs_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".seqr").join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("seqr-logs"))
}

/// `[timestamp] [type] [name] [icon] message`, millisecond wall-clock
/// timestamps. Stderr lines carry a `!` marker instead of the type icon.
fn format_line(name: &str, command_type: CommandType, stream: StreamKind, message: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
    let icon = match stream {
        StreamKind::Stdout => command_type.icon(),
        StreamKind::Stderr => "!",
    };
    format!(
        "[{timestamp}] [{}] [{name}] [{icon}] {message}",
        command_type.tag()
    )
}
