// src/queue/descriptor.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::model::CommandConfig;

/// Execution mode of a command.
///
/// Serialized form matches the registry store schema (`"once"` /
/// `"keepAlive"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommandMode {
    /// Runs to completion; the result is its exit status.
    Once,
    /// Started and left running; tracked in the registry until explicitly
    /// killed or found dead.
    KeepAlive,
}

impl std::fmt::Display for CommandMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandMode::Once => write!(f, "once"),
            CommandMode::KeepAlive => write!(f, "keepAlive"),
        }
    }
}

/// Immutable description of one command in a queue run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDescriptor {
    /// Unique human-readable identifier within a queue run.
    pub name: String,
    /// The program to launch.
    pub executable: String,
    /// Arguments passed to the program.
    pub arguments: Vec<String>,
    /// Working directory for the process, if overridden.
    pub working_dir: Option<PathBuf>,
    /// Extra environment variables for the process.
    pub env: BTreeMap<String, String>,
    /// Whether the command runs to completion or is left running.
    pub mode: CommandMode,
    /// If true, may run in parallel with adjacent `concurrent` commands;
    /// if false, runs in strict sequence relative to other sequential ones.
    pub concurrent: bool,
}

impl CommandDescriptor {
    /// Build a descriptor from a validated config entry.
    ///
    /// `default_concurrent` applies when the entry does not set `concurrent`
    /// itself ([`crate::config::model::Settings::concurrent`]).
    pub fn from_config(cfg: &CommandConfig, default_concurrent: bool) -> Result<Self> {
        let mut parts = shell_words::split(&cfg.cmd)
            .with_context(|| format!("splitting cmd for command '{}'", cfg.name))?;
        anyhow::ensure!(!parts.is_empty(), "command '{}' has an empty cmd", cfg.name);

        let executable = parts.remove(0);

        Ok(Self {
            name: cfg.name.clone(),
            executable,
            arguments: parts,
            working_dir: cfg.cwd.clone().map(PathBuf::from),
            env: cfg.env.clone(),
            mode: cfg.mode,
            concurrent: cfg.concurrent.unwrap_or(default_concurrent),
        })
    }
}
