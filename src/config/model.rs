// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::queue::descriptor::CommandMode;

/// Top-level configuration as read from a TOML file:
///
/// ```toml
/// [settings]
/// concurrent = false
/// verbose = false
/// log_once_commands = false
///
/// [[command]]
/// name = "api"
/// cmd = "node server.js"
/// mode = "keepAlive"
/// concurrent = true
/// cwd = "services/api"
/// env = { PORT = "3000" }
/// ```
///
/// `[[command]]` entries form an ordered array; their order is the queue
/// order.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    /// Global behaviour from `[settings]`.
    #[serde(default)]
    pub settings: Settings,

    /// The ordered command queue from `[[command]]`.
    #[serde(default)]
    pub command: Vec<CommandConfig>,
}

/// `[settings]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    /// Default concurrency policy for commands that omit `concurrent`.
    #[serde(default)]
    pub concurrent: bool,

    /// Forward command output to the console during `run`.
    ///
    /// The `--verbose` CLI flag overrides this to `true`.
    #[serde(default)]
    pub verbose: bool,

    /// Also persist once-command output through the background logger.
    ///
    /// Keep-alive output is always persisted; once-command output only when
    /// this is set.
    #[serde(default)]
    pub log_once_commands: bool,

    /// Stop launching further commands after a failure.
    ///
    /// Off by default: a non-zero exit code is recorded as a failure but the
    /// queue keeps going.
    #[serde(default)]
    pub halt_on_failure: bool,
}

/// One `[[command]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandConfig {
    /// Unique name, used for the log file and all reporting.
    pub name: String,

    /// The command line, split with shell-word rules into
    /// executable + arguments.
    pub cmd: String,

    /// `"once"` (default) or `"keepAlive"`.
    #[serde(default = "default_mode")]
    pub mode: CommandMode,

    /// Per-command concurrency flag; falls back to `settings.concurrent`.
    #[serde(default)]
    pub concurrent: Option<bool>,

    /// Working directory for the process.
    #[serde(default)]
    pub cwd: Option<String>,

    /// Extra environment variables.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

fn default_mode() -> CommandMode {
    CommandMode::Once
}
