// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `seqr`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "seqr",
    version,
    about = "Run command queues and manage long-running processes across invocations.",
    long_about = None
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: CliCommand,

    /// Logging level for seqr's own diagnostics (error, warn, info, debug, trace).
    ///
    /// If omitted, `SEQR_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Override the registry store file.
    ///
    /// Default: `seqr-registry.json` in the system temp directory.
    #[arg(long, global = true, value_name = "PATH")]
    pub registry: Option<PathBuf>,

    /// Override the per-process log directory.
    ///
    /// Default: `~/.seqr/logs`.
    #[arg(long, global = true, value_name = "DIR")]
    pub logs_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum CliCommand {
    /// Run the command queue from a config file.
    Run {
        /// Path to the config file (TOML).
        #[arg(long, value_name = "PATH", default_value = "Seqr.toml")]
        config: PathBuf,

        /// Forward command output to the console in addition to the log files.
        #[arg(long)]
        verbose: bool,
    },

    /// Show tracked processes and their recent output, then exit.
    Status,

    /// Show tracked processes, then keep tailing their output until Ctrl-C.
    Watch,

    /// Terminate all tracked processes and clear the registry.
    Kill,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
