// src/lib.rs

pub mod cli;
pub mod config;
pub mod control;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logger;
pub mod logging;
pub mod queue;
pub mod registry;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::{CliArgs, CliCommand};
use crate::control::kill::KillOutcome;
use crate::control::status::StatusSnapshot;
use crate::control::{KillResult, TailEvent};
use crate::engine::{CommandOutcome, Engine, EngineOptions, QueueReport};
use crate::logger::{cleanup_logs, default_logs_dir, RETENTION};
use crate::queue::descriptor::CommandDescriptor;
use crate::registry::{is_alive, RegistryStore};

/// Where an invocation keeps its shared state.
///
/// Passed into every controller explicitly so tests can point the whole tool
/// at a temp directory instead of the real registry and logs.
#[derive(Debug, Clone)]
pub struct RuntimePaths {
    pub registry_path: PathBuf,
    pub logs_dir: PathBuf,
}

impl RuntimePaths {
    pub fn from_cli(args: &CliArgs) -> Self {
        Self {
            registry_path: args
                .registry
                .clone()
                .unwrap_or_else(RegistryStore::default_path),
            logs_dir: args.logs_dir.clone().unwrap_or_else(default_logs_dir),
        }
    }
}

/// High-level entry point used by `main.rs`.
///
/// Dispatches the subcommand, renders its structured result, and returns
/// whether every per-item outcome succeeded (the process exit code is the
/// caller's decision).
pub async fn run(args: CliArgs) -> Result<bool> {
    let paths = RuntimePaths::from_cli(&args);

    match args.command {
        CliCommand::Run { config, verbose } => run_queue(&paths, &config, verbose).await,
        CliCommand::Status => show_status(&paths),
        CliCommand::Watch => watch(&paths).await,
        CliCommand::Kill => kill(&paths).await,
    }
}

/// Load the config, sweep expired logs, run the queue, and stay resident
/// streaming keep-alive output until Ctrl-C.
async fn run_queue(paths: &RuntimePaths, config_path: &Path, verbose: bool) -> Result<bool> {
    let cfg = config::load_and_validate(config_path)?;

    let descriptors: Vec<CommandDescriptor> = cfg
        .command
        .iter()
        .map(|c| CommandDescriptor::from_config(c, cfg.settings.concurrent))
        .collect::<Result<_>>()
        .context("building command descriptors")?;

    let store = RegistryStore::new(&paths.registry_path);
    sweep_expired_logs(&store, &paths.logs_dir);

    let options = EngineOptions {
        verbose: verbose || cfg.settings.verbose,
        log_once_commands: cfg.settings.log_once_commands,
        halt_on_failure: cfg.settings.halt_on_failure,
    };

    let engine = Engine::new(store, &paths.logs_dir, options);
    let report = engine.run(descriptors).await?;
    print_queue_report(&report);

    // Keep-alive children are session leaders: they survive this invocation,
    // but their output is only persisted while we are here to pump it.
    if report.registered_count() > 0 && !report.interrupted {
        println!();
        println!("Streaming output of keep-alive processes. Ctrl-C detaches (processes keep running).");
        let _ = tokio::signal::ctrl_c().await;
        println!();
        println!("Detached. Use `seqr status`, `seqr watch` or `seqr kill` to manage them.");
    }

    Ok(report.all_ok())
}

fn show_status(paths: &RuntimePaths) -> Result<bool> {
    let store = RegistryStore::new(&paths.registry_path);
    let snapshot = control::snapshot(&store, &paths.logs_dir)?;
    print_snapshot(&snapshot);
    Ok(true)
}

async fn watch(paths: &RuntimePaths) -> Result<bool> {
    let store = RegistryStore::new(&paths.registry_path);
    let snapshot = control::snapshot(&store, &paths.logs_dir)?;
    print_snapshot(&snapshot);

    println!();
    println!("Watching for new output (Ctrl-C to stop)...");
    control::stream_until_cancelled(store, |event: TailEvent| {
        println!("{}", event.line);
    })
    .await?;

    println!("Watch stopped.");
    Ok(true)
}

async fn kill(paths: &RuntimePaths) -> Result<bool> {
    let store = RegistryStore::new(&paths.registry_path);
    let results = control::kill_all(&store).await?;
    print_kill_results(&results);
    Ok(results.iter().all(|r| !r.is_failure()))
}

/// Retention sweep at the start of every `run` invocation. Never fatal: a
/// failed sweep only costs disk space.
fn sweep_expired_logs(store: &RegistryStore, logs_dir: &Path) {
    let protected: HashSet<PathBuf> = match store.load() {
        Ok(entries) => entries
            .iter()
            .filter(|e| is_alive(e.pid))
            .map(|e| e.log_path.clone())
            .collect(),
        Err(err) => {
            warn!(error = %err, "cannot read registry before log cleanup; protecting nothing");
            HashSet::new()
        }
    };

    match cleanup_logs(logs_dir, RETENTION, &protected) {
        Ok(report) if !report.removed.is_empty() => {
            info!(removed = report.removed.len(), "removed expired log files");
        }
        Ok(_) => {}
        Err(err) => warn!(error = %err, "log retention sweep failed"),
    }
}

fn print_queue_report(report: &QueueReport) {
    println!("Queue results:");
    for result in &report.results {
        match &result.outcome {
            CommandOutcome::Completed { exit_code: 0 } => {
                println!("  ✔ {} ({}) - exit 0", result.name, result.mode);
            }
            CommandOutcome::Completed { exit_code } => {
                println!("  ✘ {} ({}) - exit {}", result.name, result.mode, exit_code);
            }
            CommandOutcome::Registered { pid } => {
                println!("  ● {} ({}) - running, pid {}", result.name, result.mode, pid);
            }
            CommandOutcome::LaunchFailed { error } => {
                println!("  ✘ {} ({}) - {}", result.name, result.mode, error);
            }
            CommandOutcome::Skipped => {
                println!("  – {} ({}) - skipped", result.name, result.mode);
            }
        }
    }
    if report.interrupted {
        println!("  (run interrupted; remaining commands were not launched)");
    }
    if report.halted {
        println!("  (halt_on_failure: remaining commands were not launched)");
    }
}

fn print_snapshot(snapshot: &StatusSnapshot) {
    if snapshot.is_empty() {
        println!("No tracked processes and no log history.");
        return;
    }

    println!("Live processes ({}):", snapshot.live.len());
    for process in &snapshot.live {
        let entry = &process.entry;
        println!(
            "  ● {} (pid {}) - {} - up {}",
            entry.name,
            entry.pid,
            entry.command_line(),
            entry.uptime_display()
        );
        for line in &process.recent {
            println!("      {line}");
        }
    }

    if !snapshot.stale.is_empty() {
        println!("Stale entries pruned ({}):", snapshot.stale.len());
        for entry in &snapshot.stale {
            println!(
                "  ○ {} (pid {}) - started {}",
                entry.name,
                entry.pid,
                entry.started_at.to_rfc3339()
            );
        }
    }

    if !snapshot.historical.is_empty() {
        println!("Stopped-process logs ({}):", snapshot.historical.len());
        for log in &snapshot.historical {
            let modified = log
                .modified
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "unknown".to_string());
            println!(
                "  {} ({}, modified {})",
                log.path.display(),
                format_size(log.size),
                modified
            );
        }
    }
}

fn print_kill_results(results: &[KillResult]) {
    if results.is_empty() {
        println!("No tracked processes.");
        return;
    }

    println!("Kill results:");
    for result in results {
        match &result.outcome {
            KillOutcome::Terminated => {
                println!("  ✔ {} (pid {}) - terminated", result.name, result.pid);
            }
            KillOutcome::ForceKilled => {
                println!("  ✔ {} (pid {}) - force-killed", result.name, result.pid);
            }
            KillOutcome::AlreadyDead => {
                println!("  ○ {} (pid {}) - already gone, pruned", result.name, result.pid);
            }
            KillOutcome::SignalFailed { error } => {
                println!("  ✘ {} (pid {}) - {}", result.name, result.pid, error);
            }
        }
    }
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}
