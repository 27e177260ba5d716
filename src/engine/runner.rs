// src/engine/runner.rs

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::exec;
use crate::logger::{CommandType, ProcessLogger};
use crate::queue::descriptor::{CommandDescriptor, CommandMode};
use crate::queue::partition::{partition, Group};
use crate::registry::{RegistryEntry, RegistryStore};

/// Caller-level policy for a queue run.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Forward command output to the console.
    pub verbose: bool,
    /// Persist once-command output through the background logger too.
    pub log_once_commands: bool,
    /// Stop launching further groups once a command has failed.
    pub halt_on_failure: bool,
}

/// What happened to one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// A once-command ran to completion with this exit code.
    Completed { exit_code: i32 },
    /// A keep-alive command was started and registered.
    Registered { pid: u32 },
    /// The process could not be launched (missing executable, bad working
    /// directory, permissions). Never leaves a registry entry behind.
    LaunchFailed { error: String },
    /// Not launched because the queue run was interrupted.
    Skipped,
}

impl CommandOutcome {
    pub fn is_failure(&self) -> bool {
        match self {
            CommandOutcome::Completed { exit_code } => *exit_code != 0,
            CommandOutcome::LaunchFailed { .. } => true,
            CommandOutcome::Registered { .. } | CommandOutcome::Skipped => false,
        }
    }
}

/// Per-command result, in queue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub name: String,
    pub mode: CommandMode,
    pub outcome: CommandOutcome,
}

/// Result of one queue run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueReport {
    pub results: Vec<CommandResult>,
    /// Set when Ctrl-C stopped the run before all groups were launched.
    pub interrupted: bool,
    /// Set when `halt_on_failure` stopped the run after a failed command.
    pub halted: bool,
}

impl QueueReport {
    pub fn all_ok(&self) -> bool {
        self.results.iter().all(|r| !r.outcome.is_failure())
    }

    /// How many keep-alive processes this run registered.
    pub fn registered_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, CommandOutcome::Registered { .. }))
            .count()
    }
}

/// Drives a queue of commands: sequential commands one at a time, concurrent
/// groups together, preserving queue order in the report.
#[derive(Debug, Clone)]
pub struct Engine {
    store: RegistryStore,
    logs_dir: PathBuf,
    options: EngineOptions,
}

impl Engine {
    pub fn new(store: RegistryStore, logs_dir: impl Into<PathBuf>, options: EngineOptions) -> Self {
        Self {
            store,
            logs_dir: logs_dir.into(),
            options,
        }
    }

    /// Run the whole queue, returning per-command outcomes in queue order.
    ///
    /// Ctrl-C between groups stops launching further commands; members of the
    /// currently running group are allowed to finish. Only a registry write
    /// failure aborts the run with an error; per-command launch failures are
    /// recorded and the queue continues.
    pub async fn run(&self, commands: Vec<CommandDescriptor>) -> Result<QueueReport> {
        let groups = partition(commands);
        info!(groups = groups.len(), "starting queue run");

        let mut interrupt_rx = spawn_interrupt_listener();

        let mut results: Vec<CommandResult> = Vec::new();
        let mut interrupted = false;
        let mut halted = false;

        let mut iter = groups.into_iter();
        while let Some(group) = iter.next() {
            if *interrupt_rx.borrow_and_update() {
                warn!("queue run interrupted; skipping remaining commands");
                interrupted = true;
                push_skipped(&mut results, group);
                for group in iter.by_ref() {
                    push_skipped(&mut results, group);
                }
                break;
            }

            if self.options.halt_on_failure && results.iter().any(|r| r.outcome.is_failure()) {
                warn!("previous command failed and halt_on_failure is set; skipping the rest");
                halted = true;
                push_skipped(&mut results, group);
                for group in iter.by_ref() {
                    push_skipped(&mut results, group);
                }
                break;
            }

            match group {
                Group::Sequential(cmd) => {
                    results.push(self.run_command(cmd).await?);
                }
                Group::Concurrent(cmds) => {
                    debug!(size = cmds.len(), "dispatching concurrent group");
                    let mut handles = Vec::with_capacity(cmds.len());
                    for cmd in cmds {
                        let engine = self.clone();
                        handles.push(tokio::spawn(async move { engine.run_command(cmd).await }));
                    }

                    // The group completes as a whole before the next one
                    // starts; results keep the original queue order.
                    let mut group_results = Vec::with_capacity(handles.len());
                    for handle in handles {
                        group_results.push(handle.await.context("joining command task")?);
                    }
                    for result in group_results {
                        results.push(result?);
                    }
                }
            }
        }

        Ok(QueueReport {
            results,
            interrupted,
            halted,
        })
    }

    async fn run_command(&self, descriptor: CommandDescriptor) -> Result<CommandResult> {
        let outcome = match descriptor.mode {
            CommandMode::Once => self.run_once_command(&descriptor).await,
            CommandMode::KeepAlive => self.run_keep_alive_command(&descriptor).await?,
        };

        Ok(CommandResult {
            name: descriptor.name,
            mode: descriptor.mode,
            outcome,
        })
    }

    async fn run_once_command(&self, descriptor: &CommandDescriptor) -> CommandOutcome {
        let logger = if self.options.log_once_commands {
            let command_type = CommandType::from_executable(&descriptor.executable);
            match ProcessLogger::attach(&self.logs_dir, &descriptor.name, command_type) {
                Ok(logger) => Some(logger),
                Err(err) => {
                    warn!(
                        command = %descriptor.name,
                        error = %err,
                        "persistent logging disabled for this command"
                    );
                    None
                }
            }
        } else {
            None
        };

        match exec::run_once(descriptor, logger, self.options.verbose).await {
            Ok(exit_code) => CommandOutcome::Completed { exit_code },
            Err(err) => {
                warn!(command = %descriptor.name, error = %err, "command failed to run");
                CommandOutcome::LaunchFailed {
                    error: format!("{err:#}"),
                }
            }
        }
    }

    /// Spawn, then register before yielding control: the ordering guarantee
    /// is that the next sequential command never starts before this entry is
    /// durable. A launch failure never produces a registry entry; a registry
    /// write failure is fatal for the whole run.
    async fn run_keep_alive_command(
        &self,
        descriptor: &CommandDescriptor,
    ) -> Result<CommandOutcome> {
        let spawned =
            match exec::spawn_keep_alive(descriptor, &self.logs_dir, self.options.verbose).await {
                Ok(spawned) => spawned,
                Err(err) => {
                    warn!(command = %descriptor.name, error = %err, "keep-alive command failed to start");
                    return Ok(CommandOutcome::LaunchFailed {
                        error: format!("{err:#}"),
                    });
                }
            };

        let entry = RegistryEntry::new(descriptor, spawned.pid, spawned.log_path.clone());
        self.store
            .add_entry(entry)
            .with_context(|| format!("registering keep-alive command '{}'", descriptor.name))?;

        info!(command = %descriptor.name, pid = spawned.pid, "keep-alive command registered");
        Ok(CommandOutcome::Registered { pid: spawned.pid })
    }
}

fn push_skipped(results: &mut Vec<CommandResult>, group: Group) {
    let cmds = match group {
        Group::Sequential(cmd) => vec![cmd],
        Group::Concurrent(cmds) => cmds,
    };
    for cmd in cmds {
        results.push(CommandResult {
            name: cmd.name,
            mode: cmd.mode,
            outcome: CommandOutcome::Skipped,
        });
    }
}

/// Watch channel that flips to `true` on the first Ctrl-C.
fn spawn_interrupt_listener() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.send(true);
        }
    });
    rx
}
