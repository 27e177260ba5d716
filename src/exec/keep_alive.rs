// src/exec/keep_alive.rs

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tracing::{info, warn};

use crate::exec::{base_command, spawn_line_reader};
use crate::logger::{log_file_path, CommandType, ProcessLogger, StreamKind};
use crate::queue::descriptor::CommandDescriptor;

/// A successfully started keep-alive process.
#[derive(Debug)]
pub struct SpawnedKeepAlive {
    pub pid: u32,
    /// Where this process's output is (or would be) logged. Recorded in the
    /// registry even when logging is degraded, so later invocations know
    /// where to look.
    pub log_path: std::path::PathBuf,
    /// Set when the log directory was unwritable and output is not being
    /// persisted; reported to the user once per command.
    pub log_error: Option<String>,
}

/// Start a keep-alive command detached from this invocation.
///
/// The child is made a session leader so exiting (or interrupting) the
/// launching invocation neither terminates it nor signals it; it remains
/// discoverable through the registry. Reader tasks stream its output into the
/// background logger for as long as this invocation lives.
pub async fn spawn_keep_alive(
    descriptor: &CommandDescriptor,
    logs_dir: &Path,
    echo: bool,
) -> Result<SpawnedKeepAlive> {
    info!(
        command = %descriptor.name,
        executable = %descriptor.executable,
        "starting keep-alive command"
    );

    let mut cmd = base_command(descriptor);
    detach(&mut cmd);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning process for command '{}'", descriptor.name))?;

    let pid = child
        .id()
        .ok_or_else(|| anyhow!("no pid for spawned command '{}'", descriptor.name))?;

    let command_type = CommandType::from_executable(&descriptor.executable);
    let (logger, log_error) = match ProcessLogger::attach(logs_dir, &descriptor.name, command_type)
    {
        Ok(logger) => (Some(logger), None),
        Err(err) => {
            warn!(
                command = %descriptor.name,
                error = %err,
                "persistent logging disabled for this process"
            );
            (None, Some(format!("{err:#}")))
        }
    };

    if let Some(out) = child.stdout.take() {
        spawn_line_reader(
            descriptor.name.clone(),
            StreamKind::Stdout,
            out,
            logger.clone(),
            echo,
        );
    }
    if let Some(err) = child.stderr.take() {
        spawn_line_reader(
            descriptor.name.clone(),
            StreamKind::Stderr,
            err,
            logger.clone(),
            echo,
        );
    }

    // Reap the child if it exits while this invocation is still resident.
    // After we exit, the detached child is reparented and reaped by init.
    let name = descriptor.name.clone();
    tokio::spawn(async move {
        match child.wait().await {
            Ok(status) => info!(
                command = %name,
                pid,
                exit_code = status.code().unwrap_or(-1),
                "keep-alive process exited"
            ),
            Err(err) => warn!(command = %name, pid, error = %err, "failed to reap keep-alive process"),
        }
    });

    Ok(SpawnedKeepAlive {
        pid,
        log_path: log_file_path(logs_dir, &descriptor.name),
        log_error,
    })
}

/// Detach the child into its own session so it survives this invocation.
#[cfg(unix)]
fn detach(cmd: &mut tokio::process::Command) {
    unsafe {
        cmd.pre_exec(|| {
            // setsid also puts the child in a fresh process group, so a
            // terminal Ctrl-C aimed at us never reaches it.
            if libc::setsid() == -1 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }
}

#[cfg(not(unix))]
fn detach(_cmd: &mut tokio::process::Command) {}
