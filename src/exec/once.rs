// src/exec/once.rs

use anyhow::{Context, Result};
use tracing::info;

use crate::exec::{base_command, spawn_line_reader};
use crate::logger::{ProcessLogger, StreamKind};
use crate::queue::descriptor::CommandDescriptor;

/// Run a once-command to completion and return its exit code.
///
/// Output is drained concurrently from both streams; `echo` forwards it to
/// the console, and `logger` (when side logging is configured) persists it.
/// Launch failures (missing executable, bad working directory, permissions)
/// surface as `Err` and are the caller's per-command failure.
pub async fn run_once(
    descriptor: &CommandDescriptor,
    logger: Option<ProcessLogger>,
    echo: bool,
) -> Result<i32> {
    info!(command = %descriptor.name, executable = %descriptor.executable, "starting once-command");

    let mut cmd = base_command(descriptor);
    cmd.kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning process for command '{}'", descriptor.name))?;

    let stdout_reader = child.stdout.take().map(|out| {
        spawn_line_reader(
            descriptor.name.clone(),
            StreamKind::Stdout,
            out,
            logger.clone(),
            echo,
        )
    });
    let stderr_reader = child.stderr.take().map(|err| {
        spawn_line_reader(
            descriptor.name.clone(),
            StreamKind::Stderr,
            err,
            logger,
            echo,
        )
    });

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for process of command '{}'", descriptor.name))?;

    // Let the readers finish flushing buffered output before reporting.
    if let Some(handle) = stdout_reader {
        let _ = handle.await;
    }
    if let Some(handle) = stderr_reader {
        let _ = handle.await;
    }

    let code = status.code().unwrap_or(-1);
    info!(
        command = %descriptor.name,
        exit_code = code,
        success = status.success(),
        "once-command exited"
    );

    Ok(code)
}
