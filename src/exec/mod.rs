// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually launching commands with
//! `tokio::process::Command` and wiring their output streams to the console
//! and the background logger.
//!
//! - [`once`] runs a command to completion and reports its exit code.
//! - [`keep_alive`] starts a command detached (new session) so it outlives
//!   this invocation, and leaves reader tasks streaming its output.

pub mod keep_alive;
pub mod once;

pub use keep_alive::{spawn_keep_alive, SpawnedKeepAlive};
pub use once::run_once;

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::logger::{ProcessLogger, StreamKind};
use crate::queue::descriptor::CommandDescriptor;

/// Build the base `Command` for a descriptor: program, arguments, working
/// directory, environment, and piped output streams.
pub(crate) fn base_command(descriptor: &CommandDescriptor) -> Command {
    let mut cmd = Command::new(&descriptor.executable);
    cmd.args(&descriptor.arguments);

    if let Some(dir) = &descriptor.working_dir {
        cmd.current_dir(dir);
    }
    if !descriptor.env.is_empty() {
        cmd.envs(&descriptor.env);
    }

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    cmd
}

/// Spawn a reader task that consumes one output stream line by line.
///
/// Every line goes to the logger (when one is attached) and, with `echo`, to
/// the console. Streams are always drained so OS pipe buffers cannot fill and
/// stall the child.
pub(crate) fn spawn_line_reader<R>(
    name: String,
    stream: StreamKind,
    reader: R,
    logger: Option<ProcessLogger>,
    echo: bool,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();

        while let Ok(Some(line)) = lines.next_line().await {
            if echo {
                match stream {
                    StreamKind::Stdout => println!("[{name}] {line}"),
                    StreamKind::Stderr => eprintln!("[{name}] {line}"),
                }
            }
            if let Some(logger) = &logger {
                logger.log(stream, &line);
            }
        }

        debug!(command = %name, ?stream, "output stream closed");
    })
}
