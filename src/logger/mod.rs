// src/logger/mod.rs

//! The background logger: per-process output files.
//!
//! One file per process under the logs directory, one formatted line per
//! output event:
//!
//! ```text
//! [2026-08-07 10:15:30.123] [node] [api] [⬢] listening on 3000
//! ```
//!
//! Files are single-writer (the invocation that spawned the process) and
//! multi-reader (any number of watch invocations may tail them). [`cleanup`]
//! owns retention.

pub mod classify;
pub mod cleanup;
pub mod writer;

pub use classify::CommandType;
pub use cleanup::{cleanup_logs, CleanupReport, RETENTION};
pub use writer::{default_logs_dir, log_file_path, ProcessLogger, StreamKind};
