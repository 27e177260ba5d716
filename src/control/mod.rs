// src/control/mod.rs

//! The control plane over processes started by earlier invocations.
//!
//! All three controllers work from the registry plus the on-disk log files;
//! none of them ever owns the processes they observe.
//!
//! - [`status`] - one-shot snapshot (live / stale / historical).
//! - [`watch`] - snapshot semantics plus continuous tailing until cancelled.
//! - [`kill`] - graceful-then-forced termination sweep.
//! - [`tail`] - byte-offset file tailing shared by watch.

pub mod kill;
pub mod status;
pub mod tail;
pub mod watch;

pub use kill::{kill_all, KillOutcome, KillResult};
pub use status::{snapshot, StatusSnapshot};
pub use tail::LogTailer;
pub use watch::{stream_until_cancelled, TailEvent};
