// src/control/kill.rs

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use crate::registry::{is_alive, RegistryEntry, RegistryStore};

/// Bounded wait after the graceful signal before escalating.
pub const GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Poll cadence while waiting for a signalled process to exit.
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Settle time after a forced kill before reporting.
const FORCE_KILL_SETTLE: Duration = Duration::from_millis(200);

/// What happened to one registry entry during a kill sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KillOutcome {
    /// Exited within the grace period after the graceful signal.
    Terminated,
    /// Survived the grace period and was forcibly killed.
    ForceKilled,
    /// Was already dead; only the registry entry was pruned.
    AlreadyDead,
    /// Signal delivery failed (permissions, PID reuse by an unrelated
    /// process); the entry is left in the registry.
    SignalFailed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KillResult {
    pub pid: u32,
    pub name: String,
    pub outcome: KillOutcome,
}

impl KillResult {
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, KillOutcome::SignalFailed { .. })
    }
}

/// Terminate every tracked process: graceful signal, bounded grace period,
/// forced kill, then registry removal.
///
/// Per-entry errors are reported in the result and the sweep continues; only
/// a registry failure (corrupt store, failed removal) aborts the operation,
/// since kill is a write-path consumer of the store.
pub async fn kill_all(store: &RegistryStore) -> Result<Vec<KillResult>> {
    let entries = store.load().context("reading registry for kill sweep")?;

    let mut results = Vec::with_capacity(entries.len());
    for entry in entries {
        let outcome = kill_entry(&entry).await;

        match &outcome {
            KillOutcome::SignalFailed { error } => {
                warn!(pid = entry.pid, name = %entry.name, error = %error, "kill failed; keeping registry entry");
            }
            _ => {
                store
                    .remove_entry(entry.pid)
                    .with_context(|| format!("removing pid {} from registry", entry.pid))?;
            }
        }

        results.push(KillResult {
            pid: entry.pid,
            name: entry.name.clone(),
            outcome,
        });
    }

    Ok(results)
}

/// `Running → SignalledGraceful → (Exited | TimedOut) → ForceKilled`.
async fn kill_entry(entry: &RegistryEntry) -> KillOutcome {
    if !is_alive(entry.pid) {
        info!(pid = entry.pid, name = %entry.name, "process already gone; pruning entry");
        return KillOutcome::AlreadyDead;
    }

    info!(pid = entry.pid, name = %entry.name, "sending graceful termination signal");
    if let Err(error) = send_term(entry.pid) {
        return KillOutcome::SignalFailed { error };
    }

    let deadline = Instant::now() + GRACE_PERIOD;
    while Instant::now() < deadline {
        if !is_alive(entry.pid) {
            return KillOutcome::Terminated;
        }
        sleep(EXIT_POLL_INTERVAL).await;
    }

    warn!(pid = entry.pid, name = %entry.name, "grace period elapsed; forcing termination");
    if let Err(error) = send_kill(entry.pid) {
        return KillOutcome::SignalFailed { error };
    }

    sleep(FORCE_KILL_SETTLE).await;
    KillOutcome::ForceKilled
}

#[cfg(unix)]
fn send_term(pid: u32) -> std::result::Result<(), String> {
    send_signal(pid, libc::SIGTERM)
}

#[cfg(unix)]
fn send_kill(pid: u32) -> std::result::Result<(), String> {
    send_signal(pid, libc::SIGKILL)
}

/// Signal the process group first (keep-alive children are session leaders,
/// so their own children are covered), then the leader directly.
#[cfg(unix)]
fn send_signal(pid: u32, sig: libc::c_int) -> std::result::Result<(), String> {
    if pid == 0 || pid > i32::MAX as u32 {
        return Err(format!("refusing to signal invalid pid {pid}"));
    }
    unsafe {
        let _ = libc::kill(-(pid as i32), sig);
        if libc::kill(pid as i32, sig) == 0 {
            Ok(())
        } else {
            Err(std::io::Error::last_os_error().to_string())
        }
    }
}

#[cfg(not(unix))]
fn send_term(_pid: u32) -> std::result::Result<(), String> {
    Err("signals are not supported on this platform".to_string())
}

#[cfg(not(unix))]
fn send_kill(_pid: u32) -> std::result::Result<(), String> {
    Err("signals are not supported on this platform".to_string())
}
