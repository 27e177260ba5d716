// src/registry/liveness.rs

//! Best-effort PID liveness.
//!
//! A signal-0 `kill` probes for process existence without delivering
//! anything. The probe never mutates the registry; callers decide whether a
//! dead PID means "prune" (status/watch) or "already gone" (kill).

/// Returns true if `pid` currently corresponds to a running process we could
/// signal.
///
/// `EPERM` (the process exists but belongs to another user) is reported as
/// *not* alive: the tool cannot manage such a process, and showing fewer
/// false-positive live entries is the preferred failure direction. Zombies
/// are likewise not alive: `kill(pid, 0)` succeeds on a defunct process
/// that merely hasn't been reaped yet.
#[cfg(unix)]
pub fn is_alive(pid: u32) -> bool {
    // Reject 0 and anything that does not fit a pid_t: negative values would
    // probe whole process groups instead of a single process.
    if pid == 0 || pid > i32::MAX as u32 {
        return false;
    }
    // kill(pid, 0) returns 0 iff the process exists and is signalable by us.
    if unsafe { libc::kill(pid as i32, 0) != 0 } {
        return false;
    }
    !is_zombie(pid)
}

#[cfg(not(unix))]
pub fn is_alive(_pid: u32) -> bool {
    false
}

/// `/proc/<pid>/stat` is `pid (comm) STATE ...`; comm may itself contain
/// spaces or parentheses, so the state field is the first token after the
/// last `)`.
#[cfg(target_os = "linux")]
fn is_zombie(pid: u32) -> bool {
    match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        Ok(stat) => stat
            .rsplit_once(')')
            .map(|(_, rest)| rest.trim_start().starts_with('Z'))
            .unwrap_or(false),
        Err(_) => false,
    }
}

#[cfg(all(unix, not(target_os = "linux")))]
fn is_zombie(_pid: u32) -> bool {
    false
}
