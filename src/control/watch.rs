// src/control/watch.rs

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::control::tail::LogTailer;
use crate::registry::{is_alive, RegistryStore};

/// How often the registry is re-read for new or vanished processes.
pub const RESCAN_INTERVAL: Duration = Duration::from_secs(1);

/// How often each live entry's log file is polled for appended bytes.
pub const TAIL_POLL_INTERVAL: Duration = Duration::from_millis(300);

/// One newly appended log line from a tracked process.
#[derive(Debug, Clone)]
pub struct TailEvent {
    pub name: String,
    pub line: String,
}

/// Continuously tail all live registry entries until Ctrl-C.
///
/// One tailing task per live entry (starting at the file's current end) plus
/// one rescan task that re-reads the registry on an interval, spawning
/// tailers for newly appeared processes and retiring them for entries that
/// turned stale. A single cancellation signal stops every task; the monitored
/// processes themselves are never touched.
pub async fn stream_until_cancelled(
    store: RegistryStore,
    mut on_event: impl FnMut(TailEvent),
) -> Result<()> {
    let (line_tx, mut line_rx) = mpsc::channel::<TailEvent>(64);
    let (cancel_tx, cancel_rx) = watch::channel(false);

    let rescan = spawn_rescan_task(store, line_tx, cancel_rx);

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(err) = result {
                    warn!(error = %err, "failed to listen for Ctrl-C");
                }
                break;
            }
            event = line_rx.recv() => {
                match event {
                    Some(event) => on_event(event),
                    None => break,
                }
            }
        }
    }

    // Propagate cancellation and wait for the rescan task to retire every
    // tailer, so no file handle outlives this call.
    let _ = cancel_tx.send(true);
    let _ = rescan.await;

    Ok(())
}

fn spawn_rescan_task(
    store: RegistryStore,
    line_tx: mpsc::Sender<TailEvent>,
    cancel_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tailers: HashMap<u32, JoinHandle<()>> = HashMap::new();
        let mut cancel = cancel_rx.clone();

        loop {
            // Registry read here is best-effort: watch keeps going on a
            // transient read failure and just reports nothing new.
            let entries = match store.load() {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(error = %err, "cannot read registry during watch rescan");
                    Vec::new()
                }
            };

            let live: HashMap<u32, _> = entries
                .into_iter()
                .filter(|e| is_alive(e.pid))
                .map(|e| (e.pid, e))
                .collect();

            // Retire tailers for processes that are gone.
            let gone: Vec<u32> = tailers
                .keys()
                .filter(|pid| !live.contains_key(*pid))
                .copied()
                .collect();
            for pid in gone {
                if let Some(handle) = tailers.remove(&pid) {
                    debug!(pid, "process gone; stopping its tailer");
                    handle.abort();
                }
            }

            // Start tailers for processes that appeared.
            for (pid, entry) in live {
                if tailers.contains_key(&pid) {
                    continue;
                }
                debug!(pid, name = %entry.name, "starting log tailer");
                let tailer = LogTailer::from_end(&entry.log_path);
                tailers.insert(
                    pid,
                    spawn_tailer_task(entry.name, tailer, line_tx.clone(), cancel_rx.clone()),
                );
            }

            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        break;
                    }
                }
                _ = tokio::time::sleep(RESCAN_INTERVAL) => {}
            }
        }

        for (_pid, handle) in tailers {
            handle.abort();
        }
        debug!("watch rescan task stopped");
    })
}

fn spawn_tailer_task(
    name: String,
    mut tailer: LogTailer,
    line_tx: mpsc::Sender<TailEvent>,
    cancel_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut cancel = cancel_rx;

        loop {
            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        break;
                    }
                }
                _ = tokio::time::sleep(TAIL_POLL_INTERVAL) => {
                    let lines = match tailer.read_new_lines().await {
                        Ok(lines) => lines,
                        Err(err) => {
                            debug!(name = %name, error = %err, "tail read failed");
                            continue;
                        }
                    };

                    for line in lines {
                        let event = TailEvent { name: name.clone(), line };
                        if line_tx.send(event).await.is_err() {
                            return;
                        }
                    }
                }
            }
        }
    })
}
