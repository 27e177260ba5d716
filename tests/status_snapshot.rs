use std::collections::BTreeMap;
use std::path::PathBuf;

use seqr::control::snapshot;
use seqr::queue::{CommandDescriptor, CommandMode};
use seqr::registry::{RegistryEntry, RegistryStore};

fn keep_alive_descriptor(name: &str) -> CommandDescriptor {
    CommandDescriptor {
        name: name.into(),
        executable: "sleep".into(),
        arguments: vec!["30".into()],
        working_dir: None,
        env: BTreeMap::new(),
        mode: CommandMode::KeepAlive,
        concurrent: false,
    }
}

// A PID far above any default pid_max, so it can never be a running process.
const DEAD_PID: u32 = 999_999_999;

#[test]
fn missing_registry_and_logs_yield_an_empty_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let store = RegistryStore::new(dir.path().join("registry.json"));

    let snap = snapshot(&store, &dir.path().join("logs")).unwrap();

    assert!(snap.live.is_empty());
    assert!(snap.stale.is_empty());
    assert!(snap.historical.is_empty());
    assert!(snap.is_empty());
}

#[test]
fn corrupt_registry_degrades_to_empty_not_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = RegistryStore::new(dir.path().join("registry.json"));
    std::fs::write(store.path(), "][").unwrap();

    let snap = snapshot(&store, &dir.path().join("logs")).unwrap();
    assert!(snap.live.is_empty() && snap.stale.is_empty());
}

#[test]
fn stale_entries_are_reported_and_pruned() {
    let dir = tempfile::tempdir().unwrap();
    let store = RegistryStore::new(dir.path().join("registry.json"));
    let logs_dir = dir.path().join("logs");

    let entry = RegistryEntry::new(
        &keep_alive_descriptor("ghost"),
        DEAD_PID,
        logs_dir.join("ghost.log"),
    );
    store.add_entry(entry).unwrap();

    let snap = snapshot(&store, &logs_dir).unwrap();

    assert!(snap.live.is_empty());
    assert_eq!(snap.stale.len(), 1);
    assert_eq!(snap.stale[0].name, "ghost");
    // Advisory cleanup: the stale entry is gone from the store.
    assert_eq!(store.load().unwrap(), Vec::new());
}

#[test]
fn live_entries_carry_uptime_and_recent_log_lines() {
    let dir = tempfile::tempdir().unwrap();
    let store = RegistryStore::new(dir.path().join("registry.json"));
    let logs_dir = dir.path().join("logs");
    std::fs::create_dir_all(&logs_dir).unwrap();

    let mut child = std::process::Command::new("sleep")
        .arg("30")
        .spawn()
        .unwrap();

    let log_path = logs_dir.join("svc.log");
    std::fs::write(&log_path, "line 1\nline 2\nline 3\n").unwrap();

    let entry = RegistryEntry::new(&keep_alive_descriptor("svc"), child.id(), log_path);
    store.add_entry(entry).unwrap();

    let snap = snapshot(&store, &logs_dir).unwrap();

    assert_eq!(snap.live.len(), 1);
    let live = &snap.live[0];
    assert_eq!(live.entry.name, "svc");
    assert_eq!(live.recent, vec!["line 1", "line 2", "line 3"]);
    assert!(live.entry.uptime_secs() >= 0);
    // The live entry keeps its registry record.
    assert_eq!(store.load().unwrap().len(), 1);

    child.kill().unwrap();
    let _ = child.wait();
}

#[test]
fn orphan_log_files_are_listed_as_historical() {
    let dir = tempfile::tempdir().unwrap();
    let store = RegistryStore::new(dir.path().join("registry.json"));
    let logs_dir = dir.path().join("logs");
    std::fs::create_dir_all(&logs_dir).unwrap();

    std::fs::write(logs_dir.join("finished.log"), "bye\n").unwrap();
    std::fs::write(logs_dir.join("notes.txt"), "not a log\n").unwrap();

    let snap = snapshot(&store, &logs_dir).unwrap();

    assert_eq!(snap.historical.len(), 1);
    let log = &snap.historical[0];
    assert_eq!(log.path, logs_dir.join("finished.log"));
    assert_eq!(log.size, 4);
    assert!(log.modified.is_some());
}

#[test]
fn historical_excludes_live_entry_logs() {
    let dir = tempfile::tempdir().unwrap();
    let store = RegistryStore::new(dir.path().join("registry.json"));
    let logs_dir = dir.path().join("logs");
    std::fs::create_dir_all(&logs_dir).unwrap();

    let mut child = std::process::Command::new("sleep")
        .arg("30")
        .spawn()
        .unwrap();

    let live_log = logs_dir.join("svc.log");
    std::fs::write(&live_log, "running\n").unwrap();
    std::fs::write(logs_dir.join("other.log"), "done\n").unwrap();

    let entry = RegistryEntry::new(&keep_alive_descriptor("svc"), child.id(), live_log);
    store.add_entry(entry).unwrap();

    let snap = snapshot(&store, &logs_dir).unwrap();

    assert_eq!(snap.live.len(), 1);
    let historical: Vec<PathBuf> = snap.historical.iter().map(|l| l.path.clone()).collect();
    assert_eq!(historical, vec![logs_dir.join("other.log")]);

    child.kill().unwrap();
    let _ = child.wait();
}
