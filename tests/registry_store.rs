use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::Utc;
use seqr::queue::{CommandDescriptor, CommandMode};
use seqr::registry::{RegistryEntry, RegistryStore};

fn descriptor(name: &str) -> CommandDescriptor {
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

fn entry(name: &str, pid: u32) -> RegistryEntry {
    RegistryEntry::new(&descriptor(name), pid, PathBuf::from(format!("/tmp/{name}.log")))
}

fn store_in(dir: &tempfile::TempDir) -> RegistryStore {
    RegistryStore::new(dir.path().join("registry.json"))
}

#[test]
fn missing_file_is_an_empty_registry() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    assert_eq!(store.load().unwrap(), Vec::new());
}

#[test]
fn empty_file_is_an_empty_registry() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    std::fs::write(store.path(), "").unwrap();

    assert_eq!(store.load().unwrap(), Vec::new());
}

#[test]
fn corrupt_content_fails_loudly() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    std::fs::write(store.path(), "{not json!").unwrap();

    assert!(store.load().is_err());
}

#[test]
fn save_load_round_trip_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    let entries = vec![entry("api", 100), entry("worker", 200)];
    store.save(&entries).unwrap();

    let loaded = store.load().unwrap();
    assert_eq!(loaded, entries);

    // Saving an unmodified load changes nothing observable.
    store.save(&loaded).unwrap();
    assert_eq!(store.load().unwrap(), entries);
}

#[test]
fn serialized_schema_uses_camel_case_fields() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store.save(&[entry("api", 100)]).unwrap();

    let raw = std::fs::read_to_string(store.path()).unwrap();
    assert!(raw.contains("\"pid\""));
    assert!(raw.contains("\"startedAt\""));
    assert!(raw.contains("\"logPath\""));
    assert!(raw.contains("\"keepAlive\""));
}

#[test]
fn add_entry_replaces_same_pid() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    store.add_entry(entry("old", 42)).unwrap();
    store.add_entry(entry("new", 42)).unwrap();

    let entries = store.load().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "new");
}

#[test]
fn remove_entry_returns_the_removed_record() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    store.add_entry(entry("api", 100)).unwrap();
    store.add_entry(entry("worker", 200)).unwrap();

    let removed = store.remove_entry(100).unwrap();
    assert_eq!(removed.map(|e| e.name), Some("api".to_string()));
    assert!(store.remove_entry(100).unwrap().is_none());

    let remaining = store.load().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].pid, 200);
}

#[test]
fn remove_many_prunes_only_matching_pids() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    store.add_entry(entry("a", 1)).unwrap();
    store.add_entry(entry("b", 2)).unwrap();
    store.add_entry(entry("c", 3)).unwrap();

    let removed = store.remove_many(&[1, 3, 99]).unwrap();
    assert_eq!(removed, 2);
    assert_eq!(store.load().unwrap()[0].pid, 2);
}

// Two invocations adding entries without a coordinated handoff must not lose
// each other's writes. Separate `RegistryStore` handles stand in for separate
// processes; the advisory lock is what serializes them.
#[test]
fn concurrent_adds_do_not_lose_updates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registry.json");

    let mut handles = Vec::new();
    for i in 0..8u32 {
        let store = RegistryStore::new(&path);
        handles.push(std::thread::spawn(move || {
            store.add_entry(entry(&format!("cmd-{i}"), 1000 + i)).unwrap();
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let entries = RegistryStore::new(&path).load().unwrap();
    assert_eq!(entries.len(), 8);
    for i in 0..8u32 {
        assert!(entries.iter().any(|e| e.pid == 1000 + i), "entry {i} lost");
    }
}

#[test]
fn started_at_is_set_at_construction() {
    let before = Utc::now();
    let e = entry("api", 1);
    let after = Utc::now();

    assert!(e.started_at >= before && e.started_at <= after);
    assert_eq!(e.uptime_secs(), 0);
}
