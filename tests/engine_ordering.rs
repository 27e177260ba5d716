use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use seqr::control::kill::KillOutcome;
use seqr::engine::{CommandOutcome, Engine, EngineOptions};
use seqr::queue::{CommandDescriptor, CommandMode};
use seqr::registry::{is_alive, RegistryStore};

fn shell(name: &str, script: &str, mode: CommandMode, concurrent: bool, cwd: &Path) -> CommandDescriptor {
    CommandDescriptor {
        name: name.into(),
        executable: "sh".into(),
        arguments: vec!["-c".into(), script.into()],
        working_dir: Some(cwd.to_path_buf()),
        env: BTreeMap::new(),
        mode,
        concurrent,
    }
}

fn engine_in(dir: &tempfile::TempDir) -> (Engine, RegistryStore) {
    let store = RegistryStore::new(dir.path().join("registry.json"));
    let engine = Engine::new(
        store.clone(),
        dir.path().join("logs"),
        EngineOptions::default(),
    );
    (engine, store)
}

fn events(dir: &tempfile::TempDir) -> Vec<String> {
    std::fs::read_to_string(dir.path().join("events.txt"))
        .unwrap_or_default()
        .lines()
        .map(|s| s.to_string())
        .collect()
}

fn position(events: &[String], needle: &str) -> usize {
    events
        .iter()
        .position(|e| e == needle)
        .unwrap_or_else(|| panic!("event {needle:?} missing from {events:?}"))
}

#[tokio::test]
async fn sequential_once_commands_complete_in_queue_order() {
    tokio::time::timeout(Duration::from_secs(20), async {
        let dir = tempfile::tempdir().unwrap();
        let (engine, _store) = engine_in(&dir);

        let commands = ["first", "second", "third"]
            .iter()
            .map(|name| {
                shell(
                    name,
                    &format!("echo {name} >> events.txt"),
                    CommandMode::Once,
                    false,
                    dir.path(),
                )
            })
            .collect();

        let report = engine.run(commands).await.unwrap();

        assert!(report.all_ok());
        assert_eq!(events(&dir), vec!["first", "second", "third"]);
    })
    .await
    .unwrap();
}

// Queue [A, B(concurrent), C(concurrent), D]: A fully completes, then B and C
// both start before either must finish, and both finish before D starts.
#[tokio::test]
async fn concurrent_group_runs_between_sequential_commands() {
    tokio::time::timeout(Duration::from_secs(30), async {
        let dir = tempfile::tempdir().unwrap();
        let (engine, _store) = engine_in(&dir);

        let commands = vec![
            shell("a", "echo a >> events.txt", CommandMode::Once, false, dir.path()),
            shell(
                "b",
                "echo b-start >> events.txt; sleep 1; echo b-end >> events.txt",
                CommandMode::Once,
                true,
                dir.path(),
            ),
            shell(
                "c",
                "echo c-start >> events.txt; sleep 1; echo c-end >> events.txt",
                CommandMode::Once,
                true,
                dir.path(),
            ),
            shell("d", "echo d >> events.txt", CommandMode::Once, false, dir.path()),
        ];

        let report = engine.run(commands).await.unwrap();
        assert!(report.all_ok());

        let events = events(&dir);
        assert_eq!(position(&events, "a"), 0);

        let starts = position(&events, "b-start").max(position(&events, "c-start"));
        let ends = position(&events, "b-end").min(position(&events, "c-end"));
        assert!(starts < ends, "group members must all start before any ends: {events:?}");

        let d = position(&events, "d");
        assert!(position(&events, "b-end") < d && position(&events, "c-end") < d);
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn failed_once_command_does_not_abort_the_queue() {
    tokio::time::timeout(Duration::from_secs(20), async {
        let dir = tempfile::tempdir().unwrap();
        let (engine, _store) = engine_in(&dir);

        let commands = vec![
            shell("bad", "exit 3", CommandMode::Once, false, dir.path()),
            shell("after", "echo after >> events.txt", CommandMode::Once, false, dir.path()),
        ];

        let report = engine.run(commands).await.unwrap();

        assert!(!report.all_ok());
        assert_eq!(
            report.results[0].outcome,
            CommandOutcome::Completed { exit_code: 3 }
        );
        assert_eq!(
            report.results[1].outcome,
            CommandOutcome::Completed { exit_code: 0 }
        );
        assert_eq!(events(&dir), vec!["after"]);
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn halt_on_failure_skips_the_rest_of_the_queue() {
    tokio::time::timeout(Duration::from_secs(20), async {
        let dir = tempfile::tempdir().unwrap();
        let store = RegistryStore::new(dir.path().join("registry.json"));
        let engine = Engine::new(
            store,
            dir.path().join("logs"),
            EngineOptions {
                halt_on_failure: true,
                ..EngineOptions::default()
            },
        );

        let commands = vec![
            shell("bad", "exit 1", CommandMode::Once, false, dir.path()),
            shell("never", "echo never >> events.txt", CommandMode::Once, false, dir.path()),
        ];

        let report = engine.run(commands).await.unwrap();

        assert!(report.halted);
        assert_eq!(report.results[1].outcome, CommandOutcome::Skipped);
        assert!(events(&dir).is_empty());
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn missing_executable_is_a_per_command_failure() {
    tokio::time::timeout(Duration::from_secs(20), async {
        let dir = tempfile::tempdir().unwrap();
        let (engine, store) = engine_in(&dir);

        let mut missing = shell("ghost", "true", CommandMode::KeepAlive, false, dir.path());
        missing.executable = "seqr-test-no-such-binary".into();

        let report = engine.run(vec![missing]).await.unwrap();

        assert!(matches!(
            report.results[0].outcome,
            CommandOutcome::LaunchFailed { .. }
        ));
        // A keep-alive command that fails to start never leaves an entry.
        assert_eq!(store.load().unwrap(), Vec::new());
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn keep_alive_command_registers_a_live_pid() {
    tokio::time::timeout(Duration::from_secs(30), async {
        let dir = tempfile::tempdir().unwrap();
        let (engine, store) = engine_in(&dir);

        let report = engine
            .run(vec![shell(
                "svc",
                "sleep 30",
                CommandMode::KeepAlive,
                false,
                dir.path(),
            )])
            .await
            .unwrap();

        let CommandOutcome::Registered { pid } = report.results[0].outcome else {
            panic!("expected Registered, got {:?}", report.results[0].outcome);
        };

        let entries = store.load().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].pid, pid);
        assert_eq!(entries[0].name, "svc");
        assert!(is_alive(pid), "keep-alive pid must be alive after registration");

        // Kill sweep: graceful termination empties the registry.
        let results = seqr::control::kill_all(&store).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].outcome, KillOutcome::Terminated);
        assert_eq!(store.load().unwrap(), Vec::new());

        // Liveness resolves within the grace period.
        let mut gone = false;
        for _ in 0..50 {
            if !is_alive(pid) {
                gone = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(gone, "killed pid still alive");
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn keep_alive_registration_precedes_next_sequential_command() {
    tokio::time::timeout(Duration::from_secs(30), async {
        let dir = tempfile::tempdir().unwrap();
        let (engine, store) = engine_in(&dir);

        let registry_path = store.path().to_path_buf();
        let probe = format!(
            "if [ -s {} ]; then echo registered >> events.txt; else echo missing >> events.txt; fi",
            registry_path.display()
        );

        let report = engine
            .run(vec![
                shell("svc", "sleep 30", CommandMode::KeepAlive, false, dir.path()),
                shell("probe", &probe, CommandMode::Once, false, dir.path()),
            ])
            .await
            .unwrap();
        assert!(report.all_ok());

        // The probe observed the registry entry written by the previous
        // command, not an empty store.
        assert_eq!(events(&dir), vec!["registered"]);

        seqr::control::kill_all(&store).await.unwrap();
    })
    .await
    .unwrap();
}
