use deferral_queue::{
    apply_queue, deferred, deferred_fn, edit_queue, get_queue, QueueEdit, QueueEntry, QueueError,
};
use deferral_store::{MemoryStore, Notice, RecordStore, SnapshotData, SqliteOptions, SqliteStore};
use serde_json::json;
use std::panic::{self, AssertUnwindSafe};
use tempfile::TempDir;

const HANDLER: &str = "<function MyCharm._on_event at 0x7f41c2d0a8b0>";

struct MyCharm;

impl MyCharm {
    fn on_event(&self) {}
}

#[derive(Debug)]
enum HookError {
    Queue(QueueError),
    Aborted(&'static str),
}

impl From<QueueError> for HookError {
    fn from(e: QueueError) -> Self {
        HookError::Queue(e)
    }
}

fn seed<S: RecordStore>(store: &mut S, events: &[&str]) {
    edit_queue(store, |queue| {
        for event in events {
            queue.push(deferred(event, HANDLER)?);
        }
        Ok::<_, QueueError>(())
    })
    .unwrap();
}

fn queued_names<S: RecordStore>(store: &S) -> Vec<String> {
    get_queue(store)
        .unwrap()
        .iter()
        .map(|e| e.name().to_string())
        .collect()
}

fn run_scenario<S: RecordStore>(store: &mut S) {
    seed(store, &["install", "start"]);

    edit_queue(store, |queue| {
        queue.retain(|e| e.name() != "install");
        queue.push(deferred("stop", HANDLER)?);
        queue.push(deferred("upgrade_charm", HANDLER)?);
        queue.sort_by(|a, b| a.name().cmp(b.name()));
        Ok::<_, QueueError>(())
    })
    .unwrap();

    assert_eq!(queued_names(&*store), ["start", "stop", "upgrade_charm"]);
}

#[test]
fn test_scenario_memory() {
    let mut store = MemoryStore::new();
    run_scenario(&mut store);
    assert!(store
        .all_notices()
        .iter()
        .all(|n| !n.key.contains("install")));
}

#[test]
fn test_scenario_sqlite_file() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join(".unit-state.db");

    {
        let mut store = SqliteStore::open(&db_path, SqliteOptions::default()).unwrap();
        run_scenario(&mut store);
    }

    let store = SqliteStore::open(&db_path, SqliteOptions::default()).unwrap();
    assert_eq!(queued_names(&store), ["start", "stop", "upgrade_charm"]);
    assert!(store.notices("MyCharm/on/install[1]").unwrap().is_empty());
}

#[test]
fn test_reorder_only() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    seed(&mut store, &["install", "start", "config_changed"]);

    edit_queue(&mut store, |queue| {
        queue.reverse();
        Ok::<_, QueueError>(())
    })
    .unwrap();

    assert_eq!(queued_names(&store), ["config_changed", "start", "install"]);
}

#[test]
fn test_failed_edit_does_not_delete() {
    let mut store = MemoryStore::new();
    seed(&mut store, &["install", "start"]);

    let result: Result<(), HookError> = edit_queue(&mut store, |queue| {
        queue.clear();
        Err(HookError::Aborted("changed my mind"))
    });

    assert!(matches!(result, Err(HookError::Aborted(_))));
    assert_eq!(queued_names(&store), ["install", "start"]);
}

#[test]
fn test_failed_edit_does_not_insert() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    seed(&mut store, &["start"]);

    let result: Result<(), HookError> = edit_queue(&mut store, |queue| {
        queue.insert(0, deferred("install", HANDLER)?);
        queue.push(deferred("stop", "not a handler")?);
        Ok(())
    });

    match result {
        Err(HookError::Queue(QueueError::UnrecognizedHandlerFormat { input })) => {
            assert_eq!(input, "not a handler");
        }
        other => panic!("expected UnrecognizedHandlerFormat, got {other:?}"),
    }
    assert_eq!(queued_names(&store), ["start"]);
}

#[test]
fn test_panicking_edit_does_not_write() {
    let mut store = MemoryStore::new();
    seed(&mut store, &["install"]);

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let _ = edit_queue(&mut store, |queue| {
            queue.clear();
            if queue.is_empty() {
                panic!("edit blew up");
            }
            Ok::<_, QueueError>(())
        });
    }));

    assert!(outcome.is_err());
    assert_eq!(queued_names(&store), ["install"]);
}

#[test]
fn test_constructor_rejection_leaves_store_untouched() {
    let store = MemoryStore::new();

    let err = deferred("start", "<built-in function len>").unwrap_err();
    assert!(matches!(err, QueueError::UnrecognizedHandlerFormat { .. }));
    assert!(store.all_notices().is_empty());
    assert!(store.snapshot_keys().is_empty());
}

#[test]
fn test_get_queue_never_writes() {
    let mut store = MemoryStore::new();
    store
        .save_notice(&Notice::new("MyCharm/on/start[1]", "MyCharm", "_on_event"))
        .unwrap();

    let entries = get_queue(&store).unwrap();
    assert_eq!(entries.len(), 1);
    // Missing snapshot is not backfilled by a read.
    assert!(store.snapshot_keys().is_empty());
}

#[test]
fn test_queue_edit_commit_and_drop() {
    let mut store = MemoryStore::new();
    seed(&mut store, &["install", "start"]);

    {
        let mut edit = QueueEdit::begin(&mut store).unwrap();
        edit.clear();
        // Dropped without commit.
    }
    assert_eq!(queued_names(&store), ["install", "start"]);

    let mut edit = QueueEdit::begin(&mut store).unwrap();
    assert_eq!(edit.entries().len(), 2);
    edit.entries_mut().remove(0);
    let summary = edit.commit().unwrap();
    assert_eq!(summary.cleared, 2);
    assert_eq!(summary.written, 1);
    assert_eq!(queued_names(&store), ["start"]);
}

#[test]
fn test_queue_edit_abandon_returns_entries() {
    let mut store = MemoryStore::new();
    seed(&mut store, &["install"]);

    let mut edit = QueueEdit::begin(&mut store).unwrap();
    edit.push(deferred("start", HANDLER).unwrap());
    let entries = edit.abandon();

    assert_eq!(entries.len(), 2);
    assert_eq!(queued_names(&store), ["install"]);
}

#[test]
fn test_queue_edit_prunes_snapshots() {
    let mut store = MemoryStore::new();
    let mut data = SnapshotData::new();
    data.insert("relation_id".to_string(), json!(1));
    edit_queue(&mut store, |queue| {
        queue.push(deferred("db_relation_joined", HANDLER)?.with_snapshot(data.clone()));
        Ok::<_, QueueError>(())
    })
    .unwrap();

    let mut edit = QueueEdit::begin(&mut store).unwrap();
    edit.prune_snapshots(true).clear();
    edit.commit().unwrap();

    assert!(get_queue(&store).unwrap().is_empty());
    assert!(store.snapshot_keys().is_empty());
}

#[test]
fn test_apply_queue_transform() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    seed(&mut store, &["update_status", "install", "start"]);

    let written = apply_queue(&mut store, |mut queue| {
        queue.retain(|e| e.name() != "update_status");
        queue.sort_by(|a, b| b.name().cmp(a.name()));
        queue
    })
    .unwrap();

    let names: Vec<&str> = written.iter().map(|e| e.name()).collect();
    assert_eq!(names, ["start", "install"]);
    assert_eq!(get_queue(&store).unwrap(), written);
}

#[test]
fn test_snapshot_survives_edit() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let mut data = SnapshotData::new();
    data.insert("unit_name".to_string(), json!("db/0"));
    data.insert("relation_id".to_string(), json!(3));

    edit_queue(&mut store, |queue| {
        queue.push(
            QueueEntry::for_observer("db_relation_changed", "MyCharm", "_on_db", 3)?
                .with_snapshot(data.clone()),
        );
        Ok::<_, QueueError>(())
    })
    .unwrap();
    edit_queue(&mut store, |queue| {
        queue.insert(0, deferred("leader_elected", HANDLER)?);
        Ok::<_, QueueError>(())
    })
    .unwrap();

    let queue = get_queue(&store).unwrap();
    assert_eq!(queue.len(), 2);
    assert!(queue[0].snapshot_data().is_empty());
    assert_eq!(queue[1].snapshot_data(), &data);
    assert_eq!(queue[1].event_id(), Some(3));
}

#[test]
fn test_rust_handler_reference() {
    let mut store = MemoryStore::new();
    edit_queue(&mut store, |queue| {
        queue.push(deferred_fn("start", &MyCharm::on_event)?);
        Ok::<_, QueueError>(())
    })
    .unwrap();

    let queue = get_queue(&store).unwrap();
    assert_eq!(queue[0].handle_path(), "MyCharm/on/start[1]");
    assert_eq!(queue[0].observer(), "on_event");
}
