use chrono::NaiveDate;
use routersense_sync::browser::RawTable;
use routersense_sync::snapshot::Snapshot;
use routersense_sync::sync::{BucketStore, FsBucketStore, ReconcileOutcome, SyncEngine};
use routersense_sync::BucketKey;

fn bucket(hour: u32) -> BucketKey {
    BucketKey::new(NaiveDate::from_ymd_opt(2025, 11, 18).unwrap(), hour).unwrap()
}

fn snapshot(hour: u32, rows: &[&[&str]]) -> Snapshot {
    Snapshot::from_raw_table(
        bucket(hour),
        RawTable {
            headers: vec!["Time".to_string(), "Download".to_string()],
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        },
    )
}

#[test]
fn test_reconcile_is_idempotent_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsBucketStore::new(dir.path());
    let engine = SyncEngine::new(&store);
    let snap = snapshot(8, &[&["08:00", "12.3"], &["08:15", "9.1"]]);

    assert_eq!(
        engine.reconcile(bucket(8), &snap).unwrap(),
        ReconcileOutcome::Created
    );
    assert_eq!(
        engine.reconcile(bucket(8), &snap).unwrap(),
        ReconcileOutcome::Unchanged
    );
    // Never Updated for identical content, no matter how often it runs.
    assert_eq!(
        engine.reconcile(bucket(8), &snap).unwrap(),
        ReconcileOutcome::Unchanged
    );
}

#[test]
fn test_single_cell_change_is_detected_across_processes() {
    let dir = tempfile::tempdir().unwrap();

    // First process writes.
    {
        let store = FsBucketStore::new(dir.path());
        let engine = SyncEngine::new(&store);
        engine
            .reconcile(bucket(8), &snapshot(8, &[&["08:00", "12.3"]]))
            .unwrap();
    }

    // Second process sees the change through the persisted fingerprint.
    let store = FsBucketStore::new(dir.path());
    let engine = SyncEngine::new(&store);
    assert_eq!(
        engine
            .reconcile(bucket(8), &snapshot(8, &[&["08:00", "12.4"]]))
            .unwrap(),
        ReconcileOutcome::Updated
    );
}

#[test]
fn test_empty_snapshot_reconciles_like_any_other() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsBucketStore::new(dir.path());
    let engine = SyncEngine::new(&store);
    let empty = snapshot(3, &[]);

    assert_eq!(
        engine.reconcile(bucket(3), &empty).unwrap(),
        ReconcileOutcome::Created
    );
    let stored = store.read(bucket(3)).unwrap().unwrap();
    assert_eq!(stored.content(), "Time,Download");
}

#[test]
fn test_stored_layout_matches_bucket_convention() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsBucketStore::new(dir.path());
    let engine = SyncEngine::new(&store);

    engine
        .reconcile(bucket(7), &snapshot(7, &[&["07:00", "1"]]))
        .unwrap();

    let expected = dir.path().join("2025-11-18").join("hour_07.csv");
    assert!(expected.is_file());
    let content = std::fs::read_to_string(expected).unwrap();
    assert_eq!(content, "Time,Download\n2025-11-18T07:00:00.000Z,1");
}

#[test]
fn test_row_reorder_triggers_update() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsBucketStore::new(dir.path());
    let engine = SyncEngine::new(&store);

    engine
        .reconcile(bucket(8), &snapshot(8, &[&["08:00", "1"], &["08:05", "2"]]))
        .unwrap();
    assert_eq!(
        engine
            .reconcile(bucket(8), &snapshot(8, &[&["08:05", "2"], &["08:00", "1"]]))
            .unwrap(),
        ReconcileOutcome::Updated
    );
}
