use chrono::NaiveDate;
use routersense_sync::browser::RawTable;
use routersense_sync::snapshot::{Fingerprint, Snapshot};
use routersense_sync::BucketKey;

fn bucket(date: (i32, u32, u32), hour: u32) -> BucketKey {
    BucketKey::new(
        NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
        hour,
    )
    .unwrap()
}

fn raw(headers: &[&str], rows: &[&[&str]]) -> RawTable {
    RawTable {
        headers: headers.iter().map(|s| s.to_string()).collect(),
        rows: rows
            .iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect(),
    }
}

#[test]
fn test_time_cells_carry_bucket_date_and_utc_designator() {
    let snapshot = Snapshot::from_raw_table(
        bucket((2025, 11, 18), 8),
        raw(&["Time", "Host"], &[&["08:45", "laptop"]]),
    );
    assert_eq!(
        snapshot.canonical_csv(),
        "Time,Host\n2025-11-18T08:45:00.000Z,laptop"
    );
}

#[test]
fn test_same_rows_same_fingerprint_across_extractions() {
    // Two independent extractions of a stable-ordered source must agree.
    let a = Snapshot::from_raw_table(
        bucket((2025, 11, 18), 8),
        raw(&["Time", "Host"], &[&["08:00", "tv"], &["08:05", "phone"]]),
    );
    let b = Snapshot::from_raw_table(
        bucket((2025, 11, 18), 8),
        raw(&["Time", "Host"], &[&["08:00", "tv"], &["08:05", "phone"]]),
    );
    assert_eq!(a.fingerprint(), b.fingerprint());
}

#[test]
fn test_row_order_is_significant() {
    let forward = Snapshot::from_raw_table(
        bucket((2025, 11, 18), 8),
        raw(&["Time", "Host"], &[&["08:00", "tv"], &["08:05", "phone"]]),
    );
    let swapped = Snapshot::from_raw_table(
        bucket((2025, 11, 18), 8),
        raw(&["Time", "Host"], &[&["08:05", "phone"], &["08:00", "tv"]]),
    );
    assert_ne!(forward.fingerprint(), swapped.fingerprint());
}

#[test]
fn test_header_only_table_fingerprint_is_header_hash() {
    let snapshot =
        Snapshot::from_raw_table(bucket((2025, 11, 18), 3), raw(&["Time", "Host"], &[]));
    assert_eq!(snapshot.record_count(), 0);
    assert_eq!(snapshot.fingerprint(), Fingerprint::of(b"Time,Host"));
}

#[test]
fn test_delimiters_inside_cells_survive_a_round_trip() {
    let snapshot = Snapshot::from_raw_table(
        bucket((2025, 11, 18), 8),
        raw(
            &["Host", "Note"],
            &[&["tv, living room", "quote \" inside"]],
        ),
    );
    let csv_text = snapshot.canonical_csv();

    let mut reader = csv::ReaderBuilder::new().from_reader(csv_text.as_bytes());
    let record = reader.records().next().unwrap().unwrap();
    assert_eq!(&record[0], "tv, living room");
    assert_eq!(&record[1], "quote \" inside");
}
