use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use routersense_sync::browser::{
    GestureActuator, IdleIndicator, PositionFeedback, ProbeResult, RawTable, TableSource,
};
use routersense_sync::seek::SeekPolicy;
use routersense_sync::shutdown::ShutdownFlag;
use routersense_sync::sync::{FsBucketStore, SyncDriver};
use routersense_sync::HourRange;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Simulated dashboard: a linearly-responding slider over a month of hours,
/// and per-hour table content that tests can mutate between runs.
struct SimDashboard {
    position: Mutex<NaiveDateTime>,
    overrides: Mutex<HashMap<u32, String>>,
}

impl SimDashboard {
    fn starting_at(position: NaiveDateTime) -> Self {
        Self {
            position: Mutex::new(position),
            overrides: Mutex::new(HashMap::new()),
        }
    }

    /// The dashboard quantizes both the readout and the table to whole
    /// hours; the underlying drag position is continuous.
    fn displayed(&self) -> NaiveDateTime {
        let position = *self.position.lock().unwrap();
        let floored = position
            .with_minute(0)
            .and_then(|p| p.with_second(0))
            .unwrap();
        if position.minute() >= 30 {
            floored + chrono::Duration::hours(1)
        } else {
            floored
        }
    }

    fn override_download(&self, hour: u32, value: &str) {
        self.overrides
            .lock()
            .unwrap()
            .insert(hour, value.to_string());
    }
}

#[async_trait]
impl PositionFeedback for SimDashboard {
    async fn current_value(&self) -> ProbeResult<NaiveDateTime> {
        Ok(self.displayed())
    }
}

#[async_trait]
impl GestureActuator for SimDashboard {
    async fn drag(&self, delta_fraction: f64) -> ProbeResult<()> {
        // Full track spans 10 days of hours.
        let minutes = (delta_fraction * 240.0 * 60.0).round() as i64;
        let mut position = self.position.lock().unwrap();
        *position += chrono::Duration::minutes(minutes);
        Ok(())
    }
}

#[async_trait]
impl TableSource for SimDashboard {
    async fn extract_table(&self) -> ProbeResult<RawTable> {
        let hour = self.displayed().hour();
        let download = self
            .overrides
            .lock()
            .unwrap()
            .get(&hour)
            .cloned()
            .unwrap_or_else(|| format!("{hour}.0"));
        Ok(RawTable {
            headers: vec!["Time".to_string(), "Download".to_string()],
            rows: vec![
                vec![format!("{hour:02}:00"), download],
                vec![format!("{hour:02}:30"), "0.5".to_string()],
            ],
        })
    }
}

#[async_trait]
impl IdleIndicator for SimDashboard {
    async fn wait_until_idle(&self) -> ProbeResult<()> {
        Ok(())
    }
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, 18).unwrap()
}

fn fast_policy() -> SeekPolicy {
    SeekPolicy {
        settle_delay: Duration::ZERO,
        ..SeekPolicy::default()
    }
}

#[tokio::test]
async fn test_full_cycle_create_skip_update() {
    let dashboard = SimDashboard::starting_at(day().and_hms_opt(0, 0, 0).unwrap());
    let dir = tempfile::tempdir().unwrap();
    let store = FsBucketStore::new(dir.path());
    let hours = HourRange::new(9, 11).unwrap();

    let driver = SyncDriver::new(&dashboard, &store)
        .with_hours(hours)
        .with_seek_policy(fast_policy());

    // First pass: everything is new.
    let first = driver.sync_range(day(), day()).await.unwrap();
    assert_eq!(first.created, 3);
    assert_eq!(first.failed, 0);

    // Second pass with identical dashboard content: nothing is rewritten.
    let second = driver.sync_range(day(), day()).await.unwrap();
    assert_eq!(second.unchanged, 3);
    assert_eq!(second.updated, 0);

    // Third pass after one hour's telemetry changed: exactly that bucket is
    // updated, the rest stay unchanged.
    dashboard.override_download(10, "99.9");
    let third = driver.sync_range(day(), day()).await.unwrap();
    assert_eq!(third.updated, 1);
    assert_eq!(third.unchanged, 2);
}

#[tokio::test]
async fn test_sync_starting_twelve_hours_behind_target() {
    // Slider starts at 2025-11-17 20:00 and the first bucket is 08:00 the
    // next day, so the seek has to cross a 12-hour gap before extracting.
    let start =
        NaiveDate::from_ymd_opt(2025, 11, 17).unwrap().and_hms_opt(20, 0, 0).unwrap();
    let dashboard = SimDashboard::starting_at(start);
    let dir = tempfile::tempdir().unwrap();
    let store = FsBucketStore::new(dir.path());

    let driver = SyncDriver::new(&dashboard, &store)
        .with_hours(HourRange::new(8, 8).unwrap())
        .with_seek_policy(fast_policy());

    let summary = driver.sync_range(day(), day()).await.unwrap();
    assert_eq!(summary.created, 1);
    assert_eq!(summary.failed, 0);

    let content = std::fs::read_to_string(
        dir.path().join("2025-11-18").join("hour_08.csv"),
    )
    .unwrap();
    assert!(content.starts_with("Time,Download\n2025-11-18T08:00:00.000Z,"));
}

#[tokio::test]
async fn test_shutdown_between_buckets_stops_early() {
    let dashboard = SimDashboard::starting_at(day().and_hms_opt(0, 0, 0).unwrap());
    let dir = tempfile::tempdir().unwrap();
    let store = FsBucketStore::new(dir.path());
    let shutdown = ShutdownFlag::shared();
    shutdown.request();

    let driver = SyncDriver::new(&dashboard, &store)
        .with_seek_policy(fast_policy())
        .with_shutdown(shutdown);

    let summary = driver.sync_range(day(), day()).await.unwrap();
    assert_eq!(summary.total(), 0);
}
