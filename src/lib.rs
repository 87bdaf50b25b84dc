//! # RouterSense Sync
//!
//! Incremental extraction of hourly telemetry from the RouterSense web
//! dashboard. The dashboard exposes no API; the only way to select an hour is
//! a continuous slider control, and the only way to read data out is the
//! rendered table. This crate drives a WebDriver session to seek that slider
//! to each target hour, scrapes the table, and persists one CSV per
//! (date, hour) bucket, rewriting a bucket only when its content actually
//! changed.
//!
//! ## Architecture
//!
//! - [`browser`] - probe/actuation boundary: slider readout, drag gestures,
//!   table scraping, busy-indicator waits
//! - [`seek`] - the adaptive slider-seek control loop
//! - [`snapshot`] - canonical table snapshots and content fingerprints
//! - [`sync`] - fingerprint-based reconciliation, bucket store, range driver
//! - [`config`] - application configuration (dashboard URL, device id, output)
//! - [`cli`] - command-line surface
//!
//! ## Quick start
//!
//! ```no_run
//! use routersense_sync::browser::DashboardPage;
//! use routersense_sync::config::AppConfig;
//! use routersense_sync::sync::{FsBucketStore, SyncDriver};
//! use chrono::NaiveDate;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = AppConfig::load("config.json")?;
//! let page = DashboardPage::connect("http://localhost:4444", &config, true).await?;
//! let store = FsBucketStore::new(&config.download.output_dir);
//! let summary = SyncDriver::new(&page, &store)
//!     .sync_range(
//!         NaiveDate::from_ymd_opt(2025, 11, 17).unwrap(),
//!         NaiveDate::from_ymd_opt(2025, 11, 18).unwrap(),
//!     )
//!     .await?;
//! println!("{summary}");
//! # Ok(())
//! # }
//! ```

pub mod browser;
pub mod cli;
pub mod config;
pub mod seek;
pub mod shutdown;
pub mod snapshot;
pub mod sync;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::fmt;
use std::str::FromStr;

/// One synchronization unit: a single calendar hour of a single date.
///
/// Buckets order chronologically; iteration over a date range visits buckets
/// in ascending (date, hour) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BucketKey {
    date: NaiveDate,
    hour: u32,
}

impl BucketKey {
    /// Create a bucket key. Returns `None` if `hour` is not in `0..=23`.
    pub fn new(date: NaiveDate, hour: u32) -> Option<Self> {
        (hour <= 23).then_some(Self { date, hour })
    }

    /// The bucket's calendar date.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// The bucket's hour of day (0-23).
    pub fn hour(&self) -> u32 {
        self.hour
    }

    /// The instant the slider must display for this bucket (top of the hour).
    pub fn target_time(&self) -> NaiveDateTime {
        self.date
            .and_hms_opt(self.hour, 0, 0)
            .expect("hour validated at construction")
    }

    /// File name for this bucket inside its date directory (`hour_HH.csv`).
    pub fn file_name(&self) -> String {
        format!("hour_{:02}.csv", self.hour)
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:02}:00", self.date.format("%Y-%m-%d"), self.hour)
    }
}

/// Inclusive hour-of-day subrange, restricting which buckets of each date are
/// synced (`8-23` skips the night hours, `14` syncs a single hour).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourRange {
    start: u32,
    end: u32,
}

impl HourRange {
    /// Full day, hours 0 through 23.
    pub const FULL_DAY: HourRange = HourRange { start: 0, end: 23 };

    /// Create an inclusive hour range. Fails unless `start <= end <= 23`.
    pub fn new(start: u32, end: u32) -> Result<Self, HourRangeError> {
        if end > 23 {
            return Err(HourRangeError::OutOfRange(end));
        }
        if start > end {
            return Err(HourRangeError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// First hour, inclusive.
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Last hour, inclusive.
    pub fn end(&self) -> u32 {
        self.end
    }

    /// Hours in this range, ascending.
    pub fn iter(&self) -> impl Iterator<Item = u32> {
        self.start..=self.end
    }

    /// Number of hours covered. A valid range covers at least one.
    pub fn len(&self) -> usize {
        (self.end - self.start + 1) as usize
    }
}

/// Errors from parsing or constructing an [`HourRange`].
#[derive(Debug, thiserror::Error)]
pub enum HourRangeError {
    /// Hour outside 0-23
    #[error("hour {0} is out of range (0-23)")]
    OutOfRange(u32),

    /// Start after end
    #[error("hour range start {start} is after end {end}")]
    Inverted { start: u32, end: u32 },

    /// Not a number or N-M pair
    #[error("invalid hour range '{0}': expected H or H-H (e.g. 8-23)")]
    Malformed(String),
}

impl FromStr for HourRange {
    type Err = HourRangeError;

    /// Parses `"8"` as a single hour or `"8-23"` as an inclusive range.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parse_hour = |part: &str| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| HourRangeError::Malformed(s.to_string()))
        };
        match s.split_once('-') {
            Some((a, b)) => Self::new(parse_hour(a)?, parse_hour(b)?),
            None => {
                let h = parse_hour(s)?;
                Self::new(h, h)
            }
        }
    }
}

/// All buckets in the inclusive date range, chronological, restricted to the
/// given hours of each date.
pub fn buckets_in_range(
    start_date: NaiveDate,
    end_date: NaiveDate,
    hours: HourRange,
) -> Vec<BucketKey> {
    let mut buckets = Vec::new();
    let mut date = start_date;
    while date <= end_date {
        for hour in hours.iter() {
            buckets.push(BucketKey { date, hour });
        }
        date += Duration::days(1);
    }
    buckets
}
