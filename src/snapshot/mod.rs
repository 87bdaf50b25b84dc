//! Canonical table snapshots and content fingerprints.
//!
//! A [`Snapshot`] is the ordered record set scraped for one bucket: header
//! order is the order the dashboard rendered it, row order is extraction
//! order, and neither is ever re-sorted. The canonical serialization is a
//! plain CSV of that exact ordering, so its [`Fingerprint`] is deterministic,
//! independent of any map iteration order, and order-sensitive by design:
//! the same rows in a different order are a different fingerprint.

use crate::browser::RawTable;
use crate::BucketKey;
use sha2::{Digest, Sha256};
use std::fmt;

/// Column whose cell values get rewritten to full ISO-8601 instants.
const TIME_COLUMN: &str = "Time";

/// Ordered record set for one time bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Snapshot {
    /// Build a snapshot from a scraped table for the given bucket.
    ///
    /// Rewrites the `Time` column from the dashboard's bare `HH:MM` to a full
    /// `YYYY-MM-DDTHH:MM:00.000Z` instant using the bucket's date, so rows
    /// from different buckets remain distinguishable once merged downstream.
    /// Cells that do not look like `HH:MM` are kept verbatim.
    pub fn from_raw_table(bucket: BucketKey, table: RawTable) -> Self {
        let time_index = table.headers.iter().position(|h| h == TIME_COLUMN);
        let date = bucket.date().format("%Y-%m-%d");

        let rows = table
            .rows
            .into_iter()
            .map(|mut row| {
                if let Some(index) = time_index {
                    if let Some(cell) = row.get_mut(index) {
                        if let Some((hh, mm)) = split_hh_mm(cell) {
                            *cell = format!("{date}T{hh:02}:{mm:02}:00.000Z");
                        }
                    }
                }
                row
            })
            .collect();

        Self {
            headers: table.headers,
            rows,
        }
    }

    /// Snapshot with a header but no data rows. Legitimate: the dashboard
    /// renders an empty table for hours with no telemetry.
    pub fn empty(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Column names, in rendered order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows, in extraction order.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data records.
    pub fn record_count(&self) -> usize {
        self.rows.len()
    }

    /// Canonical CSV form: header line plus data lines, comma-joined, fields
    /// containing the delimiter, a quote, or a newline doubled-and-quoted.
    /// An entirely headerless, rowless snapshot serializes to the empty
    /// string.
    pub fn canonical_csv(&self) -> String {
        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        if !self.headers.is_empty() || !self.rows.is_empty() {
            lines.push(csv_line(&self.headers));
        }
        for row in &self.rows {
            lines.push(csv_line(row));
        }
        lines.join("\n")
    }

    /// Fingerprint of the canonical form.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(self.canonical_csv().as_bytes())
    }
}

fn csv_line(fields: &[String]) -> String {
    fields
        .iter()
        .map(|field| csv_field(field))
        .collect::<Vec<_>>()
        .join(",")
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// `"HH:MM"` split into hour and minute, validated against clock ranges.
fn split_hh_mm(value: &str) -> Option<(u32, u32)> {
    let (hh, mm) = value.split_once(':')?;
    let hh: u32 = hh.parse().ok()?;
    let mm: u32 = mm.parse().ok()?;
    (hh <= 23 && mm <= 59).then_some((hh, mm))
}

/// Deterministic digest of a snapshot's canonical serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// SHA-256 over the given bytes, hex-encoded.
    pub fn of(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        let mut hex = String::with_capacity(digest.len() * 2);
        for byte in digest {
            hex.push_str(&format!("{byte:02x}"));
        }
        Self(hex)
    }

    /// Hex digest string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
