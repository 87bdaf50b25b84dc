//! Fingerprint-based incremental synchronization.
//!
//! For each bucket the engine decides whether a freshly scraped snapshot is
//! new, changed, or identical to what is already stored, and only writes in
//! the first two cases. Comparison is by [`Fingerprint`] of the canonical
//! serialization, so re-running a range over unchanged data touches nothing
//! and driver-level retries are idempotent.

use crate::snapshot::{Fingerprint, Snapshot};
use crate::BucketKey;
use tracing::{debug, info};

pub mod driver;
pub mod store;

pub use driver::{RangeSummary, SyncDriver};
pub use store::FsBucketStore;

/// Per-bucket sync errors: a probe failure or a storage failure. Either one
/// abandons the current bucket; the driver continues with the rest of the
/// range.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Probe/actuation boundary failure
    #[error(transparent)]
    Probe(#[from] crate::browser::ProbeError),

    /// Bucket storage failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem failure reading or writing a bucket
    #[error("storage I/O for bucket {bucket}: {source}")]
    Io {
        bucket: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result of reconciling one snapshot against the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// No record existed for the bucket; the snapshot was persisted.
    Created,
    /// A record existed with a different fingerprint; it was overwritten.
    Updated,
    /// The stored fingerprint matches; nothing was written.
    Unchanged,
}

/// A persisted bucket: the exact stored canonical content and its
/// fingerprint. The fingerprint is derived from the stored bytes, so the two
/// cannot diverge.
#[derive(Debug, Clone)]
pub struct StoredBucketRecord {
    content: String,
    fingerprint: Fingerprint,
}

impl StoredBucketRecord {
    /// Wrap stored content, deriving its fingerprint.
    pub fn from_content(content: String) -> Self {
        let fingerprint = Fingerprint::of(content.as_bytes());
        Self {
            content,
            fingerprint,
        }
    }

    /// The stored canonical CSV.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Fingerprint of the stored content.
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }
}

/// Bucket persistence boundary.
///
/// `write` must be atomic at the granularity of one bucket: either the old
/// content or the complete new content is observable, never a partial write.
pub trait BucketStore: Send + Sync {
    /// Read the stored record for a bucket, if any.
    fn read(&self, bucket: BucketKey) -> Result<Option<StoredBucketRecord>, StoreError>;

    /// Atomically replace (or create) the stored content for a bucket.
    fn write(&self, bucket: BucketKey, content: &str) -> Result<(), StoreError>;
}

/// Decides, per bucket, whether a snapshot is new, changed, or identical.
pub struct SyncEngine<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> SyncEngine<'a, S>
where
    S: BucketStore + ?Sized,
{
    /// Engine over the given store.
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Reconcile a snapshot against the stored record for `bucket`.
    ///
    /// Serializes the snapshot canonically, fingerprints it, and compares
    /// with the stored fingerprint: no record yields `Created` (persist),
    /// equal fingerprints yield `Unchanged` (no write), different ones yield
    /// `Updated` (overwrite). Zero-record snapshots reconcile like any other.
    pub fn reconcile(
        &self,
        bucket: BucketKey,
        snapshot: &Snapshot,
    ) -> Result<ReconcileOutcome, StoreError> {
        let content = snapshot.canonical_csv();
        let fingerprint = Fingerprint::of(content.as_bytes());

        match self.store.read(bucket)? {
            None => {
                self.store.write(bucket, &content)?;
                info!(%bucket, records = snapshot.record_count(), "bucket created");
                Ok(ReconcileOutcome::Created)
            }
            Some(existing) if existing.fingerprint() == &fingerprint => {
                debug!(%bucket, "bucket unchanged");
                Ok(ReconcileOutcome::Unchanged)
            }
            Some(_) => {
                self.store.write(bucket, &content)?;
                info!(%bucket, records = snapshot.record_count(), "bucket updated");
                Ok(ReconcileOutcome::Updated)
            }
        }
    }
}
