//! Range driver: seek, extract, reconcile, one bucket at a time.
//!
//! Strictly sequential per browser session - the slider is shared mutable
//! state with one writer (the gesture) and one reader (the readout), and the
//! only safe ordering is gesture, settle, probe. Parallelism across buckets
//! is possible with independent sessions since bucket files never overlap,
//! but this driver runs one session.

use super::{BucketStore, ReconcileOutcome, SyncEngine, SyncError};
use crate::browser::{
    GestureActuator, IdleIndicator, PositionFeedback, ProbeError, TableSource,
};
use crate::seek::{SeekController, SeekOutcome, SeekPolicy};
use crate::shutdown::SharedShutdown;
use crate::snapshot::Snapshot;
use crate::{buckets_in_range, BucketKey, HourRange};
use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use tracing::{error, info, warn};

/// Everything the driver needs from one dashboard session.
pub trait DashboardSurface:
    PositionFeedback + GestureActuator + TableSource + IdleIndicator
{
}

impl<T> DashboardSurface for T where
    T: PositionFeedback + GestureActuator + TableSource + IdleIndicator
{
}

/// Outcome counts for one range sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeSummary {
    /// Buckets persisted for the first time
    pub created: u32,
    /// Buckets overwritten with changed content
    pub updated: u32,
    /// Buckets whose stored content already matched
    pub unchanged: u32,
    /// Buckets abandoned on a probe or storage error
    pub failed: u32,
}

impl RangeSummary {
    fn record(&mut self, outcome: ReconcileOutcome) {
        match outcome {
            ReconcileOutcome::Created => self.created += 1,
            ReconcileOutcome::Updated => self.updated += 1,
            ReconcileOutcome::Unchanged => self.unchanged += 1,
        }
    }

    /// Total buckets attempted.
    pub fn total(&self) -> u32 {
        self.created + self.updated + self.unchanged + self.failed
    }
}

impl fmt::Display for RangeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created {} | updated {} | unchanged {} | failed {}",
            self.created, self.updated, self.unchanged, self.failed
        )
    }
}

/// Iterates target buckets, converging the slider and reconciling each one.
pub struct SyncDriver<'a, P: ?Sized, S: ?Sized> {
    page: &'a P,
    store: &'a S,
    seek_policy: SeekPolicy,
    hours: HourRange,
    shutdown: Option<SharedShutdown>,
    show_progress: bool,
}

impl<'a, P, S> SyncDriver<'a, P, S>
where
    P: DashboardSurface + ?Sized,
    S: BucketStore + ?Sized,
{
    /// Driver over a dashboard session and a bucket store, covering every
    /// hour of each date by default.
    pub fn new(page: &'a P, store: &'a S) -> Self {
        Self {
            page,
            store,
            seek_policy: SeekPolicy::default(),
            hours: HourRange::FULL_DAY,
            shutdown: crate::shutdown::global(),
            show_progress: false,
        }
    }

    /// Restrict each date to an hour subrange.
    pub fn with_hours(mut self, hours: HourRange) -> Self {
        self.hours = hours;
        self
    }

    /// Override the seek policy.
    pub fn with_seek_policy(mut self, policy: SeekPolicy) -> Self {
        self.seek_policy = policy;
        self
    }

    /// Attach a shutdown handle checked between buckets.
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Render a progress bar over the bucket queue.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Sync every bucket in the inclusive date range, chronologically.
    ///
    /// Per-bucket failures are counted and logged; they never abort the
    /// range. An exhausted seek is not a failure by itself: extraction
    /// proceeds from the best-reached position and the bucket is counted by
    /// its reconcile outcome.
    pub async fn sync_range(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<RangeSummary, SyncError> {
        let buckets = buckets_in_range(start_date, end_date, self.hours);
        info!(
            start = %start_date,
            end = %end_date,
            buckets = buckets.len(),
            "starting range sync"
        );

        let progress = self.make_progress_bar(buckets.len() as u64);
        let mut summary = RangeSummary::default();

        for bucket in buckets {
            if let Some(shutdown) = &self.shutdown {
                if shutdown.is_requested() {
                    warn!(%bucket, "shutdown requested, abandoning remaining buckets");
                    break;
                }
            }

            progress.set_message(bucket.to_string());
            match self.sync_bucket(bucket).await {
                Ok(outcome) => summary.record(outcome),
                Err(e) => {
                    error!(%bucket, error = %e, "bucket failed");
                    summary.failed += 1;
                }
            }
            progress.inc(1);
        }

        progress.finish_and_clear();
        info!(%summary, "range sync finished");
        Ok(summary)
    }

    /// Seek, wait for the table to load, extract, reconcile.
    async fn sync_bucket(&self, bucket: BucketKey) -> Result<ReconcileOutcome, SyncError> {
        let target = bucket.target_time();
        let controller = SeekController::with_policy(self.page, self.seek_policy.clone());

        match controller.seek(target).await? {
            SeekOutcome::Converged {
                attempts,
                final_error_hours,
            } => info!(
                %bucket,
                attempts,
                error_hours = %format!("{final_error_hours:+.1}"),
                "seek converged"
            ),
            SeekOutcome::StuckAccepted {
                final_error_hours, ..
            } => warn!(
                %bucket,
                error_hours = %format!("{final_error_hours:+.1}"),
                "seek stuck, extracting from best-effort position"
            ),
            SeekOutcome::Exhausted { final_error_hours } => warn!(
                %bucket,
                error_hours = %format!("{final_error_hours:+.1}"),
                "seek exhausted, extracting from best-reached position"
            ),
        }

        self.page.wait_until_idle().await?;

        // Re-probe so the log shows what hour the table actually reflects.
        match self.page.current_value().await {
            Ok(reached) => info!(
                %bucket,
                reached = %reached.format("%Y-%m-%d %H:%M"),
                "extracting table"
            ),
            Err(ProbeError::FeedbackUnavailable(_)) => {}
            Err(e) => return Err(e.into()),
        }

        let table = self.page.extract_table().await?;
        let snapshot = Snapshot::from_raw_table(bucket, table);
        let engine = SyncEngine::new(self.store);
        Ok(engine.reconcile(bucket, &snapshot)?)
    }

    fn make_progress_bar(&self, total: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::with_template(
                "{bar:40.cyan/blue} {pos}/{len} buckets ({eta}) {msg}",
            )
            .expect("static template is valid"),
        );
        bar
    }
}
