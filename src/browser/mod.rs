//! Probe/actuation boundary against the dashboard UI.
//!
//! The slider exposes no numeric state we trust; the only feedback is its
//! formatted text readout, and the only input is a drag gesture. These seams
//! keep the seek controller and the sync driver independent of WebDriver
//! plumbing: [`PositionFeedback`] reads where the slider is,
//! [`GestureActuator`] moves it, [`TableSource`] scrapes the rendered table,
//! and [`IdleIndicator`] waits out the dashboard's asynchronous re-render.

use async_trait::async_trait;
use chrono::NaiveDateTime;

pub mod page;
pub mod readout;

pub use page::DashboardPage;

/// Probe/actuation errors
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// Slider readout absent or unparsable
    #[error("slider readout unavailable: {0}")]
    FeedbackUnavailable(String),

    /// Slider geometry could not be determined (e.g. detached from the page)
    #[error("actuation failed: {0}")]
    ActuationError(String),

    /// The data table is absent from the rendered page
    #[error("no data table found on the page")]
    NoTableFound,

    /// WebDriver session failure
    #[error("browser session error: {0}")]
    Session(String),
}

/// Result type for probe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// A scraped table, exactly as rendered: one header row and the data rows in
/// display order. Cell order within a row follows the header order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    /// Column names from the header row
    pub headers: Vec<String>,
    /// Data rows, each aligned with `headers`
    pub rows: Vec<Vec<String>>,
}

/// Reads the slider's currently displayed instant.
///
/// This is the only source of truth for "where is the slider now"; the
/// control's internal numeric state is not assumed reliable.
#[async_trait]
pub trait PositionFeedback: Send + Sync {
    /// Current displayed value of the slider.
    ///
    /// Pure read; no side effects on the page.
    ///
    /// # Errors
    /// [`ProbeError::FeedbackUnavailable`] if the readout is absent or does
    /// not parse.
    async fn current_value(&self) -> ProbeResult<NaiveDateTime>;
}

/// Issues a single proportional drag gesture against the slider.
#[async_trait]
pub trait GestureActuator: Send + Sync {
    /// Press-move-release anchored at the slider thumb, displacing it by
    /// `delta_fraction * track_width` (signed, in `[-1, 1]`).
    ///
    /// Returns as soon as the gesture is delivered; the dashboard updates its
    /// readout asynchronously, and verifying convergence is the seek
    /// controller's job, not the actuator's.
    ///
    /// # Errors
    /// [`ProbeError::ActuationError`] if the slider's geometry cannot be
    /// determined.
    async fn drag(&self, delta_fraction: f64) -> ProbeResult<()>;
}

/// Scrapes the rendered data table.
#[async_trait]
pub trait TableSource: Send + Sync {
    /// Extract the table as rendered.
    ///
    /// The header is read exactly once per call. A present-but-empty table
    /// yields a [`RawTable`] with zero rows; that is a valid outcome, distinct
    /// from [`ProbeError::NoTableFound`].
    async fn extract_table(&self) -> ProbeResult<RawTable>;
}

/// Waits for the dashboard's busy/loading indicator to clear.
#[async_trait]
pub trait IdleIndicator: Send + Sync {
    /// Block until the page looks idle, with a bounded fallback wait if the
    /// busy indicator is never observed. Timing out is treated as success:
    /// absence of the indicator is ambiguous, not diagnostic.
    async fn wait_until_idle(&self) -> ProbeResult<()>;
}
