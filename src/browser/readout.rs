//! Parsing of the slider's text readout.
//!
//! The slider reports its position only through `aria-valuetext`, formatted
//! as `YYYY-MM-DD HH:MM`. Parsing lives here so the seek controller never
//! handles raw readout text.

use super::{ProbeError, ProbeResult};
use chrono::NaiveDateTime;

/// Readout format as rendered by the dashboard.
const READOUT_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Parse a slider readout string into the instant it displays.
///
/// # Errors
/// [`ProbeError::FeedbackUnavailable`] when the string does not match the
/// dashboard's `YYYY-MM-DD HH:MM` format.
pub fn parse_readout(value_text: &str) -> ProbeResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value_text.trim(), READOUT_FORMAT).map_err(|e| {
        ProbeError::FeedbackUnavailable(format!("unparsable readout '{value_text}': {e}"))
    })
}
