//! Adaptive slider-seek control loop.
//!
//! The mapping from drag distance to resulting time delta is unknown,
//! nonlinear, and depends on the slider's current internal range (hours per
//! pixel vary), so no single gesture can land on the target. The controller
//! instead relaxes toward it: probe the readout, compute the remaining error
//! in hours, pick a drag magnitude from a monotone step table (coarse for
//! large errors, fine near the target), issue the gesture, let the page
//! settle, and probe again. A stuck detector terminates gracefully when
//! successive probes stop moving - re-render lag or track saturation can make
//! a step produce no observable change, and without the detector the loop
//! would spin out its whole attempt budget on a position it can never leave.

use crate::browser::{GestureActuator, PositionFeedback, ProbeError, ProbeResult};
use chrono::NaiveDateTime;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Error-to-step table: at an absolute error above the threshold (hours),
/// drag by the paired fraction of track width. Monotone by construction:
/// larger error never selects a smaller step.
const STEP_TABLE: [(f64, f64); 6] = [
    (480.0, 0.15),
    (240.0, 0.08),
    (120.0, 0.04),
    (48.0, 0.02),
    (12.0, 0.01),
    (3.0, 0.005),
];

/// Step fraction below the smallest table threshold.
const MIN_STEP_FRACTION: f64 = 0.002;

/// Tuning constants for one seek.
///
/// The thresholds are empirically tuned against the live dashboard, not
/// derived; retuning is fine as long as the step schedule stays monotone.
#[derive(Debug, Clone)]
pub struct SeekPolicy {
    /// Attempt budget before giving up with [`SeekOutcome::Exhausted`].
    pub max_attempts: u32,
    /// Absolute error (hours) under which the seek counts as converged.
    pub tolerance_hours: f64,
    /// Two successive errors closer than this (hours) count as "no movement".
    pub stuck_equality_hours: f64,
    /// Consecutive no-movement probes tolerated before accepting the position.
    pub stuck_streak_threshold: u32,
    /// Wait after each gesture for the dashboard to re-render its readout.
    pub settle_delay: Duration,
}

impl Default for SeekPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            tolerance_hours: 0.5,
            stuck_equality_hours: 0.1,
            stuck_streak_threshold: 3,
            settle_delay: Duration::from_millis(800),
        }
    }
}

impl SeekPolicy {
    /// Signed drag fraction for a signed error in hours.
    pub fn step_fraction(&self, error_hours: f64) -> f64 {
        let magnitude = STEP_TABLE
            .iter()
            .find(|(threshold, _)| error_hours.abs() > *threshold)
            .map(|(_, fraction)| *fraction)
            .unwrap_or(MIN_STEP_FRACTION);
        magnitude.copysign(error_hours)
    }
}

/// Mutable state of one in-flight seek; dropped when the seek terminates.
#[derive(Debug)]
struct SeekState {
    attempts: u32,
    last_error_hours: f64,
    stuck_count: u32,
}

impl SeekState {
    fn new() -> Self {
        Self {
            attempts: 0,
            last_error_hours: f64::INFINITY,
            stuck_count: 0,
        }
    }
}

/// Terminal state of a seek.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeekOutcome {
    /// Final error is within tolerance.
    Converged {
        /// Signed remaining error in hours
        final_error_hours: f64,
        /// Probe/gesture iterations used
        attempts: u32,
    },
    /// The slider stopped responding; the reached position is accepted as
    /// best effort. Callers that need exactness must re-validate the final
    /// probed value against the target.
    StuckAccepted {
        /// Signed remaining error in hours
        final_error_hours: f64,
        /// Probe/gesture iterations used
        attempts: u32,
    },
    /// Attempt budget ran out before convergence or stuck-acceptance.
    Exhausted {
        /// Signed remaining error at the last probe, in hours
        final_error_hours: f64,
    },
}

impl SeekOutcome {
    /// Whether the reached position is usable (converged or best-effort).
    pub fn is_success(&self) -> bool {
        !matches!(self, SeekOutcome::Exhausted { .. })
    }

    /// Signed remaining error in hours at termination.
    pub fn final_error_hours(&self) -> f64 {
        match *self {
            SeekOutcome::Converged {
                final_error_hours, ..
            }
            | SeekOutcome::StuckAccepted {
                final_error_hours, ..
            }
            | SeekOutcome::Exhausted { final_error_hours } => final_error_hours,
        }
    }
}

/// Drives the slider to a target instant through a feedback/actuator pair.
pub struct SeekController<'a, P: ?Sized> {
    slider: &'a P,
    policy: SeekPolicy,
}

impl<'a, P> SeekController<'a, P>
where
    P: PositionFeedback + GestureActuator + ?Sized,
{
    /// Controller with the default policy.
    pub fn new(slider: &'a P) -> Self {
        Self::with_policy(slider, SeekPolicy::default())
    }

    /// Controller with a custom policy (tests use zero settle delay).
    pub fn with_policy(slider: &'a P, policy: SeekPolicy) -> Self {
        Self { slider, policy }
    }

    /// Seek the slider to `target`.
    ///
    /// Returns the terminal [`SeekOutcome`]; [`SeekOutcome::Exhausted`] is a
    /// non-fatal outcome, not an error. An unreadable readout consumes the
    /// attempt and is retried on the next iteration; it becomes a
    /// [`ProbeError::FeedbackUnavailable`] error only when every attempt
    /// failed that way. Gesture failures surface immediately.
    pub async fn seek(&self, target: NaiveDateTime) -> ProbeResult<SeekOutcome> {
        let mut state = SeekState::new();
        let mut ever_probed = false;

        loop {
            state.attempts += 1;
            let current = match self.slider.current_value().await {
                Ok(current) => current,
                Err(ProbeError::FeedbackUnavailable(reason)) => {
                    debug!(attempt = state.attempts, reason = %reason, "readout unavailable");
                    if state.attempts >= self.policy.max_attempts {
                        if ever_probed {
                            return Ok(SeekOutcome::Exhausted {
                                final_error_hours: state.last_error_hours,
                            });
                        }
                        return Err(ProbeError::FeedbackUnavailable(format!(
                            "readout unreadable on all {} attempts: {reason}",
                            state.attempts
                        )));
                    }
                    sleep(self.policy.settle_delay).await;
                    continue;
                }
                Err(e) => return Err(e),
            };
            ever_probed = true;
            let error_hours = signed_error_hours(target, current);

            debug!(
                attempt = state.attempts,
                current = %current.format("%Y-%m-%d %H:%M"),
                error_hours = %format!("{error_hours:+.1}"),
                "seek probe"
            );

            if error_hours.abs() < self.policy.tolerance_hours {
                debug!(attempts = state.attempts, "seek converged");
                return Ok(SeekOutcome::Converged {
                    final_error_hours: error_hours,
                    attempts: state.attempts,
                });
            }

            if (error_hours - state.last_error_hours).abs() < self.policy.stuck_equality_hours {
                state.stuck_count += 1;
            } else {
                state.stuck_count = 0;
            }
            state.last_error_hours = error_hours;

            if state.stuck_count > self.policy.stuck_streak_threshold {
                warn!(
                    attempts = state.attempts,
                    error_hours = %format!("{error_hours:+.1}"),
                    "slider stuck, accepting current position"
                );
                return Ok(SeekOutcome::StuckAccepted {
                    final_error_hours: error_hours,
                    attempts: state.attempts,
                });
            }

            if state.attempts >= self.policy.max_attempts {
                warn!(
                    error_hours = %format!("{error_hours:+.1}"),
                    "seek attempt budget exhausted"
                );
                return Ok(SeekOutcome::Exhausted {
                    final_error_hours: error_hours,
                });
            }

            let step = self.policy.step_fraction(error_hours);
            self.slider.drag(step).await?;
            sleep(self.policy.settle_delay).await;
        }
    }
}

/// `(target - current)` in signed hours; positive means the target is later
/// than the current position.
fn signed_error_hours(target: NaiveDateTime, current: NaiveDateTime) -> f64 {
    (target - current).num_minutes() as f64 / 60.0
}
