// =============================================================================
// Interval Estimator — funding cadence implied by the timestamps
// =============================================================================
//
// hours = round((t[1] - t[0]) / 1h) over the first two *sorted* timestamps,
// halves rounding to even.  Fewer than two rows, or a gap that rounds to zero,
// yields the caller's fallback.  The estimate only seeds a default; a user-confirmed
// interval always wins.

use serde::Serialize;
use tracing::{debug, warn};

use crate::types::NormalizedObservation;

/// Suggested funding interval and whether it was measured or defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IntervalEstimate {
    pub hours: f64,
    pub detected: bool,
}

pub fn estimate_interval(sorted: &[NormalizedObservation], fallback_hours: f64) -> IntervalEstimate {
    let fallback = IntervalEstimate {
        hours: fallback_hours,
        detected: false,
    };

    let [first, second, ..] = sorted else {
        debug!(rows = sorted.len(), fallback_hours, "too few rows to detect interval");
        return fallback;
    };

    let seconds = (second.timestamp - first.timestamp).num_milliseconds() as f64 / 1000.0;
    let hours = (seconds / 3600.0).round_ties_even();
    if hours <= 0.0 {
        debug!(gap_seconds = seconds, fallback_hours, "sub-hour cadence; using fallback interval");
        return fallback;
    }

    debug!(hours, "funding interval detected");
    IntervalEstimate { hours, detected: true }
}

/// Log when the confirmed interval disagrees with a measured one.
///
/// Returns the advisory text, if any.
pub fn interval_mismatch(estimate: &IntervalEstimate, confirmed_hours: f64) -> Option<String> {
    if !estimate.detected || (estimate.hours - confirmed_hours).abs() < f64::EPSILON {
        return None;
    }
    warn!(
        detected = estimate.hours,
        confirmed = confirmed_hours,
        "confirmed funding interval differs from timestamp cadence"
    );
    Some(format!(
        "Funding interval set to {confirmed_hours}h but timestamps suggest {}h.",
        estimate.hours
    ))
}
