// =============================================================================
// Completeness Checker — observed vs. theoretical row count
// =============================================================================
//
// expected = floor(window_days * 24 / interval_hours)
//
// Falling short is an advisory, never a failure: the result is still produced
// with its reliability flagged.

use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completeness {
    pub actual_rows: usize,
    pub expected_rows: usize,
    /// Present when `actual_rows < expected_rows`.
    pub advisory: Option<String>,
}

impl Completeness {
    pub fn is_complete(&self) -> bool {
        self.advisory.is_none()
    }
}

/// Theoretical row count for a window; `interval_hours` must be positive.
pub fn expected_rows(window_days: u32, interval_hours: f64) -> usize {
    let expected = (f64::from(window_days) * 24.0 / interval_hours).floor();
    if expected.is_finite() && expected > 0.0 {
        expected as usize
    } else {
        0
    }
}

pub fn check_completeness(actual_rows: usize, window_days: u32, interval_hours: f64) -> Completeness {
    let expected_rows = expected_rows(window_days, interval_hours);
    let advisory = (actual_rows < expected_rows).then(|| {
        warn!(actual_rows, expected_rows, window_days, "fewer funding rows than expected");
        format!(
            "Only {actual_rows} rows found in timeframe, expected ~{expected_rows}. \
             Results may be less reliable."
        )
    });

    Completeness {
        actual_rows,
        expected_rows,
        advisory,
    }
}
