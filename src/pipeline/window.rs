// =============================================================================
// Time Window Filter — parse, sort, and cut to a trailing window
// =============================================================================
//
// 1. Parse each timestamp; rows that fail are dropped and counted.
// 2. Stable ascending sort (equal instants keep their input order).
// 3. cutoff = max(timestamp) - window_days * 24h; keep rows >= cutoff.
//
// Naive timestamps are taken as UTC.  Bare integers are Unix epochs:
// seconds below 1e11, milliseconds at or above.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::types::{NormalizedObservation, RateRow};

/// Epoch values at or above this are read as milliseconds.
const EPOCH_MILLIS_THRESHOLD: f64 = 1e11;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
];

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Parse a timestamp cell into a UTC instant.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let mut s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Some(cut) = s.len().checked_sub(4) {
        if s.get(cut..).is_some_and(|tail| tail.eq_ignore_ascii_case(" utc")) {
            s = s[..cut].trim_end();
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|n| n.and_utc());
        }
    }

    parse_epoch(s)
}

fn parse_epoch(s: &str) -> Option<DateTime<Utc>> {
    if !s.chars().all(|c| c.is_ascii_digit() || c == '.' || c == '-') {
        return None;
    }
    let value: f64 = s.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    let millis = if value.abs() >= EPOCH_MILLIS_THRESHOLD {
        value
    } else {
        value * 1000.0
    };
    if millis.abs() > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_millis(millis.round() as i64)
}

// =============================================================================
// Sorting
// =============================================================================

/// Chronologically sorted observations plus the count of unparseable rows.
#[derive(Debug, Clone, PartialEq)]
pub struct SortedObservations {
    pub rows: Vec<NormalizedObservation>,
    pub dropped: usize,
}

pub fn parse_and_sort(rows: &[RateRow]) -> SortedObservations {
    let mut parsed = Vec::with_capacity(rows.len());
    let mut dropped = 0usize;

    for row in rows {
        match parse_timestamp(&row.timestamp) {
            Some(timestamp) => parsed.push(NormalizedObservation {
                source_row: row.source_row,
                timestamp,
                rate_decimal: row.rate_decimal,
            }),
            None => dropped += 1,
        }
    }

    // `sort_by_key` is stable: ties keep input order.
    parsed.sort_by_key(|o| o.timestamp);

    if dropped > 0 {
        warn!(dropped, kept = parsed.len(), "dropped rows with unparseable timestamp");
    }

    SortedObservations { rows: parsed, dropped }
}

// =============================================================================
// Trailing window
// =============================================================================

/// Rows inside the trailing window and its bounds.
///
/// `cutoff`, `start` and `end` are `None` when there are no rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeWindow {
    pub rows: Vec<NormalizedObservation>,
    pub cutoff: Option<DateTime<Utc>>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Keep sorted rows whose timestamp is at or after `max - window_days`.
pub fn trailing_window(sorted: &[NormalizedObservation], window_days: u32) -> TimeWindow {
    let Some(latest) = sorted.iter().map(|o| o.timestamp).max() else {
        return TimeWindow {
            rows: Vec::new(),
            cutoff: None,
            start: None,
            end: None,
        };
    };

    // Near the bottom of chrono's range the cutoff saturates and keeps every row.
    let cutoff = latest
        .checked_sub_signed(Duration::days(i64::from(window_days)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let rows: Vec<NormalizedObservation> =
        sorted.iter().filter(|o| o.timestamp >= cutoff).copied().collect();

    debug!(
        window_days,
        total = sorted.len(),
        kept = rows.len(),
        cutoff = %cutoff,
        "trailing window applied"
    );

    TimeWindow {
        start: rows.first().map(|o| o.timestamp),
        end: rows.last().map(|o| o.timestamp),
        cutoff: Some(cutoff),
        rows,
    }
}
