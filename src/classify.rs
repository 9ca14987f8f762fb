// =============================================================================
// APR Threshold Classifier — qualitative buckets for visual encoding
// =============================================================================
//
//   apr >  100   => HighPositive   (green)
//   apr < -100   => HighNegative   (red)
//   |apr| < 1    => NearZero       (orange)
//   otherwise    => Moderate       (blue)
//
// Total over every f64: NaN fails each comparison and lands in Moderate.

use chrono::NaiveDate;
use serde::Serialize;

use crate::types::EnrichedRow;

pub const HIGH_APR_THRESHOLD: f64 = 100.0;
pub const NEAR_ZERO_APR_THRESHOLD: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AprBucket {
    HighPositive,
    HighNegative,
    NearZero,
    Moderate,
}

impl AprBucket {
    pub fn classify(apr_pct: f64) -> Self {
        if apr_pct > HIGH_APR_THRESHOLD {
            Self::HighPositive
        } else if apr_pct < -HIGH_APR_THRESHOLD {
            Self::HighNegative
        } else if apr_pct.abs() < NEAR_ZERO_APR_THRESHOLD {
            Self::NearZero
        } else {
            Self::Moderate
        }
    }

    /// Swatch colour used by the threshold strip.
    pub fn color(&self) -> &'static str {
        match self {
            Self::HighPositive => "green",
            Self::HighNegative => "red",
            Self::NearZero => "orange",
            Self::Moderate => "blue",
        }
    }
}

impl std::fmt::Display for AprBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HighPositive => write!(f, "high-positive"),
            Self::HighNegative => write!(f, "high-negative"),
            Self::NearZero => write!(f, "near-zero"),
            Self::Moderate => write!(f, "moderate"),
        }
    }
}

// =============================================================================
// Day-grouped strip
// =============================================================================

/// The buckets of one UTC calendar day, in chronological order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayStrip {
    pub date: NaiveDate,
    pub buckets: Vec<AprBucket>,
    /// Swatch per bucket, same order.
    pub colors: Vec<&'static str>,
}

/// Group consecutive rows by UTC date so a renderer can draw a separator
/// between days.  Rows must already be sorted.
pub fn threshold_strip(rows: &[EnrichedRow]) -> Vec<DayStrip> {
    let mut strip: Vec<DayStrip> = Vec::new();
    for row in rows {
        let date = row.timestamp.date_naive();
        let bucket = AprBucket::classify(row.apr_pct);
        match strip.last_mut() {
            Some(day) if day.date == date => {
                day.buckets.push(bucket);
                day.colors.push(bucket.color());
            }
            _ => strip.push(DayStrip {
                date,
                buckets: vec![bucket],
                colors: vec![bucket.color()],
            }),
        }
    }
    strip
}
