// =============================================================================
// Shared types used across the funding APR engine
// =============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the raw funding-rate column expresses its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateFormat {
    /// Plain fraction per interval, e.g. `0.0001`.
    Decimal,
    /// Percent units per interval, e.g. `0.01` or `0.01%`.
    Percent,
}

impl Default for RateFormat {
    fn default() -> Self {
        Self::Decimal
    }
}

impl RateFormat {
    /// Label used in the logic summary export.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Decimal => "Decimal (e.g. 0.0001)",
            Self::Percent => "Percent (e.g. 0.01%)",
        }
    }
}

impl std::fmt::Display for RateFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decimal => write!(f, "decimal"),
            Self::Percent => write!(f, "percent"),
        }
    }
}

impl std::str::FromStr for RateFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "decimal" | "dec" => Ok(Self::Decimal),
            "percent" | "pct" | "%" => Ok(Self::Percent),
            other => Err(format!("unknown rate format '{other}' (expected decimal or percent)")),
        }
    }
}

/// One input row as selected at the ingestion boundary.
///
/// `source_row` is the zero-based index of the record in the uploaded table so
/// that pass-through columns can be re-attached on export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundingObservation {
    pub source_row: usize,
    pub timestamp: String,
    pub raw_rate: String,
}

/// A row whose rate parsed, but whose timestamp is still raw text.
#[derive(Debug, Clone, PartialEq)]
pub struct RateRow {
    pub source_row: usize,
    pub timestamp: String,
    pub rate_decimal: f64,
}

/// A fully parsed observation: instant plus fractional rate per interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalizedObservation {
    pub source_row: usize,
    pub timestamp: DateTime<Utc>,
    /// Fractional funding rate per interval (0.0001 = 0.01%). Always finite.
    pub rate_decimal: f64,
}

/// A windowed observation with its per-row APR and indicator columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRow {
    pub source_row: usize,
    pub timestamp: DateTime<Utc>,
    pub rate_decimal: f64,
    pub funding_pct: f64,
    pub apr_pct: f64,
    pub ema10: Option<f64>,
    pub ema30: Option<f64>,
    pub rsi14: Option<f64>,
}

/// Render an optional percentage the way the summary cards show it.
pub fn format_pct(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.2}%"),
        _ => "N/A".to_string(),
    }
}
