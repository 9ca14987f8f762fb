// =============================================================================
// Result Assembler — enriched rows, summary metrics, logic audit record
// =============================================================================
//
// Everything a presentation or export layer needs from one run.  All values
// are computed once here and never mutated afterwards; undefined aggregates
// stay `None` and only become "N/A" when rendered.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::classify::DayStrip;
use crate::config::Config;
use crate::indicators::IndicatorColumns;
use crate::pipeline::apr::{RowApr, WindowApr};
use crate::pipeline::completeness::Completeness;
use crate::pipeline::interval::IntervalEstimate;
use crate::pipeline::window::TimeWindow;
use crate::table::ColumnSelection;
use crate::types::{format_pct, EnrichedRow, NormalizedObservation, RateFormat};

/// Whole-window figures for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryMetrics {
    /// Compounding ("website-style") APR in percent.
    pub window_apr_compounding: Option<f64>,
    /// Mean of per-row APRs in percent.
    pub window_apr_average: Option<f64>,
    pub rows_used: usize,
    pub rows_expected: usize,
    pub window_start: Option<DateTime<Utc>>,
    pub window_end: Option<DateTime<Utc>>,
}

/// Rows discarded at each parsing stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DroppedRows {
    pub rate: usize,
    pub timestamp: usize,
}

impl DroppedRows {
    pub fn total(&self) -> usize {
        self.rate + self.timestamp
    }
}

/// Flat snapshot of config and results, for reproducible exports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogicAuditRecord {
    pub exchange: String,
    pub timestamp_column: String,
    pub rate_column: String,
    pub interval_hours: f64,
    pub detected_interval_hours: Option<f64>,
    pub window_days: u32,
    pub rate_format: RateFormat,
    pub rows_used: usize,
    pub rows_expected: usize,
    pub dropped_rate_rows: usize,
    pub dropped_timestamp_rows: usize,
    pub window_start: Option<DateTime<Utc>>,
    pub window_end: Option<DateTime<Utc>>,
    pub website_style_apr: Option<f64>,
    pub legacy_apr_avg: Option<f64>,
    pub input_sha256: String,
}

impl LogicAuditRecord {
    /// Ordered key/value pairs with undefined values rendered as "N/A".
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let instant = |t: Option<DateTime<Utc>>| t.map_or_else(|| "N/A".to_string(), |t| t.to_rfc3339());
        let number = |v: Option<f64>| v.map_or_else(|| "N/A".to_string(), |v| v.to_string());

        vec![
            ("Exchange", self.exchange.clone()),
            ("Timestamp Column", self.timestamp_column.clone()),
            ("Funding Rate Column", self.rate_column.clone()),
            ("Funding Interval (H)", self.interval_hours.to_string()),
            ("Detected Interval (H)", number(self.detected_interval_hours)),
            ("APR Timeframe (Days)", self.window_days.to_string()),
            ("Funding Format", self.rate_format.label().to_string()),
            ("Funding Rows Used", self.rows_used.to_string()),
            ("Expected Rows", self.rows_expected.to_string()),
            ("Dropped Rate Rows", self.dropped_rate_rows.to_string()),
            ("Dropped Timestamp Rows", self.dropped_timestamp_rows.to_string()),
            ("Window Start", instant(self.window_start)),
            ("Window End", instant(self.window_end)),
            ("Website-Style APR", number(self.website_style_apr)),
            ("Legacy APR Avg", number(self.legacy_apr_avg)),
            ("Input SHA-256", self.input_sha256.clone()),
        ]
    }
}

/// Complete output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AprReport {
    pub rows: Vec<EnrichedRow>,
    pub summary: SummaryMetrics,
    pub audit: LogicAuditRecord,
    pub interval: IntervalEstimate,
    pub dropped: DroppedRows,
    pub strip: Vec<DayStrip>,
    /// Non-fatal notes: dropped rows, short windows, interval disagreement.
    pub advisories: Vec<String>,
}

impl AprReport {
    /// The two headline figures, formatted for display.
    pub fn headline(&self) -> (String, String) {
        (
            format_pct(self.summary.window_apr_compounding),
            format_pct(self.summary.window_apr_average),
        )
    }
}

/// Inputs gathered from every stage, ready to be packaged.
pub(crate) struct StageOutputs<'a> {
    pub config: &'a Config,
    pub selection: &'a ColumnSelection,
    pub fingerprint: String,
    pub window: TimeWindow,
    pub interval: IntervalEstimate,
    pub completeness: Completeness,
    pub per_row: Vec<RowApr>,
    pub window_apr: WindowApr,
    pub indicators: IndicatorColumns,
    pub dropped: DroppedRows,
    pub advisories: Vec<String>,
}

pub(crate) fn enrich_rows(
    observations: &[NormalizedObservation],
    per_row: &[RowApr],
    indicators: &IndicatorColumns,
) -> Vec<EnrichedRow> {
    observations
        .iter()
        .zip(per_row)
        .enumerate()
        .map(|(i, (obs, apr))| EnrichedRow {
            source_row: obs.source_row,
            timestamp: obs.timestamp,
            rate_decimal: obs.rate_decimal,
            funding_pct: apr.funding_pct,
            apr_pct: apr.apr_pct,
            ema10: indicators.ema10.get(i).copied().flatten(),
            ema30: indicators.ema30.get(i).copied().flatten(),
            rsi14: indicators.rsi14.get(i).copied().flatten(),
        })
        .collect()
}

pub(crate) fn assemble(stages: StageOutputs<'_>) -> AprReport {
    let StageOutputs {
        config,
        selection,
        fingerprint,
        window,
        interval,
        completeness,
        per_row,
        window_apr,
        indicators,
        dropped,
        advisories,
    } = stages;

    let rows = enrich_rows(&window.rows, &per_row, &indicators);
    let strip = crate::classify::threshold_strip(&rows);

    let summary = SummaryMetrics {
        window_apr_compounding: window_apr.compounding,
        window_apr_average: window_apr.average,
        rows_used: completeness.actual_rows,
        rows_expected: completeness.expected_rows,
        window_start: window.start,
        window_end: window.end,
    };

    let audit = LogicAuditRecord {
        exchange: config.exchange().to_string(),
        timestamp_column: selection.timestamp_column.clone(),
        rate_column: selection.rate_column.clone(),
        interval_hours: config.interval_hours(),
        detected_interval_hours: interval.detected.then_some(interval.hours),
        window_days: config.window_days(),
        rate_format: config.rate_format(),
        rows_used: summary.rows_used,
        rows_expected: summary.rows_expected,
        dropped_rate_rows: dropped.rate,
        dropped_timestamp_rows: dropped.timestamp,
        window_start: summary.window_start,
        window_end: summary.window_end,
        website_style_apr: summary.window_apr_compounding,
        legacy_apr_avg: summary.window_apr_average,
        input_sha256: fingerprint,
    };

    AprReport {
        rows,
        summary,
        audit,
        interval,
        dropped,
        strip,
        advisories,
    }
}
