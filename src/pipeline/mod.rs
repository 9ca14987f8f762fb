// =============================================================================
// Funding APR Pipeline
// =============================================================================
//
// One run turns an uploaded table into an `AprReport` through a fixed chain of
// pure stages, each returning a new value:
//
//   RateNormalizer -> TimeWindowFilter -> IntervalEstimator
//     -> CompletenessChecker -> AprCalculator -> IndicatorEngine
//     -> ResultAssembler
//
// Per-row problems are absorbed (dropped + counted).  The only hard failures
// happen before this point: config validation and column resolution.

pub mod apr;
pub mod completeness;
pub mod interval;
pub mod normalizer;
pub mod report;
pub mod window;

pub use interval::IntervalEstimate;
pub use report::{AprReport, DroppedRows, LogicAuditRecord, SummaryMetrics};

use tracing::info;

use crate::config::Config;
use crate::indicators::compute_indicators;
use crate::table::{ColumnSelection, FundingTable};
use crate::types::RateFormat;

/// Suggest a funding interval for the table before the user confirms one.
pub fn suggest_interval(
    table: &FundingTable,
    selection: &ColumnSelection,
    rate_format: RateFormat,
    fallback_hours: f64,
) -> IntervalEstimate {
    let rates = normalizer::normalize_rates(&table.observations(selection), rate_format);
    let sorted = window::parse_and_sort(&rates.rows);
    interval::estimate_interval(&sorted.rows, fallback_hours)
}

/// Run every stage for one table and one validated config.
pub fn run(table: &FundingTable, selection: &ColumnSelection, config: &Config) -> AprReport {
    let mut advisories = Vec::new();

    // --- RateNormalizer ------------------------------------------------------
    let rates = normalizer::normalize_rates(&table.observations(selection), config.rate_format());

    // --- TimeWindowFilter ----------------------------------------------------
    let sorted = window::parse_and_sort(&rates.rows);
    let time_window = window::trailing_window(&sorted.rows, config.window_days());

    let dropped = DroppedRows {
        rate: rates.dropped,
        timestamp: sorted.dropped,
    };
    if dropped.total() > 0 {
        advisories.push(format!(
            "Dropped {} rows with an unparseable funding rate and {} with an unparseable timestamp.",
            dropped.rate, dropped.timestamp
        ));
    }

    // --- IntervalEstimator ---------------------------------------------------
    // Measured over the full sorted history; the confirmed value always wins.
    let estimate = interval::estimate_interval(&sorted.rows, config.interval_hours());
    advisories.extend(interval::interval_mismatch(&estimate, config.interval_hours()));

    // --- CompletenessChecker -------------------------------------------------
    let completeness = completeness::check_completeness(
        time_window.rows.len(),
        config.window_days(),
        config.interval_hours(),
    );
    advisories.extend(completeness.advisory.clone());

    // --- AprCalculator -------------------------------------------------------
    let per_row = apr::row_aprs(&time_window.rows, config.interval_hours());
    let window_apr = apr::window_apr(&time_window.rows, &per_row, config.window_days());

    // --- IndicatorEngine -----------------------------------------------------
    let apr_series: Vec<f64> = per_row.iter().map(|r| r.apr_pct).collect();
    let indicators = compute_indicators(&apr_series);

    // --- ResultAssembler -----------------------------------------------------
    let report = report::assemble(report::StageOutputs {
        config,
        selection,
        fingerprint: table.fingerprint(),
        window: time_window,
        interval: estimate,
        completeness,
        per_row,
        window_apr,
        indicators,
        dropped,
        advisories,
    });

    let (website, legacy) = report.headline();
    info!(
        exchange = config.exchange(),
        rows_used = report.summary.rows_used,
        rows_expected = report.summary.rows_expected,
        website_apr = %website,
        legacy_apr = %legacy,
        "funding APR computed"
    );

    report
}
