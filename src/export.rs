// =============================================================================
// CSV Export — enriched rows and logic summary
// =============================================================================
//
// Enriched export: every original column, untouched, followed by the derived
// columns.  Logic export: one header line and one value line from the audit
// record.  Undefined numbers are empty cells in the row export and "N/A" in
// the logic export.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::classify::AprBucket;
use crate::pipeline::{AprReport, LogicAuditRecord};
use crate::table::FundingTable;

pub const DERIVED_COLUMNS: [&str; 6] = ["Funding (%)", "APR (%)", "EMA10", "EMA30", "RSI14", "APR Bucket"];

/// `<exchange>_with_apr.csv`
pub fn enriched_file_name(exchange: &str) -> String {
    format!("{}_with_apr.csv", file_stem(exchange))
}

/// `<exchange>_apr_logic_summary.csv`
pub fn logic_file_name(exchange: &str) -> String {
    format!("{}_apr_logic_summary.csv", file_stem(exchange))
}

fn file_stem(exchange: &str) -> String {
    let stem: String = exchange
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "other".to_string()
    } else {
        stem
    }
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Write windowed rows, chronologically, with pass-through columns.
pub fn write_enriched<W: Write>(table: &FundingTable, report: &AprReport, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header: Vec<&str> = table.headers().iter().map(String::as_str).collect();
    header.extend(DERIVED_COLUMNS);
    wtr.write_record(&header).context("failed to write enriched header")?;

    for row in &report.rows {
        let original = table
            .record(row.source_row)
            .with_context(|| format!("row {} missing from source table", row.source_row))?;

        let mut record: Vec<String> = original.to_vec();
        record.push(row.funding_pct.to_string());
        record.push(row.apr_pct.to_string());
        record.push(cell(row.ema10));
        record.push(cell(row.ema30));
        record.push(cell(row.rsi14));
        record.push(AprBucket::classify(row.apr_pct).to_string());
        wtr.write_record(&record)
            .with_context(|| format!("failed to write enriched row {}", row.source_row))?;
    }

    wtr.flush().context("failed to flush enriched export")?;
    Ok(())
}

/// Write the audit record as a two-line CSV.
pub fn write_logic<W: Write>(audit: &LogicAuditRecord, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    let entries = audit.entries();
    wtr.write_record(entries.iter().map(|(k, _)| *k))
        .context("failed to write logic header")?;
    wtr.write_record(entries.iter().map(|(_, v)| v.as_str()))
        .context("failed to write logic values")?;
    wtr.flush().context("failed to flush logic export")?;
    Ok(())
}

pub fn save_enriched(table: &FundingTable, report: &AprReport, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_enriched(table, report, file)?;
    info!(path = %path.display(), rows = report.rows.len(), "enriched CSV written");
    Ok(())
}

pub fn save_logic(audit: &LogicAuditRecord, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_logic(audit, file)?;
    info!(path = %path.display(), "APR logic summary written");
    Ok(())
}
