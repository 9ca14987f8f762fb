// =============================================================================
// Funding Table — typed ingestion boundary
// =============================================================================
//
// An uploaded file is read once into a header + string-cell table.  Column
// names are resolved to indices exactly once (`ColumnSelection::resolve`), and
// from then on the pipeline only sees `FundingObservation` rows.  All other
// columns stay in the table untouched so exports can pass them through.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::IngestError;
use crate::types::FundingObservation;

/// Raw uploaded table: header row plus string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FundingTable {
    headers: Vec<String>,
    records: Vec<Vec<String>>,
}

impl FundingTable {
    /// Build a table from already-split cells.  Short records are padded with
    /// empty cells so every record is header-aligned.
    pub fn new(headers: Vec<String>, records: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let records = records
            .into_iter()
            .map(|mut r| {
                if r.len() < width {
                    r.resize(width, String::new());
                }
                r
            })
            .collect();
        Self { headers, records }
    }

    /// Read CSV from any reader.  Ragged lines are tolerated.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, IngestError> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(IngestError::EmptyHeader);
        }

        let mut records = Vec::new();
        for result in rdr.records() {
            let record = result?;
            records.push(record.iter().map(str::to_string).collect());
        }

        debug!(columns = headers.len(), rows = records.len(), "csv table loaded");
        Ok(Self::new(headers, records))
    }

    pub fn from_csv_str(text: &str) -> Result<Self, IngestError> {
        Self::from_csv_reader(text.as_bytes())
    }

    /// Load a CSV file from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("failed to open funding file {}", path.display()))?;
        Self::from_csv_reader(file)
            .with_context(|| format!("failed to read funding file {}", path.display()))
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn record(&self, index: usize) -> Option<&[String]> {
        self.records.get(index).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Project the two selected columns into typed observations, in file order.
    pub fn observations(&self, selection: &ColumnSelection) -> Vec<FundingObservation> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, r)| FundingObservation {
                source_row: i,
                timestamp: r.get(selection.timestamp_index).cloned().unwrap_or_default(),
                raw_rate: r.get(selection.rate_index).cloned().unwrap_or_default(),
            })
            .collect()
    }

    /// SHA-256 over header and cells, unit-separator delimited, lowercase hex.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hash_row(&mut hasher, &self.headers);
        for record in &self.records {
            hash_row(&mut hasher, record);
        }
        hex::encode(hasher.finalize())
    }
}

fn hash_row(hasher: &mut Sha256, cells: &[String]) {
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            hasher.update([0x1f]);
        }
        hasher.update(cell.as_bytes());
    }
    hasher.update([0x1e]);
}

// =============================================================================
// Column selection
// =============================================================================

/// Resolved timestamp / funding-rate columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSelection {
    pub timestamp_column: String,
    pub rate_column: String,
    #[serde(skip)]
    timestamp_index: usize,
    #[serde(skip)]
    rate_index: usize,
}

impl ColumnSelection {
    /// Resolve caller-chosen column names against `headers`.  A `None` choice
    /// is auto-detected from the header names.
    pub fn resolve(
        headers: &[String],
        timestamp: Option<&str>,
        rate: Option<&str>,
    ) -> Result<Self, IngestError> {
        let timestamp_index = match timestamp {
            Some(name) => find_exact(headers, name)?,
            None => detect_timestamp(headers).ok_or(IngestError::ColumnNotDetected("timestamp"))?,
        };
        let rate_index = match rate {
            Some(name) => find_exact(headers, name)?,
            None => detect_rate(headers, timestamp_index)
                .ok_or(IngestError::ColumnNotDetected("funding rate"))?,
        };

        Ok(Self {
            timestamp_column: headers[timestamp_index].clone(),
            rate_column: headers[rate_index].clone(),
            timestamp_index,
            rate_index,
        })
    }
}

fn find_exact(headers: &[String], name: &str) -> Result<usize, IngestError> {
    let wanted = name.trim();
    headers
        .iter()
        .position(|h| h == wanted)
        .or_else(|| headers.iter().position(|h| h.eq_ignore_ascii_case(wanted)))
        .ok_or_else(|| IngestError::MissingColumn(wanted.to_string()))
}

fn detect_timestamp(headers: &[String]) -> Option<usize> {
    headers.iter().position(|h| {
        let h = h.to_ascii_lowercase();
        h.contains("time") || h.contains("date")
    })
}

fn detect_rate(headers: &[String], timestamp_index: usize) -> Option<usize> {
    let candidate = |needle: &str| {
        headers
            .iter()
            .enumerate()
            .find(|(i, h)| *i != timestamp_index && h.to_ascii_lowercase().contains(needle))
            .map(|(i, _)| i)
    };
    candidate("rate").or_else(|| candidate("funding"))
}
