// =============================================================================
// Boundary errors
// =============================================================================
//
// Only configuration and ingestion problems are hard failures.  Per-row parse
// problems never surface here; the pipeline drops and counts those rows.

use thiserror::Error;

/// Configuration rejected before it reaches the pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Interval must be a positive, finite number of hours.
    #[error("invalid funding interval: {0} hours (must be > 0)")]
    InvalidInterval(f64),

    /// Trailing window must be between 1 and 90 days.
    #[error("window of {0} days is out of range (1..=90)")]
    WindowOutOfRange(u32),
}

/// Failure to turn an uploaded file into a typed table.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// The file has no header row.
    #[error("input has no header row")]
    EmptyHeader,

    /// A caller-selected column is not present in the header.
    #[error("column '{0}' not found in input header")]
    MissingColumn(String),

    /// No column was selected and none could be guessed from the header.
    #[error("could not detect a {0} column; select one explicitly")]
    ColumnNotDetected(&'static str),
}
