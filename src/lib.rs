// =============================================================================
// Funding APR — annualized rates from perpetual-futures funding history
// =============================================================================
//
// Turns one uploaded table of timestamped funding-rate samples into:
//   - a chronologically sorted, windowed series with per-row APR,
//     EMA(10), EMA(30) and RSI(14),
//   - two competing whole-window APR estimates (compounding and average),
//   - a flat logic-audit record for reproducible exports.
//
// The computation core (`pipeline`, `indicators`, `classify`) is synchronous
// and pure.  `table` and `config` form the validated boundary in front of it;
// `export`, `api` and the binary are thin collaborators around it.

pub mod api;
pub mod classify;
pub mod config;
pub mod error;
pub mod export;
pub mod indicators;
pub mod pipeline;
pub mod runtime_config;
pub mod table;
pub mod types;

pub use config::Config;
pub use error::{ConfigError, IngestError};
pub use pipeline::{run, suggest_interval, AprReport, LogicAuditRecord, SummaryMetrics};
pub use table::{ColumnSelection, FundingTable};
pub use types::{EnrichedRow, RateFormat};
