// =============================================================================
// Run Configuration — validated once at the boundary
// =============================================================================
//
// The pipeline assumes every `Config` it receives is valid.  The only way to
// build one is `Config::new`, which enforces:
//   interval_hours  finite and > 0
//   window_days     in 1..=90

use serde::Serialize;

use crate::error::ConfigError;
use crate::types::RateFormat;

pub const MIN_WINDOW_DAYS: u32 = 1;
pub const MAX_WINDOW_DAYS: u32 = 90;

/// Interval used when the timestamp cadence cannot be measured.
pub const DEFAULT_FALLBACK_INTERVAL_HOURS: f64 = 4.0;

/// Immutable per-run settings consumed by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    interval_hours: f64,
    window_days: u32,
    rate_format: RateFormat,
    exchange: String,
}

impl Config {
    pub fn new(
        interval_hours: f64,
        window_days: u32,
        rate_format: RateFormat,
    ) -> Result<Self, ConfigError> {
        if !interval_hours.is_finite() || interval_hours <= 0.0 {
            return Err(ConfigError::InvalidInterval(interval_hours));
        }
        if !(MIN_WINDOW_DAYS..=MAX_WINDOW_DAYS).contains(&window_days) {
            return Err(ConfigError::WindowOutOfRange(window_days));
        }
        Ok(Self {
            interval_hours,
            window_days,
            rate_format,
            exchange: "Other".to_string(),
        })
    }

    /// Attach the exchange label carried into the audit record.
    pub fn with_exchange(mut self, exchange: impl Into<String>) -> Self {
        let exchange = exchange.into();
        let trimmed = exchange.trim();
        if !trimmed.is_empty() {
            self.exchange = trimmed.to_string();
        }
        self
    }

    pub fn interval_hours(&self) -> f64 {
        self.interval_hours
    }

    pub fn window_days(&self) -> u32 {
        self.window_days
    }

    pub fn rate_format(&self) -> RateFormat {
        self.rate_format
    }

    pub fn exchange(&self) -> &str {
        &self.exchange
    }
}
