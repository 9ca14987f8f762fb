// =============================================================================
// Runtime Configuration — defaults for the CLI and HTTP service
// =============================================================================
//
// File-backed defaults for every run option.  Command-line flags and request
// bodies override these; the merged values are validated into a `Config`
// exactly once before any computation starts.
//
// All fields carry `#[serde(default)]` so a partial (or empty) JSON file
// still loads.  Saving uses an atomic tmp + rename.
//
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{Config, DEFAULT_FALLBACK_INTERVAL_HOURS};
use crate::error::ConfigError;
use crate::types::RateFormat;

pub const DEFAULT_CONFIG_PATH: &str = "apr_config.json";
pub const CONFIG_PATH_ENV: &str = "FUNDING_APR_CONFIG";
pub const BIND_ADDR_ENV: &str = "FUNDING_APR_BIND_ADDR";

// =============================================================================
// Serde defaults
// =============================================================================

fn default_exchange() -> String {
    "Other".to_string()
}

fn default_window_days() -> u32 {
    30
}

fn default_fallback_interval_hours() -> f64 {
    DEFAULT_FALLBACK_INTERVAL_HOURS
}

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

// =============================================================================
// RuntimeConfig
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Exchange label for the audit record and export file names.
    #[serde(default = "default_exchange")]
    pub exchange: String,

    /// Trailing APR window in days (1..=90).
    #[serde(default = "default_window_days")]
    pub window_days: u32,

    #[serde(default)]
    pub rate_format: RateFormat,

    /// Confirmed funding interval.  When unset, the interval detected from the
    /// timestamps is used.
    #[serde(default)]
    pub interval_hours: Option<f64>,

    /// Interval used when detection is impossible (fewer than two rows).
    #[serde(default = "default_fallback_interval_hours")]
    pub fallback_interval_hours: f64,

    #[serde(default)]
    pub timestamp_column: Option<String>,

    #[serde(default)]
    pub rate_column: Option<String>,

    /// Listen address for `serve`.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            exchange: default_exchange(),
            window_days: default_window_days(),
            rate_format: RateFormat::default(),
            interval_hours: None,
            fallback_interval_hours: default_fallback_interval_hours(),
            timestamp_column: None,
            rate_column: None,
            bind_addr: default_bind_addr(),
        }
    }
}

impl RuntimeConfig {
    /// Read defaults from the JSON file at `path`.  A missing or malformed
    /// file is an error; callers decide whether to fall back.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read APR config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse APR config from {}", path.display()))?;

        info!(
            path = %path.display(),
            exchange = %config.exchange,
            window_days = config.window_days,
            rate_format = %config.rate_format,
            "APR config loaded"
        );

        Ok(config)
    }

    /// Write pretty JSON to `path` via a sibling `.json.tmp` and a rename.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise APR config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to move config into place at {}", path.display()))?;

        info!(path = %path.display(), "APR config saved (atomic)");
        Ok(())
    }

    /// Apply environment overrides (`FUNDING_APR_BIND_ADDR`).
    pub fn apply_env(&mut self) {
        if let Ok(addr) = std::env::var(BIND_ADDR_ENV) {
            let addr = addr.trim();
            if !addr.is_empty() {
                self.bind_addr = addr.to_string();
            }
        }
    }

    /// Validate into a run `Config`, using `detected_hours` when no interval
    /// has been confirmed.
    pub fn to_config(&self, detected_hours: f64) -> Result<Config, ConfigError> {
        let interval = self.interval_hours.unwrap_or(detected_hours);
        Ok(Config::new(interval, self.window_days, self.rate_format)?.with_exchange(&self.exchange))
    }
}

/// Config file path from `FUNDING_APR_CONFIG`, else `apr_config.json`.
pub fn config_path_from_env() -> String {
    std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.exchange, "Other");
        assert_eq!(cfg.window_days, 30);
        assert_eq!(cfg.rate_format, RateFormat::Decimal);
        assert_eq!(cfg.interval_hours, None);
        assert!((cfg.fallback_interval_hours - 4.0).abs() < f64::EPSILON);
        assert_eq!(cfg.bind_addr, "0.0.0.0:3001");
    }

    #[test]
    fn empty_object_is_all_defaults() {
        let cfg: RuntimeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, RuntimeConfig::default());
    }

    #[test]
    fn partial_object_keeps_remaining_defaults() {
        let json = r#"{ "exchange": "WOOX", "rate_format": "percent", "interval_hours": 8 }"#;
        let cfg: RuntimeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.exchange, "WOOX");
        assert_eq!(cfg.rate_format, RateFormat::Percent);
        assert_eq!(cfg.interval_hours, Some(8.0));
        assert_eq!(cfg.window_days, 30);
    }

    #[test]
    fn confirmed_interval_beats_detected() {
        let mut cfg = RuntimeConfig::default();
        assert_eq!(cfg.to_config(8.0).unwrap().interval_hours(), 8.0);
        cfg.interval_hours = Some(1.0);
        assert_eq!(cfg.to_config(8.0).unwrap().interval_hours(), 1.0);
    }

    #[test]
    fn invalid_values_rejected_at_boundary() {
        let cfg = RuntimeConfig {
            window_days: 120,
            ..RuntimeConfig::default()
        };
        assert_eq!(cfg.to_config(8.0), Err(ConfigError::WindowOutOfRange(120)));

        let cfg = RuntimeConfig {
            interval_hours: Some(0.0),
            ..RuntimeConfig::default()
        };
        assert!(cfg.to_config(8.0).is_err());
    }

    #[test]
    fn save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apr_config.json");
        let cfg = RuntimeConfig {
            exchange: "Hyperliquid".to_string(),
            interval_hours: Some(1.0),
            ..RuntimeConfig::default()
        };
        cfg.save(&path).unwrap();
        assert!(!path.with_extension("json.tmp").exists());
        assert_eq!(RuntimeConfig::load(&path).unwrap(), cfg);
    }

    #[test]
    fn load_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(RuntimeConfig::load(dir.path().join("nope.json")).is_err());
    }
}
