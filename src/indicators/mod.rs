// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free indicators over the per-row APR series.  Every
// series is returned aligned index-for-index with its input, with `None` at
// positions that lack enough history, so callers can never mistake "not yet
// defined" for a zero reading.

pub mod ema;
pub mod rsi;

use serde::Serialize;

pub const EMA_FAST_SPAN: usize = 10;
pub const EMA_SLOW_SPAN: usize = 30;
pub const RSI_PERIOD: usize = 14;

/// EMA(10), EMA(30) and RSI(14) columns for one APR series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorColumns {
    pub ema10: Vec<Option<f64>>,
    pub ema30: Vec<Option<f64>>,
    pub rsi14: Vec<Option<f64>>,
}

/// Compute all indicator columns over a chronologically sorted APR series.
pub fn compute_indicators(apr_pct: &[f64]) -> IndicatorColumns {
    IndicatorColumns {
        ema10: ema::calculate_ema(apr_pct, EMA_FAST_SPAN),
        ema30: ema::calculate_ema(apr_pct, EMA_SLOW_SPAN),
        rsi14: rsi::calculate_rsi(apr_pct, RSI_PERIOD),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_align_with_input() {
        let apr: Vec<f64> = (0..40).map(|i| 20.0 + (i % 7) as f64).collect();
        let cols = compute_indicators(&apr);
        assert_eq!(cols.ema10.len(), 40);
        assert_eq!(cols.ema30.len(), 40);
        assert_eq!(cols.rsi14.len(), 40);
        assert!(cols.ema10.iter().all(Option::is_some));
        assert_eq!(cols.rsi14.iter().filter(|v| v.is_none()).count(), RSI_PERIOD);
    }

    #[test]
    fn empty_series_yields_empty_columns() {
        let cols = compute_indicators(&[]);
        assert!(cols.ema10.is_empty() && cols.ema30.is_empty() && cols.rsi14.is_empty());
    }
}
