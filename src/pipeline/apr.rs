// =============================================================================
// APR Calculator — per-row and whole-window annualization
// =============================================================================
//
//   annual_factor = 8760 / interval_hours
//   funding_pct   = rate * 100
//   apr_pct       = rate * annual_factor * 100
//
// Whole-window aggregates:
//   compounding ("website-style")  ((prod(1 + rate))^(365 / window_days) - 1) * 100
//   legacy average                 mean(apr_pct)
//
// Both aggregates are `None` on an empty window, so "no funding activity" is
// never reported as a 0% rate.

use serde::Serialize;

use crate::types::NormalizedObservation;

pub const HOURS_PER_YEAR: f64 = 365.0 * 24.0;
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Per-row annualized values, aligned with the input rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RowApr {
    pub funding_pct: f64,
    pub apr_pct: f64,
}

/// The two competing whole-window estimates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowApr {
    pub compounding: Option<f64>,
    pub average: Option<f64>,
}

pub fn annual_factor(interval_hours: f64) -> f64 {
    HOURS_PER_YEAR / interval_hours
}

pub fn row_apr(rate_decimal: f64, interval_hours: f64) -> RowApr {
    RowApr {
        funding_pct: rate_decimal * 100.0,
        apr_pct: rate_decimal * annual_factor(interval_hours) * 100.0,
    }
}

pub fn row_aprs(rows: &[NormalizedObservation], interval_hours: f64) -> Vec<RowApr> {
    rows.iter().map(|r| row_apr(r.rate_decimal, interval_hours)).collect()
}

/// Compounded return over the window, annualized by `365 / window_days`.
///
/// `None` for an empty series, a non-positive window, or a non-finite result
/// (a rate at or below -100% makes the growth factor non-positive).
pub fn compounding_apr(rates: &[f64], window_days: f64) -> Option<f64> {
    if rates.is_empty() || !(window_days > 0.0) {
        return None;
    }
    let growth: f64 = rates.iter().map(|r| 1.0 + r).product();
    if !(growth > 0.0) {
        return None;
    }
    let apr = (growth.powf(DAYS_PER_YEAR / window_days) - 1.0) * 100.0;
    apr.is_finite().then_some(apr)
}

/// Arithmetic mean of independently annualized per-row APRs.
pub fn average_apr(aprs: &[f64]) -> Option<f64> {
    if aprs.is_empty() {
        return None;
    }
    let mean = aprs.iter().sum::<f64>() / aprs.len() as f64;
    mean.is_finite().then_some(mean)
}

pub fn window_apr(rows: &[NormalizedObservation], per_row: &[RowApr], window_days: u32) -> WindowApr {
    let rates: Vec<f64> = rows.iter().map(|r| r.rate_decimal).collect();
    let aprs: Vec<f64> = per_row.iter().map(|r| r.apr_pct).collect();
    WindowApr {
        compounding: compounding_apr(&rates, f64::from(window_days)),
        average: average_apr(&aprs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn per_row_apr_at_four_hours() {
        let r = row_apr(0.0001, 4.0);
        assert!(close(r.apr_pct, 21.9, 1e-9), "got {}", r.apr_pct);
        assert!(close(r.funding_pct, 0.01, 1e-12));
        assert!(close(annual_factor(4.0), 2190.0, 1e-12));
    }

    #[test]
    fn three_sample_scenario() {
        let rates = [0.0001, 0.0001, 0.0001];
        let aprs: Vec<f64> = rates.iter().map(|&r| row_apr(r, 4.0).apr_pct).collect();

        let legacy = average_apr(&aprs).unwrap();
        assert!(close(legacy, 21.9, 1e-9));

        // Half-day window: (1.0001^3)^730 - 1, which compounds above the linear figure.
        let compounding = compounding_apr(&rates, 0.5).unwrap();
        assert!(compounding > legacy, "{compounding} <= {legacy}");
        let expected = (1.0001_f64.powi(2190) - 1.0) * 100.0;
        assert!(close(compounding, expected, 1e-8));
    }

    #[test]
    fn constant_rate_methods_converge() {
        let r = 1e-7;
        for (n, h) in [(6usize, 4.0), (3, 8.0), (24, 1.0), (270, 8.0)] {
            let rates = vec![r; n];
            let window_days = n as f64 * h / 24.0;
            let linear = r * HOURS_PER_YEAR / h * 100.0;

            let aprs: Vec<f64> = rates.iter().map(|&x| row_apr(x, h).apr_pct).collect();
            let legacy = average_apr(&aprs).unwrap();
            let compounding = compounding_apr(&rates, window_days).unwrap();

            assert!(close(legacy, linear, linear * 1e-9));
            assert!(close(compounding, linear, linear * 1e-3), "n={n} h={h}: {compounding} vs {linear}");
        }
    }

    #[test]
    fn empty_window_is_undefined_not_zero() {
        assert_eq!(compounding_apr(&[], 30.0), None);
        assert_eq!(average_apr(&[]), None);
        let w = window_apr(&[], &[], 30);
        assert_eq!(w, WindowApr { compounding: None, average: None });
    }

    #[test]
    fn zero_rates_are_zero_not_undefined() {
        assert_eq!(compounding_apr(&[0.0, 0.0], 1.0), Some(0.0));
        assert_eq!(average_apr(&[0.0, 0.0]), Some(0.0));
    }

    #[test]
    fn wiped_out_growth_is_undefined() {
        assert_eq!(compounding_apr(&[0.001, -1.0], 1.0), None);
        assert_eq!(compounding_apr(&[-1.5, 0.001], 1.0), None);
    }

    #[test]
    fn negative_rates_give_negative_apr() {
        let c = compounding_apr(&[-0.0001; 6], 1.0).unwrap();
        assert!(c < 0.0 && c > -100.0);
        assert!(row_apr(-0.0001, 8.0).apr_pct < 0.0);
    }
}
