// =============================================================================
// Relative Strength Index (RSI) — rolling-mean form
// =============================================================================
//
// RSI measures the balance of recent up-moves vs. down-moves in the APR
// series.
//
//   d_t    = x_t - x_{t-1}
//   gain_t = max(d_t, 0),  loss_t = max(-d_t, 0)
//   RS     = mean(gain, last `period`) / mean(loss, last `period`)
//   RSI    = 100 - 100 / (1 + RS)
//
// Output is aligned with the input: position t is defined once `period`
// deltas are available, i.e. from index `period` onward.
//
// Thresholds:  RSI >= 70 => OVERBOUGHT,  RSI <= 30 => OVERSOLD.
// =============================================================================

/// Compute the RSI series for `values` over `period` steps.
///
/// The returned vector has the same length as `values`.
///
/// # Edge cases
/// - `period == 0` => every position is `None`
/// - positions `0..period` => `None` (insufficient history)
/// - If average loss is zero, RSI saturates to 100.0 (or 50.0 when average
///   gain is zero too).
/// - A non-finite delta ends the series; later positions are `None`.
pub fn calculate_rsi(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; values.len()];
    if period == 0 || values.len() <= period {
        return result;
    }

    // --- Gains / losses per delta; index i holds the move into values[i + 1].
    let moves: Vec<(f64, f64)> = values
        .windows(2)
        .map(|w| {
            let delta = w[1] - w[0];
            if !delta.is_finite() {
                // `f64::max` would silently swallow NaN.
                return (f64::NAN, f64::NAN);
            }
            (delta.max(0.0), (-delta).max(0.0))
        })
        .collect();

    let period_f = period as f64;
    for end in period..values.len() {
        let window = &moves[end - period..end];
        let (sum_gain, sum_loss) = window
            .iter()
            .fold((0.0_f64, 0.0_f64), |(g, l), &(gain, loss)| (g + gain, l + loss));

        match rsi_from_averages(sum_gain / period_f, sum_loss / period_f) {
            Some(rsi) => result[end] = Some(rsi),
            None => break,
        }
    }

    result
}

/// The latest defined RSI value together with a human-readable label.
pub fn current_rsi(series: &[Option<f64>]) -> Option<(f64, &'static str)> {
    let value = series.iter().rev().find_map(|v| *v)?;

    let label = if value >= 70.0 {
        "OVERBOUGHT"
    } else if value <= 30.0 {
        "OVERSOLD"
    } else {
        "NEUTRAL"
    };

    Some((value, label))
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Convert average gain / average loss into an RSI value in [0, 100].
///
/// - If both averages are zero, RSI is 50.0 (no movement).
/// - If average loss is zero (only gains), RSI is 100.0.
/// - Returns `None` when the result is non-finite.
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if !avg_gain.is_finite() || !avg_loss.is_finite() {
        return None;
    }

    let rsi = if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    };

    if rsi.is_finite() {
        Some(rsi.clamp(0.0, 100.0))
    } else {
        None
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Vec<f64> {
        (1..=n).map(|x| x as f64).collect()
    }

    #[test]
    fn rsi_empty_input() {
        assert!(calculate_rsi(&[], 14).is_empty());
    }

    #[test]
    fn rsi_period_zero() {
        assert_eq!(calculate_rsi(&[1.0, 2.0, 3.0], 0), vec![None; 3]);
    }

    #[test]
    fn rsi_too_short_is_all_none() {
        // 14 values => 13 deltas < 14.
        let series = calculate_rsi(&ramp(14), 14);
        assert_eq!(series.len(), 14);
        assert!(series.iter().all(Option::is_none));
    }

    #[test]
    fn rsi_leading_positions_undefined() {
        let series = calculate_rsi(&ramp(20), 14);
        assert!(series[..14].iter().all(Option::is_none));
        assert!(series[14..].iter().all(Option::is_some));
    }

    #[test]
    fn rsi_all_gains() {
        let series = calculate_rsi(&ramp(30), 14);
        for v in series.iter().flatten() {
            assert!((v - 100.0).abs() < 1e-10, "expected 100.0, got {v}");
        }
    }

    #[test]
    fn rsi_all_losses() {
        let values: Vec<f64> = ramp(30).into_iter().rev().collect();
        for v in calculate_rsi(&values, 14).iter().flatten() {
            assert!(v.abs() < 1e-10, "expected 0.0, got {v}");
        }
    }

    #[test]
    fn rsi_flat_series() {
        let series = calculate_rsi(&[21.9; 30], 14);
        for v in series.iter().flatten() {
            assert!((v - 50.0).abs() < 1e-10, "expected 50.0, got {v}");
        }
    }

    #[test]
    fn rsi_known_value() {
        // Two gains of 2 and two losses of 1 over a 4-step window:
        // avg_gain = 1.0, avg_loss = 0.5, RS = 2, RSI = 66.67
        let series = calculate_rsi(&[10.0, 12.0, 11.0, 13.0, 12.0], 4);
        let v = series[4].unwrap();
        assert!((v - 200.0 / 3.0).abs() < 1e-10, "got {v}");
    }

    #[test]
    fn rsi_uses_rolling_not_cumulative_window() {
        // Early losses fall out of the 3-step window; only gains remain.
        let series = calculate_rsi(&[10.0, 5.0, 6.0, 7.0, 8.0], 3);
        assert!(series[3].unwrap() < 100.0);
        assert!((series[4].unwrap() - 100.0).abs() < 1e-10);
    }

    #[test]
    fn rsi_range_check() {
        let values = vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08, 45.89, 46.03,
            44.18, 44.22, 44.57, 43.42, 42.66, 43.13, -120.0, 300.0, 0.0, 1e6, -1e6,
        ];
        for v in calculate_rsi(&values, 14).iter().flatten() {
            assert!((0.0..=100.0).contains(v), "RSI {v} out of range");
        }
    }

    #[test]
    fn rsi_stops_after_non_finite() {
        let mut values = ramp(20);
        values[16] = f64::NAN;
        let series = calculate_rsi(&values, 14);
        assert!(series[14].is_some());
        assert!(series[16..].iter().all(Option::is_none));
    }

    #[test]
    fn current_rsi_labels() {
        let (val, label) = current_rsi(&calculate_rsi(&ramp(30), 14)).unwrap();
        assert!((val - 100.0).abs() < 1e-10);
        assert_eq!(label, "OVERBOUGHT");

        let down: Vec<f64> = ramp(30).into_iter().rev().collect();
        assert_eq!(current_rsi(&calculate_rsi(&down, 14)).unwrap().1, "OVERSOLD");
        assert_eq!(current_rsi(&calculate_rsi(&[5.0; 30], 14)).unwrap().1, "NEUTRAL");
        assert!(current_rsi(&[None, None]).is_none());
    }
}
