// =============================================================================
// Rate Normalizer — raw funding-rate tokens to decimal fractions
// =============================================================================
//
// Accepted tokens: a plain number or a number carrying `%` signs, with any
// surrounding whitespace.  Percent-format values are divided by 100:
//   percent  "0.01%" -> 0.01   -> 0.0001
//   decimal  "0.0001"          -> 0.0001
//
// Tokens that do not parse to a finite number are dropped and counted.

use tracing::{debug, warn};

use crate::types::{FundingObservation, RateFormat, RateRow};

/// Output of the normalizer: surviving rows in input order plus a drop count.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRates {
    pub rows: Vec<RateRow>,
    pub dropped: usize,
}

/// Parse a single rate token into its decimal-fraction value.
///
/// Returns `None` for empty, non-numeric or non-finite tokens.
pub fn parse_rate(raw: &str, format: RateFormat) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|&c| c != '%').collect();
    let value: f64 = cleaned.trim().parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(match format {
        RateFormat::Decimal => value,
        RateFormat::Percent => value / 100.0,
    })
}

pub fn normalize_rates(observations: &[FundingObservation], format: RateFormat) -> NormalizedRates {
    let mut rows = Vec::with_capacity(observations.len());
    let mut dropped = 0usize;

    for obs in observations {
        match parse_rate(&obs.raw_rate, format) {
            Some(rate_decimal) => rows.push(RateRow {
                source_row: obs.source_row,
                timestamp: obs.timestamp.clone(),
                rate_decimal,
            }),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        warn!(dropped, kept = rows.len(), %format, "dropped rows with unparseable funding rate");
    } else {
        debug!(kept = rows.len(), %format, "funding rates normalized");
    }

    NormalizedRates { rows, dropped }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(i: usize, rate: &str) -> FundingObservation {
        FundingObservation {
            source_row: i,
            timestamp: format!("2024-01-01 0{i}:00:00"),
            raw_rate: rate.to_string(),
        }
    }

    #[test]
    fn percent_string_becomes_decimal() {
        let v = parse_rate("0.01%", RateFormat::Percent).unwrap();
        assert!((v - 0.0001).abs() < 1e-15);
    }

    #[test]
    fn decimal_value_is_unchanged() {
        assert_eq!(parse_rate("0.0001", RateFormat::Decimal), Some(0.0001));
    }

    #[test]
    fn percent_sign_in_decimal_mode_is_only_stripped() {
        // The format flag decides scaling, not the presence of `%`.
        assert_eq!(parse_rate("0.0001%", RateFormat::Decimal), Some(0.0001));
    }

    #[test]
    fn whitespace_and_negative_values() {
        assert_eq!(parse_rate("  -0.0025 % ", RateFormat::Decimal), Some(-0.0025));
        let v = parse_rate(" -0.25% ", RateFormat::Percent).unwrap();
        assert!((v + 0.0025).abs() < 1e-15);
    }

    #[test]
    fn garbage_and_non_finite_tokens_fail() {
        for token in ["", "%", "abc", "0.01x", "NaN", "inf", "-inf"] {
            assert_eq!(parse_rate(token, RateFormat::Decimal), None, "token {token:?}");
        }
    }

    #[test]
    fn bad_rows_are_dropped_not_zeroed() {
        let input = vec![obs(0, "0.0001"), obs(1, "n/a"), obs(2, "0.0003"), obs(3, "")];
        let out = normalize_rates(&input, RateFormat::Decimal);
        assert_eq!(out.dropped, 2);
        assert_eq!(out.rows.len(), 2);
        assert_eq!(out.rows[0].source_row, 0);
        assert_eq!(out.rows[1].source_row, 2);
        assert!(out.rows.iter().all(|r| r.rate_decimal != 0.0));
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let out = normalize_rates(&[], RateFormat::Percent);
        assert!(out.rows.is_empty());
        assert_eq!(out.dropped, 0);
    }
}
