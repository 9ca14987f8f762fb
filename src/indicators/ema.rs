// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// Recursive smoothing that weights recent APR values more heavily.
//
// Formula:
//   alpha  = 2 / (span + 1)
//   EMA_0  = x_0
//   EMA_t  = x_t * alpha + EMA_{t-1} * (1 - alpha)
//
// Seeding with the first observation (rather than an SMA) means every
// position is defined, so the output lines up index-for-index with the input.
// =============================================================================

/// Compute the EMA series for `values` with the given `span`.
///
/// The returned vector has the same length as `values`.
///
/// # Edge cases
/// - `span == 0` => every position is `None`
/// - empty input => empty vec
/// - A non-finite value ends the series; that position and every later one
///   is `None`, since downstream consumers should not trust a broken series.
pub fn calculate_ema(values: &[f64], span: usize) -> Vec<Option<f64>> {
    if span == 0 {
        return vec![None; values.len()];
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let mut result = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;

    for &value in values {
        let next = match prev {
            None if result.is_empty() => Some(value),
            None => None,
            Some(p) => Some(value * alpha + p * (1.0 - alpha)),
        }
        .filter(|v| v.is_finite());

        result.push(next);
        prev = next;
    }

    result
}
