//! Statistical primitives shared by the extractor and the aggregator.

use crate::error::SummaryError;

/// Compute the p-th percentile (`p` in [0, 1]) of `values` via linear rank
/// interpolation.
///
/// The algorithm replicates the reference tool exactly and its numeric
/// behavior must be preserved bit-for-bit: rank `k = (n - 1) * p`, and for a
/// fractional rank the result is `s[f] * (c - k) + s[c] * (k - f)` with
/// `f = floor(k)`, `c = ceil(k)`.
///
/// The same primitive is applied at two granularities: interpolating a
/// percentile from per-direction bucket figures within one job, and combining
/// several already-bucketed percentile figures for the same key into one
/// cross-sample percentile. The second application treats percentiles
/// themselves as samples; it approximates the true global percentile without
/// retaining every raw latency sample and is deliberately approximate.
pub fn percentile(values: &[f64], p: f64) -> Result<f64, SummaryError> {
    if values.is_empty() {
        return Err(SummaryError::EmptyInput);
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("latency samples are finite"));

    let k = (sorted.len() - 1) as f64 * p;
    let f = k.floor();
    let c = k.ceil();
    if f == c {
        return Ok(sorted[k as usize]);
    }
    Ok(sorted[f as usize] * (c - k) + sorted[c as usize] * (k - f))
}

/// IOPS-weighted average: `Σ(value_i * weight_i) / Σ(weight_i)`.
///
/// Returns `None` when the total weight is zero; callers resolve that case
/// through the zero-weight fallback policy instead of dividing by zero.
pub fn weighted_average(values: &[f64], weights: &[f64]) -> Option<f64> {
    debug_assert_eq!(values.len(), weights.len());

    let total: f64 = weights.iter().sum();
    if total == 0.0 {
        return None;
    }
    let weighted: f64 = values.iter().zip(weights).map(|(v, w)| v * w).sum();
    Some(weighted / total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_extremes_hit_min_and_max() {
        let values = [7.0, 3.0, 9.5, 1.2, 4.4];
        assert_eq!(percentile(&values, 0.0).unwrap(), 1.2);
        assert_eq!(percentile(&values, 1.0).unwrap(), 9.5);
    }

    #[test]
    fn test_percentile_interpolates_between_ranks() {
        // k = 1.5, f = 1, c = 2 -> 20 * 0.5 + 30 * 0.5
        assert_eq!(percentile(&[10.0, 20.0, 30.0, 40.0], 0.5).unwrap(), 25.0);
    }

    #[test]
    fn test_percentile_exact_rank_hit() {
        assert_eq!(percentile(&[10.0, 20.0, 30.0], 0.5).unwrap(), 20.0);
    }

    #[test]
    fn test_percentile_single_sample() {
        assert_eq!(percentile(&[42.0], 0.99).unwrap(), 42.0);
    }

    #[test]
    fn test_percentile_empty_input_fails() {
        assert!(matches!(percentile(&[], 0.5), Err(SummaryError::EmptyInput)));
    }

    #[test]
    fn test_weighted_average_basic() {
        // (1.0 * 100 + 3.0 * 300) / 400
        let avg = weighted_average(&[1.0, 3.0], &[100.0, 300.0]).unwrap();
        assert_eq!(avg, 2.5);
    }

    #[test]
    fn test_weighted_average_single_nonzero_weight() {
        let avg = weighted_average(&[5.0, 9.0, 2.0], &[0.0, 40.0, 0.0]).unwrap();
        assert_eq!(avg, 9.0);
    }

    #[test]
    fn test_weighted_average_all_zero_weights() {
        assert!(weighted_average(&[5.0, 9.0], &[0.0, 0.0]).is_none());
    }
}
