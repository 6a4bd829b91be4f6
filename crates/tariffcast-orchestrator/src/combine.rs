//! Deterministic combination of successful predictor values.

use std::cmp::Ordering;

/// Mean and population standard deviation of a set of values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dispersion {
    /// Arithmetic mean.
    pub mean: f64,
    /// Population standard deviation.
    pub spread: f64,
}

impl Dispersion {
    /// Computes the dispersion of `values`, or `None` when empty.
    #[must_use]
    pub fn of(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
        Some(Self { mean, spread: variance.sqrt() })
    }
}

/// Orders `(source, value)` pairs by source name, then value.
///
/// Summing in this order makes the combined value independent of the order
/// in which predictors finished.
pub fn sort_by_source(values: &mut [(String, f64)]) {
    values.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal)));
}

/// Weighted mean of `values`, which must already be sorted by source.
///
/// `weight_of` gives each source's weight; negative weights count as zero.
/// If the weights of the surviving sources sum to zero, equal weights are
/// used instead. Returns `None` for an empty slice.
#[must_use]
pub fn weighted_mean(values: &[(String, f64)], weight_of: impl Fn(&str) -> f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    for (source, value) in values {
        let weight = weight_of(source).max(0.0);
        weighted_sum += weight * value;
        weight_total += weight;
    }

    if weight_total > 0.0 && weight_total.is_finite() {
        Some(weighted_sum / weight_total)
    } else {
        let sum: f64 = values.iter().map(|(_, value)| value).sum();
        Some(sum / values.len() as f64)
    }
}
