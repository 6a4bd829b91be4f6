//! Confidence scoring from predictor agreement.

use tariffcast_core::ConfidenceSettings;

/// Below this magnitude the reference scale is treated as zero.
const SCALE_EPSILON: f64 = 1e-9;

/// Turns success ratio and dispersion into a 0-100 score.
///
/// The score rises with the share of predictors that succeeded and falls
/// with the coefficient of variation of their outputs. Both directions are
/// monotonic, and the result always lies within the configured floor and
/// ceiling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfidenceEstimator {
    settings: ConfidenceSettings,
}

impl ConfidenceEstimator {
    /// Creates an estimator with the given coefficients.
    #[must_use]
    pub const fn new(settings: ConfidenceSettings) -> Self {
        Self { settings }
    }

    /// Configured coefficients.
    #[must_use]
    pub const fn settings(&self) -> &ConfidenceSettings {
        &self.settings
    }

    /// Scores an estimate.
    ///
    /// `success_ratio` is clamped to 0-1. `values_spread` is the standard
    /// deviation of the contributing values and `reference_scale` their
    /// mean; a reference scale near zero disables the dispersion term.
    #[must_use]
    pub fn estimate(&self, success_ratio: f64, values_spread: f64, reference_scale: f64) -> u8 {
        let ratio = if success_ratio.is_nan() { 0.0 } else { success_ratio.clamp(0.0, 1.0) };
        let cv = if reference_scale.abs() < SCALE_EPSILON || !values_spread.is_finite() {
            0.0
        } else {
            values_spread.abs() / reference_scale.abs()
        };

        let ConfidenceSettings { base, success_weight, dispersion_penalty, floor, ceiling } = self.settings;
        let score = (base + success_weight * ratio - dispersion_penalty * cv).max(floor).min(ceiling);
        score.round() as u8
    }
}
