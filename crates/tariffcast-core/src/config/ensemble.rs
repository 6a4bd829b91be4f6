//! Ensemble, confidence and fallback tuning.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// How the ensemble waits for, combines and bounds predictor outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleSettings {
    /// Overall deadline for one ensemble call, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Lower end of the plausible prediction range.
    #[serde(default)]
    pub min_units: f64,

    /// Upper end of the plausible prediction range.
    #[serde(default = "default_max_units")]
    pub max_units: f64,

    /// Fewest successful predictors needed to skip the fallback.
    #[serde(default = "default_min_successes")]
    pub min_successes: usize,

    /// Highest confidence a fallback estimate can report.
    #[serde(default = "default_fallback_ceiling")]
    pub fallback_ceiling: u8,

    /// Weight of a source missing from `weights`.
    #[serde(default = "default_weight")]
    pub default_weight: f64,

    /// Per-source combination weights.
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
}

impl Default for EnsembleSettings {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            min_units: 0.0,
            max_units: default_max_units(),
            min_successes: default_min_successes(),
            fallback_ceiling: default_fallback_ceiling(),
            default_weight: default_weight(),
            weights: BTreeMap::new(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    2000
}

fn default_max_units() -> f64 {
    5000.0
}

fn default_min_successes() -> usize {
    1
}

fn default_fallback_ceiling() -> u8 {
    50
}

fn default_weight() -> f64 {
    1.0
}

impl EnsembleSettings {
    /// Overall deadline as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Configured weight of `source`, or `default_weight`.
    #[must_use]
    pub fn weight_for(&self, source: &str) -> f64 {
        self.weight_in(&self.weights, source)
    }

    /// Weight of `source` in `weights`, or `default_weight` when the map
    /// does not name it.
    #[must_use]
    pub fn weight_in(&self, weights: &BTreeMap<String, f64>, source: &str) -> f64 {
        weights.get(source).copied().unwrap_or(self.default_weight)
    }

    /// Checks ranges and weights.
    ///
    /// # Errors
    /// Returns `ConfigError::Validation` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::Validation("ensemble.timeout_ms must be greater than 0".to_string()));
        }
        if !self.min_units.is_finite() || !self.max_units.is_finite() || self.min_units < 0.0 {
            return Err(ConfigError::Validation(format!(
                "ensemble range must be finite and non-negative, got [{}, {}]",
                self.min_units, self.max_units
            )));
        }
        if self.min_units > self.max_units {
            return Err(ConfigError::Validation(format!(
                "ensemble.min_units ({}) must not exceed max_units ({})",
                self.min_units, self.max_units
            )));
        }
        if self.min_successes == 0 {
            return Err(ConfigError::Validation("ensemble.min_successes must be at least 1".to_string()));
        }
        if self.fallback_ceiling > 100 {
            return Err(ConfigError::Validation(format!(
                "ensemble.fallback_ceiling must be between 0 and 100, got {}",
                self.fallback_ceiling
            )));
        }
        check_weight("ensemble.default_weight", self.default_weight)?;
        for (source, &weight) in &self.weights {
            check_weight(&format!("ensemble.weights.{source}"), weight)?;
        }
        Ok(())
    }
}

fn check_weight(key: &str, weight: f64) -> Result<()> {
    if weight.is_finite() && weight >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!("{key} must be a finite, non-negative weight, got {weight}")))
    }
}

/// Coefficients of the confidence score.
///
/// `score = base + success_weight * success_ratio - dispersion_penalty * cv`,
/// clamped to `[floor, ceiling]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceSettings {
    /// Score before success and dispersion terms.
    #[serde(default = "default_base")]
    pub base: f64,

    /// Points added per unit of success ratio.
    #[serde(default = "default_success_weight")]
    pub success_weight: f64,

    /// Points removed per unit of coefficient of variation.
    #[serde(default = "default_dispersion_penalty")]
    pub dispersion_penalty: f64,

    /// Lowest reportable score.
    #[serde(default)]
    pub floor: f64,

    /// Highest reportable score.
    #[serde(default = "default_ceiling")]
    pub ceiling: f64,
}

impl Default for ConfidenceSettings {
    fn default() -> Self {
        Self {
            base: default_base(),
            success_weight: default_success_weight(),
            dispersion_penalty: default_dispersion_penalty(),
            floor: 0.0,
            ceiling: default_ceiling(),
        }
    }
}

fn default_base() -> f64 {
    40.0
}

fn default_success_weight() -> f64 {
    55.0
}

fn default_dispersion_penalty() -> f64 {
    100.0
}

fn default_ceiling() -> f64 {
    95.0
}

impl ConfidenceSettings {
    /// Checks that coefficients are non-negative and the bounds lie in 0-100.
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("confidence.base", self.base),
            ("confidence.success_weight", self.success_weight),
            ("confidence.dispersion_penalty", self.dispersion_penalty),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Validation(format!("{key} must be finite and non-negative, got {value}")));
            }
        }
        let in_range = |v: f64| (0.0..=100.0).contains(&v);
        if !in_range(self.floor) || !in_range(self.ceiling) || self.floor > self.ceiling {
            return Err(ConfigError::Validation(format!(
                "confidence bounds must satisfy 0 <= floor <= ceiling <= 100, got floor {} and ceiling {}",
                self.floor, self.ceiling
            )));
        }
        Ok(())
    }
}

/// Trend heuristic used when every predictor fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackSettings {
    /// Number of most recent readings the trend is fitted over.
    #[serde(default = "default_window")]
    pub window: usize,

    /// Estimate used when there is no history and no appliance data.
    #[serde(default = "default_units")]
    pub default_units: f64,

    /// Scale the trend by the seasonal index of the target month.
    #[serde(default = "default_true")]
    pub seasonal_adjustment: bool,
}

impl Default for FallbackSettings {
    fn default() -> Self {
        Self { window: default_window(), default_units: default_units(), seasonal_adjustment: true }
    }
}

fn default_window() -> usize {
    3
}

fn default_units() -> f64 {
    300.0
}

fn default_true() -> bool {
    true
}

impl FallbackSettings {
    /// Valid range of `window`.
    pub const WINDOW_RANGE: std::ops::RangeInclusive<usize> = 2..=6;

    /// Checks the window size and default estimate.
    pub fn validate(&self) -> Result<()> {
        if !Self::WINDOW_RANGE.contains(&self.window) {
            return Err(ConfigError::Validation(format!(
                "fallback.window must be between 2 and 6, got {}",
                self.window
            )));
        }
        if !self.default_units.is_finite() || self.default_units < 0.0 {
            return Err(ConfigError::Validation(format!(
                "fallback.default_units must be finite and non-negative, got {}",
                self.default_units
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensemble_defaults() {
        let settings = EnsembleSettings::default();
        assert_eq!(settings.timeout(), Duration::from_secs(2));
        assert_eq!(settings.max_units, 5000.0);
        assert_eq!(settings.fallback_ceiling, 50);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_weight_for_falls_back_to_default() {
        let mut settings = EnsembleSettings { default_weight: 0.5, ..Default::default() };
        settings.weights.insert("linear_trend".to_string(), 2.0);
        assert_eq!(settings.weight_for("linear_trend"), 2.0);
        assert_eq!(settings.weight_for("remote"), 0.5);

        let mut overrides = BTreeMap::new();
        overrides.insert("remote".to_string(), 4.0);
        assert_eq!(settings.weight_in(&overrides, "remote"), 4.0);
        assert_eq!(settings.weight_in(&overrides, "linear_trend"), 0.5);
    }

    #[test]
    fn test_ensemble_validation() {
        let inverted = EnsembleSettings { min_units: 10.0, max_units: 5.0, ..Default::default() };
        assert!(inverted.validate().is_err());

        let mut negative = EnsembleSettings::default();
        negative.weights.insert("bad".to_string(), -1.0);
        let err = negative.validate().unwrap_err();
        assert!(err.to_string().contains("ensemble.weights.bad"));

        let zero = EnsembleSettings { min_successes: 0, ..Default::default() };
        assert!(zero.validate().is_err());

        let ceiling = EnsembleSettings { fallback_ceiling: 101, ..Default::default() };
        assert!(ceiling.validate().is_err());
    }

    #[test]
    fn test_confidence_validation() {
        assert!(ConfidenceSettings::default().validate().is_ok());

        let inverted = ConfidenceSettings { floor: 60.0, ceiling: 50.0, ..Default::default() };
        assert!(inverted.validate().is_err());

        let negative = ConfidenceSettings { dispersion_penalty: -1.0, ..Default::default() };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_fallback_window_range() {
        assert!(FallbackSettings::default().validate().is_ok());
        assert!(FallbackSettings { window: 1, ..Default::default() }.validate().is_err());
        assert!(FallbackSettings { window: 7, ..Default::default() }.validate().is_err());
        assert!(FallbackSettings { window: 6, ..Default::default() }.validate().is_ok());
    }

    #[test]
    fn test_partial_sections_use_defaults() {
        let settings: EnsembleSettings = toml::from_str("timeout_ms = 500\n[weights]\nremote = 2.0").unwrap();
        assert_eq!(settings.timeout_ms, 500);
        assert_eq!(settings.min_successes, 1);
        assert_eq!(settings.weights["remote"], 2.0);
    }
}
