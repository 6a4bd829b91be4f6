//! Trend heuristic used when no predictor succeeds.

use tariffcast_abstraction::PredictionInput;
use tariffcast_core::FallbackSettings;
use tariffcast_models::{LinearFit, SeasonalIndex, month_index, months_ahead};
use tracing::debug;

use crate::combine::Dispersion;

/// A fallback estimate with the statistics of the window it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackEstimate {
    /// Estimated units.
    pub units: f64,
    /// Standard deviation of the readings in the window.
    pub spread: f64,
    /// Mean of the readings in the window.
    pub mean: f64,
}

/// Always-available estimator over the most recent readings.
///
/// Fits a line through the last `window` readings on a month axis and reads
/// it at the next occurrence of the target month, optionally rescaled from
/// the newest reading's month to the target month. Without history it uses the appliance loads, and
/// without those the configured default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrendFallback {
    settings: FallbackSettings,
    index: SeasonalIndex,
}

impl TrendFallback {
    /// Creates a fallback with the given settings and seasonal index.
    #[must_use]
    pub const fn new(settings: FallbackSettings, index: SeasonalIndex) -> Self {
        Self { settings, index }
    }

    /// Configured settings.
    #[must_use]
    pub const fn settings(&self) -> &FallbackSettings {
        &self.settings
    }

    /// Estimates the target month's consumption. Never fails.
    #[must_use]
    pub fn estimate(&self, input: &PredictionInput) -> FallbackEstimate {
        let target_month = input.target_month();
        let recent = input.recent(self.settings.window);
        let window: Vec<f64> = recent.iter().map(|reading| reading.units).collect();

        let (Some(first), Some(last), Some(stats)) = (recent.first(), recent.last(), Dispersion::of(&window)) else {
            let units = if input.appliances().is_empty() {
                self.settings.default_units
            } else if self.settings.seasonal_adjustment {
                input.appliance_units() * self.index.factor(target_month)
            } else {
                input.appliance_units()
            };
            debug!(units, appliances = input.appliances().len(), "Fallback without history");
            return FallbackEstimate { units, spread: 0.0, mean: units };
        };

        let origin = month_index(first.period);
        let points: Vec<(f64, f64)> =
            recent.iter().map(|reading| (month_index(reading.period) - origin, reading.units)).collect();
        let target_x = month_index(last.period) - origin + f64::from(months_ahead(last.month(), target_month));
        let trend = LinearFit::fit(&points).map_or(stats.mean, |fit| fit.at(target_x));
        let units = if self.settings.seasonal_adjustment {
            trend * self.index.adjustment(last.month(), target_month)
        } else {
            trend
        };
        debug!(window = window.len(), target_x, trend, units, target_month, "Fallback trend estimate");
        FallbackEstimate { units, spread: stats.spread, mean: stats.mean }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use tariffcast_abstraction::{ApplianceLoad, Predictor};
    use tariffcast_models::LinearTrendPredictor;

    use super::*;

    fn history(units: &[f64]) -> PredictionInput {
        let mut builder = PredictionInput::builder();
        for (i, &u) in units.iter().enumerate() {
            builder = builder.reading(NaiveDate::from_ymd_opt(2024, i as u32 + 1, 1).unwrap(), u);
        }
        builder.build().unwrap()
    }

    fn plain() -> TrendFallback {
        TrendFallback::new(FallbackSettings { seasonal_adjustment: false, ..Default::default() }, SeasonalIndex::default())
    }

    #[test]
    fn test_uses_only_the_window() {
        // Only 300, 310, 320 are inside the default window of 3.
        let estimate = plain().estimate(&history(&[900.0, 10.0, 300.0, 310.0, 320.0]));
        assert!((estimate.units - 330.0).abs() < 1e-9);
        assert!((estimate.mean - 310.0).abs() < 1e-9);
    }

    #[test]
    fn test_gapped_history_uses_calendar_months() {
        // Jan, Feb and Dec 2024: ten units a month, so Jan 2025 is 220.
        let input = PredictionInput::builder()
            .reading(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 100.0)
            .reading(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(), 110.0)
            .reading(NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(), 210.0)
            .target_month(1)
            .build()
            .unwrap();
        let estimate = plain().estimate(&input);
        assert!((estimate.units - 220.0).abs() < 1e-9);
    }

    #[test]
    fn test_reads_the_trend_at_a_later_target_month() {
        let mut builder = PredictionInput::builder().target_month(6);
        for (month, units) in [(1, 100.0), (2, 110.0), (3, 120.0)] {
            builder = builder.reading(NaiveDate::from_ymd_opt(2024, month, 1).unwrap(), units);
        }
        let estimate = plain().estimate(&builder.build().unwrap());
        assert!((estimate.units - 150.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_matches_linear_trend_over_the_same_readings() {
        let input = PredictionInput::builder()
            .reading(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), 240.0)
            .reading(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(), 300.0)
            .reading(NaiveDate::from_ymd_opt(2024, 8, 1).unwrap(), 330.0)
            .target_month(11)
            .build()
            .unwrap();
        let trend = LinearTrendPredictor::new("trend").estimate(&input).await.unwrap();
        let estimate = plain().estimate(&input);
        assert!((estimate.units - trend).abs() < 1e-9);
    }

    #[test]
    fn test_single_reading_is_carried_forward() {
        let estimate = plain().estimate(&history(&[275.0]));
        assert_eq!(estimate.units, 275.0);
        assert_eq!(estimate.spread, 0.0);
    }

    #[test]
    fn test_seasonal_adjustment() {
        // Last reading in March (0.90), target April (0.95).
        let fallback = TrendFallback::default();
        let estimate = fallback.estimate(&history(&[180.0, 180.0, 180.0]));
        assert!((estimate.units - 190.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_history_uses_appliances_then_default() {
        let with_appliances = PredictionInput::builder()
            .appliance(ApplianceLoad::new("fridge", 150.0, 24.0))
            .target_month(6)
            .build()
            .unwrap();
        let estimate = TrendFallback::default().estimate(&with_appliances);
        // 150 * 24 * 30 / 1000 = 108, June factor 1.5
        assert!((estimate.units - 162.0).abs() < 1e-9);

        let empty = PredictionInput::builder().target_month(6).build().unwrap();
        assert_eq!(TrendFallback::default().estimate(&empty).units, 300.0);
    }
}
