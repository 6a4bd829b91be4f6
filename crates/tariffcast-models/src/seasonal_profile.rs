//! Seasonally normalized average of the history.

use async_trait::async_trait;
use tariffcast_abstraction::{PlausibleBounds, PredictionInput, Predictor, PredictorError};
use tracing::debug;

use crate::seasonal::SeasonalIndex;

/// Removes each reading's seasonal factor, averages, and applies the target
/// month's factor.
#[derive(Debug, Clone)]
pub struct SeasonalProfilePredictor {
    name: String,
    index: SeasonalIndex,
    min_history: usize,
    bounds: PlausibleBounds,
}

impl SeasonalProfilePredictor {
    /// Readings needed before the profile is used.
    pub const DEFAULT_MIN_HISTORY: usize = 2;

    /// Creates a predictor over the given seasonal index.
    #[must_use]
    pub fn new(name: impl Into<String>, index: SeasonalIndex) -> Self {
        Self {
            name: name.into(),
            index,
            min_history: Self::DEFAULT_MIN_HISTORY,
            bounds: PlausibleBounds::default(),
        }
    }

    /// Overrides the history requirement (at least 1).
    #[must_use]
    pub fn with_min_history(mut self, min_history: usize) -> Self {
        self.min_history = min_history.max(1);
        self
    }

    /// Overrides the plausible range.
    #[must_use]
    pub const fn with_bounds(mut self, bounds: PlausibleBounds) -> Self {
        self.bounds = bounds;
        self
    }
}

#[async_trait]
impl Predictor for SeasonalProfilePredictor {
    fn name(&self) -> &str {
        &self.name
    }

    fn bounds(&self) -> PlausibleBounds {
        self.bounds
    }

    async fn estimate(&self, input: &PredictionInput) -> Result<f64, PredictorError> {
        let history = input.history();
        if history.is_empty() || history.len() < self.min_history {
            return Err(PredictorError::InsufficientData { required: self.min_history, available: history.len() });
        }

        let baseline = history.iter().map(|reading| reading.units / self.index.factor(reading.month())).sum::<f64>()
            / history.len() as f64;
        let value = baseline * self.index.factor(input.target_month());
        debug!(predictor = %self.name, baseline, target_month = input.target_month(), value, "Seasonal profile estimate");
        Ok(value)
    }
}
