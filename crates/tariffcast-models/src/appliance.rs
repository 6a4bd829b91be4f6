//! Bottom-up estimate from declared appliance loads.

use async_trait::async_trait;
use tariffcast_abstraction::{PlausibleBounds, PredictionInput, Predictor, PredictorError};
use tracing::debug;

use crate::seasonal::SeasonalIndex;

/// Sums each appliance's monthly units and scales by the target month's
/// seasonal factor.
#[derive(Debug, Clone)]
pub struct ApplianceLoadPredictor {
    name: String,
    index: SeasonalIndex,
    bounds: PlausibleBounds,
}

impl ApplianceLoadPredictor {
    /// Creates a predictor over the given seasonal index.
    #[must_use]
    pub fn new(name: impl Into<String>, index: SeasonalIndex) -> Self {
        Self { name: name.into(), index, bounds: PlausibleBounds::default() }
    }

    /// Overrides the plausible range.
    #[must_use]
    pub const fn with_bounds(mut self, bounds: PlausibleBounds) -> Self {
        self.bounds = bounds;
        self
    }
}

#[async_trait]
impl Predictor for ApplianceLoadPredictor {
    fn name(&self) -> &str {
        &self.name
    }

    fn bounds(&self) -> PlausibleBounds {
        self.bounds
    }

    async fn estimate(&self, input: &PredictionInput) -> Result<f64, PredictorError> {
        if input.appliances().is_empty() {
            return Err(PredictorError::InsufficientData { required: 1, available: 0 });
        }
        let base = input.appliance_units();
        let value = base * self.index.factor(input.target_month());
        debug!(
            predictor = %self.name,
            appliances = input.appliances().len(),
            base,
            value,
            "Appliance load estimate"
        );
        Ok(value)
    }
}
