//! Least-squares trend over the reading history.

use async_trait::async_trait;
use tariffcast_abstraction::{PlausibleBounds, PredictionInput, Predictor, PredictorError};
use tracing::debug;

use crate::seasonal::{month_index, months_ahead};

/// Ordinary least-squares line through `(x, y)` points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    /// Change in y per unit of x.
    pub slope: f64,
    /// Value of the line at x = 0.
    pub intercept: f64,
}

impl LinearFit {
    /// Fits a line through `points`.
    ///
    /// Returns `None` for an empty slice. A single point, or points sharing
    /// one x, give a flat line through their mean.
    #[must_use]
    pub fn fit(points: &[(f64, f64)]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let n = points.len() as f64;
        let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
        let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

        let mut covariance = 0.0;
        let mut variance = 0.0;
        for (x, y) in points {
            covariance += (x - mean_x) * (y - mean_y);
            variance += (x - mean_x) * (x - mean_x);
        }
        let slope = if variance > 0.0 { covariance / variance } else { 0.0 };
        Some(Self { slope, intercept: mean_y - slope * mean_x })
    }

    /// Value of the line at `x`.
    #[must_use]
    pub fn at(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Extrapolates the consumption trend to the target month.
///
/// Readings are placed on a month axis, so gaps in the history do not
/// distort the slope.
#[derive(Debug, Clone)]
pub struct LinearTrendPredictor {
    name: String,
    min_history: usize,
    bounds: PlausibleBounds,
}

impl LinearTrendPredictor {
    /// Readings needed before a trend is trusted.
    pub const DEFAULT_MIN_HISTORY: usize = 3;

    /// Creates a predictor with the default history requirement and bounds.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), min_history: Self::DEFAULT_MIN_HISTORY, bounds: PlausibleBounds::default() }
    }

    /// Overrides the history requirement. At least 2 readings are always needed.
    #[must_use]
    pub fn with_min_history(mut self, min_history: usize) -> Self {
        self.min_history = min_history.max(2);
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
impl Predictor for LinearTrendPredictor {
    fn name(&self) -> &str {
        &self.name
    }

    fn bounds(&self) -> PlausibleBounds {
        self.bounds
    }

    async fn estimate(&self, input: &PredictionInput) -> Result<f64, PredictorError> {
        let history = input.history();
        let (Some(first), Some(last)) = (history.first(), history.last()) else {
            return Err(PredictorError::InsufficientData { required: self.min_history, available: 0 });
        };
        if history.len() < self.min_history {
            return Err(PredictorError::InsufficientData { required: self.min_history, available: history.len() });
        }

        let origin = month_index(first.period);
        let points: Vec<(f64, f64)> =
            history.iter().map(|reading| (month_index(reading.period) - origin, reading.units)).collect();
        let fit = LinearFit::fit(&points)
            .ok_or_else(|| PredictorError::Model("no points to fit".to_string()))?;

        let target_x = month_index(last.period) - origin + f64::from(months_ahead(last.month(), input.target_month()));
        let value = fit.at(target_x);
        debug!(
            predictor = %self.name,
            slope = fit.slope,
            intercept = fit.intercept,
            target_x,
            value,
            "Linear trend estimate"
        );
        Ok(value)
    }
}
