//! Predictor implementations for Tariffcast.
//!
//! This crate provides concrete implementations of the `Predictor` trait.
//!
//! # Supported Predictors
//!
//! - **Linear trend**: least-squares extrapolation of the reading history
//! - **Seasonal profile**: history normalized by the monthly seasonal index
//! - **Appliance load**: bottom-up estimate from declared appliances
//! - **Remote**: a model service reached over HTTP
//! - **Mock**: constant output for development and tests

pub mod appliance;
pub mod factory;
pub mod linear_trend;
pub mod remote;
pub mod seasonal;
pub mod seasonal_profile;

use std::time::Duration;

use async_trait::async_trait;
use tariffcast_abstraction::{PlausibleBounds, PredictionInput, Predictor, PredictorError};
use tracing::debug;

pub use appliance::ApplianceLoadPredictor;
pub use factory::{FactoryError, PredictorFactory};
pub use linear_trend::{LinearFit, LinearTrendPredictor};
pub use remote::RemotePredictor;
pub use seasonal::{month_index, months_ahead, SeasonalIndex};
pub use seasonal_profile::SeasonalProfilePredictor;

/// A predictor that returns a fixed value, optionally after a delay or with
/// a fixed failure.
#[derive(Debug, Clone)]
pub struct MockPredictor {
    name: String,
    value: f64,
    delay: Duration,
    failure: Option<PredictorError>,
    bounds: PlausibleBounds,
}

impl MockPredictor {
    /// Creates a `MockPredictor` that always returns `value`.
    #[must_use]
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            delay: Duration::ZERO,
            failure: None,
            bounds: PlausibleBounds::default(),
        }
    }

    /// Creates a `MockPredictor` that always fails with `error`.
    #[must_use]
    pub fn failing(name: impl Into<String>, error: PredictorError) -> Self {
        Self { failure: Some(error), ..Self::new(name, 0.0) }
    }

    /// Sleeps for `delay` before answering.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
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
impl Predictor for MockPredictor {
    fn name(&self) -> &str {
        &self.name
    }

    fn bounds(&self) -> PlausibleBounds {
        self.bounds
    }

    async fn estimate(&self, input: &PredictionInput) -> Result<f64, PredictorError> {
        debug!(
            predictor = %self.name,
            target_month = input.target_month(),
            delay_ms = self.delay.as_millis() as u64,
            "MockPredictor estimating"
        );
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(self.value),
        }
    }
}
