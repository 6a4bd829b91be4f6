//! Predictor factory for creating predictors from configuration.

use std::sync::Arc;

use tariffcast_abstraction::{PlausibleBounds, Predictor, PredictorError};
use tariffcast_core::{PredictorKind, PredictorSpec};
use thiserror::Error;
use tracing::debug;

use crate::{
    ApplianceLoadPredictor, LinearTrendPredictor, MockPredictor, RemotePredictor, SeasonalIndex,
    SeasonalProfilePredictor,
};

/// Errors raised while turning a [`PredictorSpec`] into a predictor.
#[derive(Debug, Error)]
pub enum FactoryError {
    /// The kind string does not name a predictor.
    #[error("Unknown predictor kind: {0}")]
    UnknownKind(String),

    /// A remote predictor has no endpoint.
    #[error("Predictor '{name}' needs an endpoint")]
    MissingEndpoint {
        /// Predictor name.
        name: String,
    },

    /// A parameter is missing or out of range.
    #[error("Predictor '{name}': {reason}")]
    InvalidParameter {
        /// Predictor name.
        name: String,
        /// What is wrong.
        reason: String,
    },

    /// The predictor could not be constructed.
    #[error("Predictor '{name}' could not be created: {source}")]
    Construction {
        /// Predictor name.
        name: String,
        /// Underlying failure.
        #[source]
        source: PredictorError,
    },
}

/// Builds predictors from registry entries.
#[derive(Debug, Clone, Default)]
pub struct PredictorFactory {
    index: SeasonalIndex,
}

impl PredictorFactory {
    /// Creates a factory using the default seasonal index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `index` for the seasonal and appliance predictors.
    #[must_use]
    pub const fn with_seasonal_index(mut self, index: SeasonalIndex) -> Self {
        self.index = index;
        self
    }

    /// Seasonal index handed to new predictors.
    #[must_use]
    pub const fn seasonal_index(&self) -> &SeasonalIndex {
        &self.index
    }

    /// Parses a predictor kind name.
    ///
    /// # Errors
    /// Returns `FactoryError::UnknownKind` if the name is not recognised.
    pub fn parse_kind(kind: &str) -> Result<PredictorKind, FactoryError> {
        kind.parse().map_err(|_| FactoryError::UnknownKind(kind.to_string()))
    }

    /// Creates one predictor.
    ///
    /// # Errors
    /// Returns a `FactoryError` if the entry is incomplete or invalid.
    pub fn create(&self, spec: &PredictorSpec) -> Result<Arc<dyn Predictor>, FactoryError> {
        debug!(name = %spec.name, kind = %spec.kind, "Creating predictor");

        let bounds = bounds_for(spec)?;
        let invalid = |reason: &str| FactoryError::InvalidParameter { name: spec.name.clone(), reason: reason.to_string() };

        let predictor: Arc<dyn Predictor> = match spec.kind {
            PredictorKind::LinearTrend => {
                let mut predictor = LinearTrendPredictor::new(&spec.name).with_bounds(bounds);
                if let Some(min_history) = spec.min_history {
                    if min_history < 2 {
                        return Err(invalid("linear trend needs min_history of at least 2"));
                    }
                    predictor = predictor.with_min_history(min_history);
                }
                Arc::new(predictor)
            }
            PredictorKind::SeasonalProfile => {
                let mut predictor = SeasonalProfilePredictor::new(&spec.name, self.index).with_bounds(bounds);
                if let Some(min_history) = spec.min_history {
                    if min_history == 0 {
                        return Err(invalid("seasonal profile needs min_history of at least 1"));
                    }
                    predictor = predictor.with_min_history(min_history);
                }
                Arc::new(predictor)
            }
            PredictorKind::ApplianceLoad => Arc::new(ApplianceLoadPredictor::new(&spec.name, self.index).with_bounds(bounds)),
            PredictorKind::Remote => {
                let endpoint = spec
                    .endpoint
                    .as_deref()
                    .filter(|endpoint| !endpoint.trim().is_empty())
                    .ok_or_else(|| FactoryError::MissingEndpoint { name: spec.name.clone() })?;
                let predictor = RemotePredictor::new(&spec.name, endpoint)
                    .map_err(|source| FactoryError::Construction { name: spec.name.clone(), source })?;
                Arc::new(predictor.with_bounds(bounds))
            }
            PredictorKind::Mock => {
                let value = spec.value.ok_or_else(|| invalid("mock predictor needs a value"))?;
                Arc::new(MockPredictor::new(&spec.name, value).with_bounds(bounds))
            }
        };
        Ok(predictor)
    }

    /// Creates every enabled predictor, in order.
    ///
    /// # Errors
    /// Returns the first `FactoryError` encountered.
    pub fn create_all<'a>(
        &self,
        specs: impl IntoIterator<Item = &'a PredictorSpec>,
    ) -> Result<Vec<Arc<dyn Predictor>>, FactoryError> {
        specs.into_iter().filter(|spec| spec.enabled).map(|spec| self.create(spec)).collect()
    }
}

fn bounds_for(spec: &PredictorSpec) -> Result<PlausibleBounds, FactoryError> {
    let defaults = PlausibleBounds::default();
    PlausibleBounds::new(spec.min_units.unwrap_or(defaults.min), spec.max_units.unwrap_or(defaults.max))
        .map_err(|e| FactoryError::InvalidParameter { name: spec.name.clone(), reason: e.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_defaults() {
        let factory = PredictorFactory::new();
        let predictors = factory.create_all(&PredictorSpec::defaults()).unwrap();
        let names: Vec<&str> = predictors.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["linear_trend", "seasonal_profile", "appliance_load"]);
    }

    #[test]
    fn test_disabled_specs_skipped() {
        let mut disabled = PredictorSpec::new("off", PredictorKind::LinearTrend);
        disabled.enabled = false;
        let specs = vec![disabled, PredictorSpec::new("on", PredictorKind::Mock).with_value(1.0)];
        let predictors = PredictorFactory::new().create_all(&specs).unwrap();
        assert_eq!(predictors.len(), 1);
        assert_eq!(predictors[0].name(), "on");
    }

    #[test]
    fn test_remote_requires_endpoint() {
        let spec = PredictorSpec::new("service", PredictorKind::Remote);
        let err = PredictorFactory::new().create(&spec).err().unwrap();
        assert!(matches!(err, FactoryError::MissingEndpoint { .. }));

        let spec = spec.with_endpoint("http://localhost:9000/predict");
        assert!(PredictorFactory::new().create(&spec).is_ok());
    }

    #[test]
    fn test_mock_requires_value() {
        let err = PredictorFactory::new().create(&PredictorSpec::new("m", PredictorKind::Mock)).err().unwrap();
        assert!(err.to_string().contains("needs a value"));
    }

    #[test]
    fn test_bounds_overrides() {
        let mut spec = PredictorSpec::new("m", PredictorKind::Mock).with_value(10.0);
        spec.max_units = Some(800.0);
        let predictor = PredictorFactory::new().create(&spec).unwrap();
        assert_eq!(predictor.bounds(), PlausibleBounds { min: 0.0, max: 800.0 });

        spec.min_units = Some(900.0);
        assert!(matches!(PredictorFactory::new().create(&spec), Err(FactoryError::InvalidParameter { .. })));
    }

    #[test]
    fn test_min_history_validated() {
        let mut spec = PredictorSpec::new("t", PredictorKind::LinearTrend);
        spec.min_history = Some(1);
        assert!(PredictorFactory::new().create(&spec).is_err());
        spec.min_history = Some(4);
        assert!(PredictorFactory::new().create(&spec).is_ok());
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!(PredictorFactory::parse_kind("remote").unwrap(), PredictorKind::Remote);
        assert!(matches!(PredictorFactory::parse_kind("neural"), Err(FactoryError::UnknownKind(_))));
    }
}
