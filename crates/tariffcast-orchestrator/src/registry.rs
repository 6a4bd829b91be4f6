//! Predictor registry.
//!
//! Predictors are injected when the registry is built and never change
//! afterwards, so the registry can be shared freely between callers.

use std::fmt;
use std::sync::Arc;

use tariffcast_abstraction::Predictor;
use tariffcast_core::Config;
use tariffcast_models::PredictorFactory;
use tracing::debug;

use crate::error::{OrchestrationError, Result};

/// Ordered set of predictors with unique names.
#[derive(Clone, Default)]
pub struct PredictorRegistry {
    predictors: Vec<Arc<dyn Predictor>>,
}

impl fmt::Debug for PredictorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredictorRegistry").field("predictors", &self.names()).finish()
    }
}

impl PredictorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from the enabled `[[predictors]]` entries.
    ///
    /// # Errors
    /// Returns an error if an entry cannot be built or names repeat.
    pub fn from_config(config: &Config, factory: &PredictorFactory) -> Result<Self> {
        let mut registry = Self::new();
        for predictor in factory.create_all(config.enabled_predictors())? {
            registry.register(predictor)?;
        }
        Ok(registry)
    }

    /// Adds a predictor.
    ///
    /// # Errors
    /// Returns `OrchestrationError::Registry` if the name is taken.
    pub fn register(&mut self, predictor: Arc<dyn Predictor>) -> Result<()> {
        let name = predictor.name().to_string();
        if self.get(&name).is_some() {
            return Err(OrchestrationError::Registry { name });
        }
        debug!(predictor = %name, "Registering predictor");
        self.predictors.push(predictor);
        Ok(())
    }

    /// Adds a predictor, builder style.
    ///
    /// # Errors
    /// Returns `OrchestrationError::Registry` if the name is taken.
    pub fn with(mut self, predictor: Arc<dyn Predictor>) -> Result<Self> {
        self.register(predictor)?;
        Ok(self)
    }

    /// Looks a predictor up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Predictor>> {
        self.predictors.iter().find(|predictor| predictor.name() == name).cloned()
    }

    /// Registered predictors, in registration order.
    #[must_use]
    pub fn predictors(&self) -> &[Arc<dyn Predictor>] {
        &self.predictors
    }

    /// Names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.predictors.iter().map(|predictor| predictor.name()).collect()
    }

    /// A registry holding only the named predictors, in the given order.
    ///
    /// Unknown names are ignored.
    #[must_use]
    pub fn subset(&self, names: &[&str]) -> Self {
        Self { predictors: names.iter().filter_map(|name| self.get(name)).collect() }
    }

    /// Number of predictors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.predictors.len()
    }

    /// Returns true if no predictor is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predictors.is_empty()
    }
}
