// Error types for orchestration

use tariffcast_core::{BillingError, ConfigError};
use tariffcast_models::FactoryError;
use thiserror::Error;

/// Result type for orchestration operations
pub type Result<T> = std::result::Result<T, OrchestrationError>;

/// Orchestration errors
///
/// Predictor failures never appear here; they degrade the ensemble outcome
/// instead. Only configuration and caller-input problems are errors.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// Two predictors share a source name
    #[error("Predictor '{name}' is already registered")]
    Registry {
        /// Duplicate source name
        name: String,
    },

    /// A predictor could not be built from configuration
    #[error("Predictor factory error: {0}")]
    Factory(#[from] FactoryError),

    /// Configuration could not be loaded or validated
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The bill calculator rejected its arguments
    #[error("Billing error: {0}")]
    Billing(#[from] BillingError),

    /// The requested tariff is not available
    #[error("Tariff error: {0}")]
    Tariff(ConfigError),
}
