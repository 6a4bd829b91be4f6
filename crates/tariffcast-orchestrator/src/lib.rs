//! Prediction ensemble orchestration for Tariffcast.
//!
//! This crate runs a set of [`Predictor`](tariffcast_abstraction::Predictor)s
//! concurrently, combines the estimates that survive, falls back to a trend
//! heuristic when too few do, and scores the result. The
//! [`ConsumptionAdvisor`] joins that estimate to the bill calculator.
//!
//! # Example
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use tariffcast_abstraction::PredictionInput;
//! use tariffcast_core::Config;
//! use tariffcast_orchestrator::ConsumptionAdvisor;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let advisor = ConsumptionAdvisor::from_config(&Config::load()?)?;
//! let input = PredictionInput::builder()
//!     .reading(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap_or_default(), 280.0)
//!     .reading(NaiveDate::from_ymd_opt(2025, 4, 1).unwrap_or_default(), 300.0)
//!     .reading(NaiveDate::from_ymd_opt(2025, 5, 1).unwrap_or_default(), 310.0)
//!     .build()?;
//! let on = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap_or_default();
//! let forecast = advisor.forecast(&input, "lesco-domestic", on, 0.0).await?;
//! println!("{} units, confidence {}", forecast.outcome.predicted_units, forecast.outcome.confidence);
//! # Ok(())
//! # }
//! ```

pub mod advisor;
pub mod combine;
pub mod confidence;
pub mod ensemble;
pub mod error;
pub mod fallback;
pub mod registry;

pub use advisor::{typical_savings_share, BillForecast, ConsumptionAdvisor, SavingsEstimate};
pub use confidence::ConfidenceEstimator;
pub use ensemble::{EnsembleOutcome, EnsemblePredictor, SourceFailure};
pub use error::{OrchestrationError, Result};
pub use fallback::{FallbackEstimate, TrendFallback};
pub use registry::PredictorRegistry;
