//! Predictor abstraction layer for Tariffcast.
//!
//! This crate defines the capability contract shared by every consumption
//! predictor, together with the typed input handed to predictors and the
//! per-invocation result the ensemble consumes.

pub mod input;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;

pub use input::{ApplianceLoad, MonthlyReading, PredictionInput, PredictionInputBuilder};

/// Represents a failure of a single predictor invocation.
///
/// Failures never abort an ensemble run; they are carried inside a
/// [`PredictorResult`] and reported alongside the combined estimate.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum PredictorError {
    /// The predictor did not finish before its deadline.
    #[error("Timed out after {after_ms} ms")]
    Timeout {
        /// The time budget the predictor was given, in milliseconds.
        after_ms: u64,
    },

    /// The invocation was cancelled by the caller.
    #[error("Cancelled before completion")]
    Cancelled,

    /// The predictor panicked; the payload message is preserved when available.
    #[error("Predictor panicked: {0}")]
    Panicked(String),

    /// The predictor produced a value outside its physically sane range.
    #[error("Implausible value {value} (expected {min}..={max})")]
    ImplausibleValue {
        /// The rejected value.
        value: f64,
        /// Lower plausible bound.
        min: f64,
        /// Upper plausible bound.
        max: f64,
    },

    /// Not enough history to run the model.
    #[error("Insufficient data: need {required} readings, have {available}")]
    InsufficientData {
        /// Readings the predictor needs.
        required: usize,
        /// Readings that were supplied.
        available: usize,
    },

    /// The underlying model failed.
    #[error("Model error: {0}")]
    Model(String),

    /// A remote model endpoint failed or returned an unusable payload.
    #[error("Remote error: {0}")]
    Remote(String),

    /// The prediction input was rejected.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl PredictorError {
    /// Returns true if this failure was caused by a deadline.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Closed range of consumption values a predictor considers physically sane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlausibleBounds {
    /// Smallest acceptable estimate (units).
    pub min: f64,
    /// Largest acceptable estimate (units).
    pub max: f64,
}

impl PlausibleBounds {
    /// Absolute ceiling used when a predictor does not configure its own.
    pub const DEFAULT_CEILING: f64 = 5000.0;

    /// Creates bounds, rejecting inverted, negative or non-finite ranges.
    pub fn new(min: f64, max: f64) -> Result<Self, PredictorError> {
        if !min.is_finite() || !max.is_finite() || min < 0.0 || min > max {
            return Err(PredictorError::InvalidInput(format!(
                "plausible bounds must satisfy 0 <= min <= max, got {min}..={max}"
            )));
        }
        Ok(Self { min, max })
    }

    /// Returns true if `value` is finite and inside the range.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }

    /// Passes `value` through unchanged, or reports it as implausible.
    pub fn check(&self, value: f64) -> Result<f64, PredictorError> {
        if self.contains(value) {
            Ok(value)
        } else {
            Err(PredictorError::ImplausibleValue { value, min: self.min, max: self.max })
        }
    }
}

impl Default for PlausibleBounds {
    fn default() -> Self {
        Self { min: 0.0, max: Self::DEFAULT_CEILING }
    }
}

/// The outcome of invoking one predictor once.
///
/// Created per invocation, consumed by the ensemble, and never retained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorResult {
    /// Name of the predictor that produced this result.
    pub source: String,
    /// Estimated units; `0.0` when the invocation failed.
    pub value: f64,
    /// Whether the estimate is usable.
    pub succeeded: bool,
    /// Failure cause when `succeeded` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<PredictorError>,
    /// Wall-clock time the invocation took, in milliseconds.
    pub elapsed_ms: u64,
}

impl PredictorResult {
    /// Creates a successful result.
    #[must_use]
    pub fn success(source: impl Into<String>, value: f64) -> Self {
        Self { source: source.into(), value, succeeded: true, error: None, elapsed_ms: 0 }
    }

    /// Creates a failed result.
    #[must_use]
    pub fn failure(source: impl Into<String>, error: PredictorError) -> Self {
        Self { source: source.into(), value: 0.0, succeeded: false, error: Some(error), elapsed_ms: 0 }
    }

    /// Builds a result from a predictor's raw outcome.
    #[must_use]
    pub fn from_outcome(source: impl Into<String>, outcome: Result<f64, PredictorError>) -> Self {
        match outcome {
            Ok(value) => Self::success(source, value),
            Err(error) => Self::failure(source, error),
        }
    }

    /// Records how long the invocation took.
    #[must_use]
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed_ms = duration_millis(elapsed);
        self
    }
}

/// A capability that turns a [`PredictionInput`] into a consumption estimate.
///
/// Implementations only provide [`Predictor::estimate`]. The provided
/// [`Predictor::predict`] enforces the timeout and the predictor's own
/// [`PlausibleBounds`], so an implausible model output becomes a failed
/// result instead of an error the caller has to interpret.
///
/// All predictors must be `Send + Sync` so the ensemble can run them on
/// separate tasks.
#[async_trait]
pub trait Predictor: Send + Sync {
    /// Returns the unique source name of the predictor.
    fn name(&self) -> &str;

    /// Returns the range of values this predictor accepts from its own model.
    fn bounds(&self) -> PlausibleBounds {
        PlausibleBounds::default()
    }

    /// Produces a raw estimate of the target month's consumption in units.
    ///
    /// # Errors
    /// Returns a `PredictorError` if the model cannot produce an estimate.
    async fn estimate(&self, input: &PredictionInput) -> Result<f64, PredictorError>;

    /// Runs [`Predictor::estimate`] under `timeout` and validates the output.
    async fn predict(&self, input: &PredictionInput, timeout: Duration) -> PredictorResult {
        let started = Instant::now();
        let outcome = match tokio::time::timeout(timeout, self.estimate(input)).await {
            Ok(Ok(value)) => self.bounds().check(value),
            Ok(Err(error)) => Err(error),
            Err(_) => Err(PredictorError::Timeout { after_ms: duration_millis(timeout) }),
        };
        PredictorResult::from_outcome(self.name(), outcome).with_elapsed(started.elapsed())
    }
}

/// Converts a duration to whole milliseconds, saturating at `u64::MAX`.
#[must_use]
pub fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
