//! Concurrent fan-out over a set of predictors.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tariffcast_abstraction::{duration_millis, PredictionInput, Predictor, PredictorError, PredictorResult};
use tariffcast_core::{Config, EnsembleSettings};
use tariffcast_models::SeasonalIndex;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::combine::{sort_by_source, weighted_mean, Dispersion};
use crate::confidence::ConfidenceEstimator;
use crate::fallback::TrendFallback;

/// A predictor that did not contribute, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFailure {
    /// Predictor name.
    pub source: String,
    /// Failure cause.
    pub error: PredictorError,
}

/// Combined estimate of one ensemble run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleOutcome {
    /// Estimated units, within the configured plausible range.
    pub predicted_units: f64,
    /// Trust in the estimate, 0-100.
    pub confidence: u8,
    /// Predictors whose values were combined, sorted by name.
    pub contributing_sources: Vec<String>,
    /// True when the estimate came from the trend fallback.
    pub used_fallback: bool,
    /// Estimate before clamping to the plausible range.
    pub raw_units: f64,
    /// True when `raw_units` fell outside the plausible range.
    pub clamped: bool,
    /// Predictors that failed, sorted by name.
    pub failures: Vec<SourceFailure>,
}

/// Runs predictors concurrently and combines their estimates.
///
/// Holds only immutable configuration, so one instance can serve
/// concurrent callers. Each call spawns one task per predictor, waits until
/// every task finishes, the deadline passes, or the cancellation token
/// fires, and aborts whatever is still running.
#[derive(Debug, Clone, Default)]
pub struct EnsemblePredictor {
    settings: EnsembleSettings,
    confidence: ConfidenceEstimator,
    fallback: TrendFallback,
}

impl EnsemblePredictor {
    /// Creates an ensemble from its parts.
    #[must_use]
    pub const fn new(settings: EnsembleSettings, confidence: ConfidenceEstimator, fallback: TrendFallback) -> Self {
        Self { settings, confidence, fallback }
    }

    /// Creates an ensemble from the `[ensemble]`, `[confidence]` and
    /// `[fallback]` sections.
    #[must_use]
    pub fn from_config(config: &Config, index: SeasonalIndex) -> Self {
        Self::new(
            config.ensemble.clone(),
            ConfidenceEstimator::new(config.confidence.clone()),
            TrendFallback::new(config.fallback.clone(), index),
        )
    }

    /// Ensemble settings.
    #[must_use]
    pub const fn settings(&self) -> &EnsembleSettings {
        &self.settings
    }

    /// Runs `predictors` with the configured weights and timeout.
    pub async fn predict(&self, predictors: &[Arc<dyn Predictor>], input: &PredictionInput) -> EnsembleOutcome {
        let deadline = Instant::now() + self.settings.timeout();
        self.predict_ensemble(predictors, input, Some(&self.settings.weights), deadline, &CancellationToken::new())
            .await
    }

    /// Runs `predictors` until `deadline` or cancellation and combines the
    /// survivors.
    ///
    /// `weights` of `None` weighs every successful source equally; a source
    /// missing from the map takes the configured default weight. The call
    /// never fails: when fewer than `min_successes` predictors succeed the
    /// trend fallback supplies the estimate.
    pub async fn predict_ensemble(
        &self,
        predictors: &[Arc<dyn Predictor>],
        input: &PredictionInput,
        weights: Option<&BTreeMap<String, f64>>,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> EnsembleOutcome {
        let results = self.collect(predictors, input, deadline, cancel).await;

        let mut successes: Vec<(String, f64)> = Vec::new();
        let mut failures: Vec<SourceFailure> = Vec::new();
        for result in results {
            debug!(
                source = %result.source,
                succeeded = result.succeeded,
                value = result.value,
                elapsed_ms = result.elapsed_ms,
                "Predictor finished"
            );
            if result.succeeded {
                successes.push((result.source, result.value));
            } else {
                let error = result.error.unwrap_or_else(|| PredictorError::Model("failed without a cause".to_string()));
                warn!(source = %result.source, error = %error, "Predictor failed");
                failures.push(SourceFailure { source: result.source, error });
            }
        }
        sort_by_source(&mut successes);
        failures.sort_by(|a, b| a.source.cmp(&b.source));

        let total = successes.len() + failures.len();
        let required = self.settings.min_successes.max(1);

        let weight_of = |source: &str| weights.map_or(1.0, |map| self.settings.weight_in(map, source));
        let (raw_units, confidence, contributing_sources, used_fallback) =
            match weighted_mean(&successes, weight_of) {
                Some(combined) if successes.len() >= required => {
                    let values: Vec<f64> = successes.iter().map(|(_, value)| *value).collect();
                    let stats = Dispersion::of(&values).unwrap_or(Dispersion { mean: combined, spread: 0.0 });
                    let ratio = successes.len() as f64 / total as f64;
                    let confidence = self.confidence.estimate(ratio, stats.spread, stats.mean);
                    let sources: Vec<String> = successes.into_iter().map(|(source, _)| source).collect();
                    (combined, confidence, sources, false)
                }
                _ => {
                    let estimate = self.fallback.estimate(input);
                    let confidence = self
                        .confidence
                        .estimate(0.0, estimate.spread, estimate.mean)
                        .min(self.settings.fallback_ceiling);
                    warn!(
                        successes = successes.len(),
                        required,
                        units = estimate.units,
                        "Too few predictors succeeded, using trend fallback"
                    );
                    (estimate.units, confidence, Vec::new(), true)
                }
            };

        let predicted_units = self.clamp(raw_units);
        let clamped = predicted_units != raw_units;
        if clamped {
            warn!(
                raw_units,
                predicted_units,
                min_units = self.settings.min_units,
                max_units = self.settings.max_units,
                "Clamped ensemble estimate"
            );
        }

        info!(
            predicted_units,
            confidence,
            successes = contributing_sources.len(),
            failures = failures.len(),
            used_fallback,
            "Ensemble prediction complete"
        );

        EnsembleOutcome {
            predicted_units,
            confidence,
            contributing_sources,
            used_fallback,
            raw_units,
            clamped,
            failures,
        }
    }

    fn clamp(&self, units: f64) -> f64 {
        if units.is_nan() {
            return self.settings.min_units;
        }
        units.max(self.settings.min_units).min(self.settings.max_units)
    }

    /// Spawns every predictor and gathers one result per predictor, in
    /// input order.
    async fn collect(
        &self,
        predictors: &[Arc<dyn Predictor>],
        input: &PredictionInput,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Vec<PredictorResult> {
        let started = Instant::now();
        let budget_ms = duration_millis(deadline.saturating_duration_since(started));
        let input = Arc::new(input.clone());
        let names: Vec<String> = predictors.iter().map(|predictor| predictor.name().to_string()).collect();

        let mut tasks = JoinSet::new();
        for (slot, predictor) in predictors.iter().enumerate() {
            let predictor = Arc::clone(predictor);
            let input = Arc::clone(&input);
            let source = names[slot].clone();
            tasks.spawn(async move {
                let budget = deadline.saturating_duration_since(Instant::now());
                let result = AssertUnwindSafe(predictor.predict(&input, budget))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|payload| PredictorResult::failure(source, PredictorError::Panicked(panic_message(&*payload))));
                (slot, result)
            });
        }

        let mut results: Vec<Option<PredictorResult>> = vec![None; predictors.len()];
        let sleep = tokio::time::sleep_until(deadline);
        tokio::pin!(sleep);

        let interrupted = loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break Some(PredictorError::Cancelled),
                joined = tasks.join_next() => match joined {
                    Some(Ok((slot, result))) => results[slot] = Some(result),
                    Some(Err(join_error)) => warn!(error = %join_error, "Predictor task ended abnormally"),
                    None => break None,
                },
                () = &mut sleep => break Some(PredictorError::Timeout { after_ms: budget_ms }),
            }
        };
        if let Some(reason) = &interrupted {
            // Keep results that finished but were not yet joined.
            while let Some(joined) = tasks.try_join_next() {
                if let Ok((slot, result)) = joined {
                    results[slot] = Some(result);
                }
            }
            debug!(reason = %reason, pending = tasks.len(), "Aborting pending predictors");
        }
        tasks.abort_all();

        results
            .into_iter()
            .zip(names)
            .map(|(result, source)| {
                result.unwrap_or_else(|| {
                    let error = interrupted
                        .clone()
                        .unwrap_or_else(|| PredictorError::Panicked("predictor task did not complete".to_string()));
                    PredictorResult::failure(source, error).with_elapsed(started.elapsed())
                })
            })
            .collect()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}
