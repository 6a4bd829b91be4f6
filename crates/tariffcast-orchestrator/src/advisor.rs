//! Prediction-to-bill flow.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tariffcast_abstraction::PredictionInput;
use tariffcast_core::{round_money, Bill, BillCalculator, BillingError, Config, TariffRegistry, TariffSchedule};
use tariffcast_models::PredictorFactory;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::ensemble::{EnsembleOutcome, EnsemblePredictor};
use crate::error::{OrchestrationError, Result};
use crate::registry::PredictorRegistry;

/// A predicted consumption and the bill it would produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillForecast {
    /// Ensemble estimate of next month's consumption.
    pub outcome: EnsembleOutcome,
    /// Bill for the estimated consumption.
    pub bill: Bill,
}

/// What cutting consumption down to a lower level would save on the bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsEstimate {
    /// Bill at the current consumption.
    pub current: Bill,
    /// Bill at the reduced consumption.
    pub optimized: Bill,
    /// Units no longer consumed.
    pub units_saved: f64,
    /// `current.total_due - optimized.total_due`; negative if the reduced
    /// level actually consumes more.
    pub savings_amount: f64,
    /// Savings as a percentage of the current bill, 0 for an empty bill.
    pub savings_percent: f64,
}

impl SavingsEstimate {
    /// Monthly savings kept up for a year.
    #[must_use]
    pub fn yearly_savings(&self) -> f64 {
        round_money(self.savings_amount * 12.0)
    }
}

/// Share of consumption a household can usually save: 30% above 500 units,
/// 20% above 300 units, 10% otherwise.
#[must_use]
pub fn typical_savings_share(units: f64) -> f64 {
    if units > 500.0 {
        0.30
    } else if units > 300.0 {
        0.20
    } else {
        0.10
    }
}

/// Runs the ensemble and bills the result against a dated tariff.
#[derive(Debug, Clone)]
pub struct ConsumptionAdvisor {
    predictors: PredictorRegistry,
    ensemble: EnsemblePredictor,
    tariffs: Arc<TariffRegistry>,
    calculator: BillCalculator,
}

impl ConsumptionAdvisor {
    /// Wires the advisor from already-built parts.
    #[must_use]
    pub fn new(
        predictors: PredictorRegistry,
        ensemble: EnsemblePredictor,
        tariffs: Arc<TariffRegistry>,
        calculator: BillCalculator,
    ) -> Self {
        Self { predictors, ensemble, tariffs, calculator }
    }

    /// Builds every part from configuration.
    ///
    /// # Errors
    /// Returns an error if predictors or tariff files cannot be loaded.
    pub fn from_config(config: &Config) -> Result<Self> {
        let factory = PredictorFactory::new();
        let predictors = PredictorRegistry::from_config(config, &factory)?;
        let ensemble = EnsemblePredictor::from_config(config, *factory.seasonal_index());
        let tariffs = Arc::new(config.tariff_registry()?);
        info!(predictors = predictors.len(), tariffs = tariffs.len(), "Consumption advisor ready");
        Ok(Self::new(predictors, ensemble, tariffs, BillCalculator::new()))
    }

    /// Replaces the bill calculator.
    #[must_use]
    pub const fn with_calculator(mut self, calculator: BillCalculator) -> Self {
        self.calculator = calculator;
        self
    }

    /// Registered predictors.
    #[must_use]
    pub const fn predictors(&self) -> &PredictorRegistry {
        &self.predictors
    }

    /// Loaded tariffs.
    #[must_use]
    pub fn tariffs(&self) -> &TariffRegistry {
        &self.tariffs
    }

    /// The ensemble.
    #[must_use]
    pub const fn ensemble(&self) -> &EnsemblePredictor {
        &self.ensemble
    }

    /// Predicts consumption and bills it.
    ///
    /// `off_peak_share` (0-1) is the fraction of the predicted units expected
    /// during discounted hours.
    ///
    /// # Errors
    /// Returns an error if the tariff is unknown on `on_date` or the share is
    /// outside 0-1. Predictor failures only lower the outcome's confidence.
    pub async fn forecast(
        &self,
        input: &PredictionInput,
        tariff: &str,
        on_date: NaiveDate,
        off_peak_share: f64,
    ) -> Result<BillForecast> {
        let deadline = Instant::now() + self.ensemble.settings().timeout();
        self.forecast_until(input, tariff, on_date, off_peak_share, deadline, &CancellationToken::new())
            .await
    }

    /// Like [`ConsumptionAdvisor::forecast`], with an explicit deadline and
    /// cancellation token.
    pub async fn forecast_until(
        &self,
        input: &PredictionInput,
        tariff: &str,
        on_date: NaiveDate,
        off_peak_share: f64,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Result<BillForecast> {
        if !(0.0..=1.0).contains(&off_peak_share) {
            return Err(BillingError::InvalidArgument {
                field: "off_peak_share",
                value: off_peak_share,
                reason: "must be between 0 and 1",
            }
            .into());
        }
        let schedule = self.schedule(tariff, on_date)?;

        let weights = &self.ensemble.settings().weights;
        let outcome = self
            .ensemble
            .predict_ensemble(self.predictors.predictors(), input, Some(weights), deadline, cancel)
            .await;
        let units = outcome.predicted_units;
        let bill = self.calculator.calculate(&schedule, units, units * off_peak_share)?;
        Ok(BillForecast { outcome, bill })
    }

    /// Bills a known reading, such as one taken from a scanned bill.
    ///
    /// # Errors
    /// Returns an error if the tariff is unknown on `on_date` or either
    /// figure is negative or not finite.
    pub fn bill_actual(&self, units: f64, off_peak_units: f64, tariff: &str, on_date: NaiveDate) -> Result<Bill> {
        let schedule = self.schedule(tariff, on_date)?;
        Ok(self.calculator.calculate(&schedule, units, off_peak_units)?)
    }

    /// Compares the bill at `current_units` with the bill at
    /// `optimized_units` under the same schedule.
    ///
    /// # Errors
    /// Returns an error if the tariff is unknown on `on_date` or either
    /// figure is negative or not finite.
    pub fn potential_savings(
        &self,
        current_units: f64,
        optimized_units: f64,
        tariff: &str,
        on_date: NaiveDate,
    ) -> Result<SavingsEstimate> {
        let schedule = self.schedule(tariff, on_date)?;
        let current = self.calculator.calculate(&schedule, current_units, 0.0)?;
        let optimized = self.calculator.calculate(&schedule, optimized_units, 0.0)?;

        let savings_amount = round_money(current.total_due - optimized.total_due);
        let savings_percent = if current.total_due > 0.0 {
            round_money(savings_amount / current.total_due * 100.0)
        } else {
            0.0
        };
        debug!(current_units, optimized_units, savings_amount, savings_percent, "Potential savings");
        Ok(SavingsEstimate {
            current,
            optimized,
            units_saved: current_units - optimized_units,
            savings_amount,
            savings_percent,
        })
    }

    /// [`ConsumptionAdvisor::potential_savings`] for a cut of
    /// [`typical_savings_share`] of `units`.
    ///
    /// # Errors
    /// Same as [`ConsumptionAdvisor::potential_savings`].
    pub fn typical_savings(&self, units: f64, tariff: &str, on_date: NaiveDate) -> Result<SavingsEstimate> {
        let optimized = units * (1.0 - typical_savings_share(units));
        self.potential_savings(units, optimized, tariff, on_date)
    }

    fn schedule(&self, tariff: &str, on_date: NaiveDate) -> Result<Arc<TariffSchedule>> {
        self.tariffs.effective_on(tariff, on_date).map_err(OrchestrationError::Tariff)
    }
}
