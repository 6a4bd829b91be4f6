//! End-to-end tests for forecasting a bill.

use std::sync::Arc;

use chrono::NaiveDate;
use tariffcast_abstraction::{PredictionInput, PredictorError};
use tariffcast_core::{BillCalculator, BillingError, Config, ConfigError, TariffRegistry};
use tariffcast_models::MockPredictor;
use tariffcast_orchestrator::{
    typical_savings_share, ConsumptionAdvisor, EnsemblePredictor, OrchestrationError, PredictorRegistry,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn input() -> PredictionInput {
    PredictionInput::builder()
        .reading(date(2025, 3, 1), 110.0)
        .reading(date(2025, 4, 1), 115.0)
        .reading(date(2025, 5, 1), 118.0)
        .target_month(6)
        .build()
        .unwrap()
}

fn advisor(predictors: PredictorRegistry) -> ConsumptionAdvisor {
    ConsumptionAdvisor::new(
        predictors,
        EnsemblePredictor::default(),
        Arc::new(TariffRegistry::builtin().unwrap()),
        BillCalculator::new(),
    )
}

fn constant(units: f64) -> PredictorRegistry {
    PredictorRegistry::new()
        .with(Arc::new(MockPredictor::new("constant", units)))
        .unwrap()
}

#[tokio::test]
async fn test_forecast_bills_the_predicted_units() {
    let forecast = advisor(constant(120.0))
        .forecast(&input(), "lesco-domestic", date(2025, 6, 1), 0.0)
        .await
        .unwrap();

    assert_eq!(forecast.outcome.predicted_units, 120.0);
    assert!(!forecast.outcome.used_fallback);
    assert_eq!(forecast.bill.units_consumed, 120.0);
    assert_eq!(forecast.bill.effective_from, date(2025, 1, 1));
    assert_eq!(forecast.bill.total_due, 4161.4);
}

#[tokio::test]
async fn test_forecast_survives_failing_predictors() {
    let predictors = PredictorRegistry::new()
        .with(Arc::new(MockPredictor::failing("broken", PredictorError::Remote("503".to_string()))))
        .unwrap();

    let forecast = advisor(predictors)
        .forecast(&input(), "lesco-domestic", date(2025, 6, 1), 0.25)
        .await
        .unwrap();

    assert!(forecast.outcome.used_fallback);
    assert_eq!(forecast.outcome.failures.len(), 1);
    assert_eq!(forecast.bill.units_consumed, forecast.outcome.predicted_units);
    assert!(forecast.bill.off_peak_savings > 0.0);
}

#[tokio::test]
async fn test_forecast_rejects_out_of_range_off_peak_share() {
    let err = advisor(constant(120.0))
        .forecast(&input(), "lesco-domestic", date(2025, 6, 1), 1.5)
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestrationError::Billing(BillingError::InvalidArgument { field: "off_peak_share", .. })));
}

#[tokio::test]
async fn test_forecast_rejects_unknown_tariff() {
    let err = advisor(constant(120.0))
        .forecast(&input(), "kesc-commercial", date(2025, 6, 1), 0.0)
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestrationError::Tariff(ConfigError::UnknownTariff { .. })));
}

#[test]
fn test_bill_actual_uses_the_schedule_in_force() {
    let advisor = advisor(PredictorRegistry::new());

    let older = advisor.bill_actual(120.0, 0.0, "lesco-domestic", date(2024, 6, 1)).unwrap();
    let newer = advisor.bill_actual(120.0, 0.0, "lesco-domestic", date(2025, 6, 1)).unwrap();

    assert_eq!(older.effective_from, date(2023, 7, 1));
    assert_eq!(newer.effective_from, date(2025, 1, 1));
    assert_eq!(newer.total_due, 4161.4);
    assert!(older.total_due < newer.total_due);
}

#[test]
fn test_bill_actual_before_first_schedule_is_an_error() {
    let err = advisor(PredictorRegistry::new())
        .bill_actual(120.0, 0.0, "lesco-domestic", date(2020, 1, 1))
        .unwrap_err();
    assert!(matches!(err, OrchestrationError::Tariff(_)));
}

#[test]
fn test_bill_actual_rejects_negative_units() {
    let err = advisor(PredictorRegistry::new())
        .bill_actual(-5.0, 0.0, "lesco-domestic", date(2025, 6, 1))
        .unwrap_err();
    assert!(matches!(err, OrchestrationError::Billing(_)));
}

#[test]
fn test_from_config_uses_default_predictors() {
    let advisor = ConsumptionAdvisor::from_config(&Config::default()).unwrap();
    assert_eq!(advisor.predictors().names(), vec!["linear_trend", "seasonal_profile", "appliance_load"]);
    assert!(advisor.tariffs().latest("lesco-domestic").is_some());
}

#[test]
fn test_potential_savings_bills_both_levels() {
    let advisor = advisor(PredictorRegistry::new());
    let estimate = advisor.potential_savings(120.0, 100.0, "lesco-domestic", date(2025, 6, 1)).unwrap();

    assert_eq!(estimate.current.total_due, 4161.4);
    assert_eq!(estimate.optimized.total_due, 3284.5);
    assert_eq!(estimate.units_saved, 20.0);
    assert_eq!(estimate.savings_amount, 876.9);
    assert_eq!(estimate.savings_percent, 21.07);
}

#[test]
fn test_potential_savings_from_zero_consumption() {
    let advisor = advisor(PredictorRegistry::new());
    let estimate = advisor.potential_savings(0.0, 0.0, "lesco-domestic", date(2024, 6, 1)).unwrap();
    // The older schedule has no service charge, so the bill is empty.
    assert_eq!(estimate.current.total_due, 0.0);
    assert_eq!(estimate.savings_amount, 0.0);
    assert_eq!(estimate.savings_percent, 0.0);
}

#[test]
fn test_potential_savings_rejects_negative_units() {
    let err = advisor(PredictorRegistry::new())
        .potential_savings(120.0, -1.0, "lesco-domestic", date(2025, 6, 1))
        .unwrap_err();
    assert!(matches!(err, OrchestrationError::Billing(_)));
}

#[test]
fn test_typical_savings_scales_with_consumption() {
    assert_eq!(typical_savings_share(250.0), 0.10);
    assert_eq!(typical_savings_share(400.0), 0.20);
    assert_eq!(typical_savings_share(650.0), 0.30);

    let estimate = advisor(PredictorRegistry::new()).typical_savings(400.0, "lesco-domestic", date(2025, 6, 1)).unwrap();
    assert_eq!(estimate.optimized.units_consumed, 320.0);
    assert_eq!(estimate.current.total_due, 18334.0);
    assert_eq!(estimate.optimized.total_due, 13878.4);
    assert_eq!(estimate.savings_amount, 4455.6);
    assert_eq!(estimate.savings_percent, 24.3);
    assert_eq!(estimate.yearly_savings(), 53467.2);
}
