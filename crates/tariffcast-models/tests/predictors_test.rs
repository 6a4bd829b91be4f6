//! Runs the configured predictor set against realistic household input.

use std::time::Duration;

use chrono::NaiveDate;
use serde_json::json;
use tariffcast_abstraction::{PredictionInput, PredictorError};
use tariffcast_core::Config;
use tariffcast_models::{PredictorFactory, SeasonalIndex};

fn legacy_household() -> PredictionInput {
    let payload = json!({
        "historical_data": [
            {"date": "2025-01-01", "units": 260.0},
            {"date": "2025-02-01", "units": 250.0},
            {"date": "2025-03-01", "units": 180.0},
            {"date": "2025-04-01", "units": 190.0},
        ],
        "appliances": ["fridge", "tv", "lights"],
        "month": 5,
    });
    PredictionInput::from_legacy_json(&payload, NaiveDate::from_ymd_opt(2025, 5, 3).unwrap()).unwrap()
}

#[tokio::test]
async fn test_default_predictors_all_succeed_on_full_input() {
    let config = Config::default();
    let predictors = PredictorFactory::new().create_all(config.enabled_predictors()).unwrap();
    let input = legacy_household();

    for predictor in &predictors {
        let result = predictor.predict(&input, Duration::from_secs(1)).await;
        assert!(result.succeeded, "{} failed: {:?}", result.source, result.error);
        assert!(result.value > 0.0);
    }
}

#[tokio::test]
async fn test_history_predictors_fail_cleanly_without_history() {
    let config = Config::default();
    let predictors = PredictorFactory::new().create_all(config.enabled_predictors()).unwrap();
    let input = PredictionInput::builder().target_month(6).build().unwrap();

    let mut failed = Vec::new();
    for predictor in &predictors {
        let result = predictor.predict(&input, Duration::from_secs(1)).await;
        if !result.succeeded {
            assert!(matches!(result.error, Some(PredictorError::InsufficientData { .. })));
            failed.push(result.source);
        }
    }
    assert_eq!(failed, vec!["linear_trend", "seasonal_profile", "appliance_load"]);
}

#[tokio::test]
async fn test_flat_seasonal_index_changes_profile_estimate() {
    let config = Config::default();
    let input = legacy_household();
    let seasonal_spec = config.predictors.iter().find(|spec| spec.name == "seasonal_profile").unwrap();

    let lesco = PredictorFactory::new().create(seasonal_spec).unwrap();
    let flat = PredictorFactory::new().with_seasonal_index(SeasonalIndex::flat()).create(seasonal_spec).unwrap();

    let lesco_value = lesco.predict(&input, Duration::from_secs(1)).await.value;
    let flat_value = flat.predict(&input, Duration::from_secs(1)).await.value;
    assert_eq!(flat_value, 220.0);
    assert!(lesco_value > flat_value);
}
