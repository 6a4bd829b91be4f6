//! Remote model service predictor.
//!
//! The service receives the prediction input as JSON and answers with
//! `{"predicted_units": <number>}`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tariffcast_abstraction::{PlausibleBounds, PredictionInput, Predictor, PredictorError};
use tracing::{debug, error};

/// Predictor backed by an HTTP model endpoint.
#[derive(Debug, Clone)]
pub struct RemotePredictor {
    name: String,
    endpoint: String,
    client: Client,
    bounds: PlausibleBounds,
}

#[derive(Deserialize)]
struct RemoteResponse {
    predicted_units: f64,
}

impl RemotePredictor {
    /// Creates a predictor posting to `endpoint`.
    ///
    /// # Errors
    /// Returns a `PredictorError` if the HTTP client cannot be created.
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Result<Self, PredictorError> {
        let client = Client::builder()
            .build()
            .map_err(|e| PredictorError::Remote(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { name: name.into(), endpoint: endpoint.into(), client, bounds: PlausibleBounds::default() })
    }

    /// Overrides the plausible range.
    #[must_use]
    pub const fn with_bounds(mut self, bounds: PlausibleBounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// The endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Predictor for RemotePredictor {
    fn name(&self) -> &str {
        &self.name
    }

    fn bounds(&self) -> PlausibleBounds {
        self.bounds
    }

    async fn estimate(&self, input: &PredictionInput) -> Result<f64, PredictorError> {
        debug!(predictor = %self.name, endpoint = %self.endpoint, "Requesting remote prediction");

        let response = self.client.post(&self.endpoint).json(input).send().await.map_err(|e| {
            error!(predictor = %self.name, error = %e, endpoint = %self.endpoint, "Remote model unreachable");
            if e.is_connect() {
                PredictorError::Remote(format!("model service not reachable at {}", self.endpoint))
            } else {
                PredictorError::Remote(format!("network error: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(predictor = %self.name, status = %status, body = %body, "Remote model returned error status");
            return Err(PredictorError::Remote(format!("HTTP {status}: {body}")));
        }

        let payload: RemoteResponse = response
            .json()
            .await
            .map_err(|e| PredictorError::Remote(format!("unreadable response: {e}")))?;
        debug!(predictor = %self.name, predicted_units = payload.predicted_units, "Remote prediction received");
        Ok(payload.predicted_units)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::NaiveDate;
    use mockito::Matcher;

    use super::*;

    fn input() -> PredictionInput {
        PredictionInput::builder()
            .reading(NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(), 310.0)
            .target_month(5)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_remote_prediction_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/predict")
            .match_body(Matcher::PartialJson(serde_json::json!({ "target_month": 5 })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"predicted_units": 342.5}"#)
            .create_async()
            .await;

        let predictor = RemotePredictor::new("service", format!("{}/predict", server.url())).unwrap();
        let result = predictor.predict(&input(), Duration::from_secs(5)).await;

        assert!(result.succeeded, "unexpected failure: {:?}", result.error);
        assert_eq!(result.value, 342.5);
        assert_eq!(result.source, "service");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_remote_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/predict")
            .with_status(503)
            .with_body("model loading")
            .create_async()
            .await;

        let predictor = RemotePredictor::new("service", format!("{}/predict", server.url())).unwrap();
        let err = predictor.estimate(&input()).await.unwrap_err();
        match err {
            PredictorError::Remote(message) => {
                assert!(message.contains("503"));
                assert!(message.contains("model loading"));
            }
            other => panic!("Expected Remote error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_remote_malformed_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/predict")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"units": 12}"#)
            .create_async()
            .await;

        let predictor = RemotePredictor::new("service", format!("{}/predict", server.url())).unwrap();
        assert!(matches!(predictor.estimate(&input()).await, Err(PredictorError::Remote(_))));
    }

    #[tokio::test]
    async fn test_remote_implausible_value_fails_result() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/predict")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"predicted_units": 125000.0}"#)
            .create_async()
            .await;

        let predictor = RemotePredictor::new("service", format!("{}/predict", server.url())).unwrap();
        let result = predictor.predict(&input(), Duration::from_secs(5)).await;
        assert!(!result.succeeded);
        assert!(matches!(result.error, Some(PredictorError::ImplausibleValue { .. })));
    }
}
