//! Predictor registry entries.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of predictor a registry entry builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictorKind {
    /// Least-squares trend over the reading history.
    LinearTrend,
    /// Seasonally normalized average of the history.
    SeasonalProfile,
    /// Estimate from declared appliance loads.
    ApplianceLoad,
    /// Remote model service over HTTP.
    Remote,
    /// Constant value, for development and tests.
    Mock,
}

impl PredictorKind {
    /// Configuration name of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LinearTrend => "linear_trend",
            Self::SeasonalProfile => "seasonal_profile",
            Self::ApplianceLoad => "appliance_load",
            Self::Remote => "remote",
            Self::Mock => "mock",
        }
    }
}

impl fmt::Display for PredictorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PredictorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "linear_trend" | "trend" => Ok(Self::LinearTrend),
            "seasonal_profile" | "seasonal" => Ok(Self::SeasonalProfile),
            "appliance_load" | "appliance" => Ok(Self::ApplianceLoad),
            "remote" => Ok(Self::Remote),
            "mock" => Ok(Self::Mock),
            other => Err(format!("unknown predictor kind '{other}'")),
        }
    }
}

/// One `[[predictors]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorSpec {
    /// Source name reported in results and used for weights.
    pub name: String,

    /// What to build.
    pub kind: PredictorKind,

    /// Disabled entries are skipped.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Endpoint URL for `remote` predictors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Constant output of `mock` predictors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,

    /// Override of the predictor's minimum history length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_history: Option<usize>,

    /// Override of the lower plausible bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_units: Option<f64>,

    /// Override of the upper plausible bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_units: Option<f64>,
}

fn default_true() -> bool {
    true
}

impl PredictorSpec {
    /// Creates an enabled entry with no overrides.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: PredictorKind) -> Self {
        Self {
            name: name.into(),
            kind,
            enabled: true,
            endpoint: None,
            value: None,
            min_history: None,
            min_units: None,
            max_units: None,
        }
    }

    /// Sets the endpoint URL.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the constant value.
    #[must_use]
    pub const fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    /// Predictors registered when the configuration lists none.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        [PredictorKind::LinearTrend, PredictorKind::SeasonalProfile, PredictorKind::ApplianceLoad]
            .into_iter()
            .map(|kind| Self::new(kind.as_str(), kind))
            .collect()
    }
}
