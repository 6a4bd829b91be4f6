//! Configuration module for Tariffcast.
//!
//! Configuration is a single TOML document. Every section is optional and
//! falls back to defaults; the whole document is validated after parsing.
//!
//! ```toml
//! [ensemble]
//! timeout_ms = 1500
//! [ensemble.weights]
//! linear_trend = 2.0
//!
//! [[predictors]]
//! name = "linear_trend"
//! kind = "linear_trend"
//!
//! [tariffs]
//! files = ["tariffs/k-electric.toml"]
//! ```

mod ensemble;
mod predictors;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use ensemble::{ConfidenceSettings, EnsembleSettings, FallbackSettings};
pub use predictors::{PredictorKind, PredictorSpec};

use crate::error::{ConfigError, Result};
use crate::tariff::TariffRegistry;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "TARIFFCAST_CONFIG";

/// Where tariff schedules are loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TariffSources {
    /// Load the schedules shipped with the crate.
    #[serde(default = "default_true")]
    pub include_builtin: bool,

    /// Additional tariff TOML files.
    #[serde(default)]
    pub files: Vec<PathBuf>,
}

impl Default for TariffSources {
    fn default() -> Self {
        Self { include_builtin: true, files: Vec::new() }
    }
}

fn default_true() -> bool {
    true
}

/// Root configuration for Tariffcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Ensemble deadline, range and weights.
    #[serde(default)]
    pub ensemble: EnsembleSettings,

    /// Confidence coefficients.
    #[serde(default)]
    pub confidence: ConfidenceSettings,

    /// Fallback heuristic.
    #[serde(default)]
    pub fallback: FallbackSettings,

    /// Predictor registry entries.
    #[serde(default = "PredictorSpec::defaults")]
    pub predictors: Vec<PredictorSpec>,

    /// Tariff schedule sources.
    #[serde(default)]
    pub tariffs: TariffSources,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ensemble: EnsembleSettings::default(),
            confidence: ConfidenceSettings::default(),
            fallback: FallbackSettings::default(),
            predictors: PredictorSpec::defaults(),
            tariffs: TariffSources::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the file named by `TARIFFCAST_CONFIG`, or defaults when unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the named file cannot be read, parsed or validated.
    pub fn load() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) if !path.is_empty() => Self::from_path(Path::new(&path)),
            _ => {
                debug!("{CONFIG_ENV_VAR} not set, using default configuration");
                Ok(Self::default())
            }
        }
    }

    /// Loads and validates a configuration file.
    ///
    /// Relative tariff file paths are resolved against the file's directory.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;
        if let Some(dir) = path.parent() {
            for file in &mut config.tariffs.files {
                if file.is_relative() {
                    *file = dir.join(&*file);
                }
            }
        }
        info!(path = %path.display(), predictors = config.predictors.len(), "Loaded configuration");
        Ok(config)
    }

    /// Parses and validates a configuration document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        self.ensemble.validate()?;
        self.confidence.validate()?;
        self.fallback.validate()?;

        let mut names = BTreeSet::new();
        for spec in &self.predictors {
            if spec.name.trim().is_empty() {
                return Err(ConfigError::Validation("predictor name must not be empty".to_string()));
            }
            if !names.insert(spec.name.as_str()) {
                return Err(ConfigError::Validation(format!("predictor '{}' is defined more than once", spec.name)));
            }
            if spec.kind == PredictorKind::Remote && spec.endpoint.as_deref().is_none_or(str::is_empty) {
                return Err(ConfigError::Validation(format!("remote predictor '{}' needs an endpoint", spec.name)));
            }
            if let (Some(min), Some(max)) = (spec.min_units, spec.max_units) {
                if min > max {
                    return Err(ConfigError::Validation(format!(
                        "predictor '{}' has min_units {min} above max_units {max}",
                        spec.name
                    )));
                }
            }
        }

        if !self.tariffs.include_builtin && self.tariffs.files.is_empty() {
            return Err(ConfigError::Validation(
                "tariffs.include_builtin is false and no tariff files are listed".to_string(),
            ));
        }
        Ok(())
    }

    /// Enabled predictor entries, in configuration order.
    pub fn enabled_predictors(&self) -> impl Iterator<Item = &PredictorSpec> {
        self.predictors.iter().filter(|spec| spec.enabled)
    }

    /// Builds the tariff registry from the configured sources.
    pub fn tariff_registry(&self) -> Result<TariffRegistry> {
        let mut registry =
            if self.tariffs.include_builtin { TariffRegistry::builtin()? } else { TariffRegistry::new() };
        for file in &self.tariffs.files {
            registry.load_file(file)?;
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.predictors.len(), 3);
        assert!(config.tariffs.include_builtin);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_document_is_default() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_deserialize_full() {
        let config = Config::from_toml_str(
            r#"
            [ensemble]
            timeout_ms = 750
            max_units = 2500.0
            min_successes = 2
            [ensemble.weights]
            linear_trend = 2.0

            [confidence]
            ceiling = 90.0

            [fallback]
            window = 2
            seasonal_adjustment = false

            [[predictors]]
            name = "trend"
            kind = "linear_trend"

            [[predictors]]
            name = "service"
            kind = "remote"
            endpoint = "http://127.0.0.1:9000/predict"
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.ensemble.timeout_ms, 750);
        assert_eq!(config.ensemble.min_successes, 2);
        assert_eq!(config.ensemble.weight_for("linear_trend"), 2.0);
        assert_eq!(config.confidence.ceiling, 90.0);
        assert_eq!(config.confidence.base, 40.0);
        assert_eq!(config.fallback.window, 2);
        assert!(!config.fallback.seasonal_adjustment);
        assert_eq!(config.predictors.len(), 2);
        assert_eq!(config.enabled_predictors().count(), 1);
    }

    #[test]
    fn test_duplicate_predictor_names_rejected() {
        let err = Config::from_toml_str(
            r#"
            [[predictors]]
            name = "a"
            kind = "mock"
            [[predictors]]
            name = "a"
            kind = "linear_trend"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("defined more than once"));
    }

    #[test]
    fn test_remote_requires_endpoint() {
        let err = Config::from_toml_str("[[predictors]]\nname = \"r\"\nkind = \"remote\"").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_unknown_kind_is_toml_error() {
        let err = Config::from_toml_str("[[predictors]]\nname = \"n\"\nkind = \"neural\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_no_tariff_source_rejected() {
        let err = Config::from_toml_str("[tariffs]\ninclude_builtin = false").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_tariff_registry_from_default_config() {
        let registry = Config::default().tariff_registry().unwrap();
        assert!(registry.latest("lesco-domestic").is_some());
    }
}
