//! Versioned registry of tariff schedules.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info};

use super::schedule::TariffSchedule;
use crate::error::{ConfigError, Result};

/// Built-in LESCO domestic schedules.
const BUILTIN_LESCO_DOMESTIC: &str = include_str!("../../tariffs/lesco_domestic.toml");

/// Shape of a tariff file: any number of `[[schedules]]` entries.
#[derive(Debug, Deserialize)]
struct TariffFile {
    #[serde(default)]
    schedules: Vec<TariffSchedule>,
}

/// Registry of tariff schedules keyed by name and effective date.
///
/// Loaded once at startup and shared read-only afterwards. Looking up a
/// schedule for a date returns the newest version that took effect on or
/// before that date.
#[derive(Debug, Clone, Default)]
pub struct TariffRegistry {
    schedules: BTreeMap<String, BTreeMap<NaiveDate, Arc<TariffSchedule>>>,
}

impl TariffRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the schedules shipped with the crate.
    pub fn builtin() -> Result<Self> {
        let mut registry = Self::new();
        registry.load_toml_str(BUILTIN_LESCO_DOMESTIC)?;
        Ok(registry)
    }

    /// Adds a schedule version.
    ///
    /// # Errors
    /// Returns `ConfigError::DuplicateTariff` if a version with the same name
    /// and effective date is already registered.
    pub fn insert(&mut self, schedule: TariffSchedule) -> Result<()> {
        let versions = self.schedules.entry(schedule.name().to_string()).or_default();
        if versions.contains_key(&schedule.effective_from()) {
            return Err(ConfigError::DuplicateTariff {
                name: schedule.name().to_string(),
                effective_from: schedule.effective_from(),
            });
        }
        debug!(
            tariff = %schedule.name(),
            effective_from = %schedule.effective_from(),
            slabs = schedule.slabs().len(),
            "Registered tariff schedule"
        );
        versions.insert(schedule.effective_from(), Arc::new(schedule));
        Ok(())
    }

    /// Parses a tariff TOML document and registers every schedule in it.
    ///
    /// Returns the number of schedules added. Nothing is registered if any
    /// schedule in the document is invalid or duplicated.
    pub fn load_toml_str(&mut self, content: &str) -> Result<usize> {
        let file: TariffFile = toml::from_str(content)?;
        let mut staged = self.clone();
        let count = file.schedules.len();
        for schedule in file.schedules {
            staged.insert(schedule)?;
        }
        *self = staged;
        Ok(count)
    }

    /// Reads a tariff TOML file and registers every schedule in it.
    pub fn load_file(&mut self, path: &Path) -> Result<usize> {
        let content = std::fs::read_to_string(path)?;
        let count = self.load_toml_str(&content)?;
        info!(path = %path.display(), schedules = count, "Loaded tariff file");
        Ok(count)
    }

    /// Returns the version of `name` in effect on `date`.
    pub fn effective_on(&self, name: &str, date: NaiveDate) -> Result<Arc<TariffSchedule>> {
        self.schedules
            .get(name)
            .and_then(|versions| versions.range(..=date).next_back())
            .map(|(_, schedule)| Arc::clone(schedule))
            .ok_or_else(|| ConfigError::UnknownTariff { name: name.to_string(), date })
    }

    /// Returns the most recent version of `name`.
    pub fn latest(&self, name: &str) -> Option<Arc<TariffSchedule>> {
        self.schedules
            .get(name)
            .and_then(|versions| versions.values().next_back())
            .map(Arc::clone)
    }

    /// Names of every registered tariff, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schedules.keys().map(String::as_str)
    }

    /// Every version of `name`, oldest first.
    #[must_use]
    pub fn versions(&self, name: &str) -> Vec<Arc<TariffSchedule>> {
        self.schedules
            .get(name)
            .map(|versions| versions.values().map(Arc::clone).collect())
            .unwrap_or_default()
    }

    /// Total number of schedule versions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.schedules.values().map(BTreeMap::len).sum()
    }

    /// Returns true if no schedule is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }
}
