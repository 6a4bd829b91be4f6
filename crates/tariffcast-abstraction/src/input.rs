//! Typed prediction input.
//!
//! Predictors never see untyped feature maps. Legacy payloads are converted
//! once, at the boundary, by [`PredictionInput::from_legacy_json`].

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::PredictorError;

/// Days in a billing month when converting appliance loads to units.
pub const DAYS_PER_BILLING_MONTH: f64 = 30.0;

/// Daily hours assumed for a legacy appliance given by name only.
const LEGACY_DEFAULT_HOURS: f64 = 8.0;

/// Nameplate wattage the legacy payloads assumed for bare appliance names.
const LEGACY_APPLIANCE_WATTS: &[(&str, f64)] = &[
    ("ac", 1500.0),
    ("fridge", 150.0),
    ("lights", 10.0),
    ("tv", 100.0),
    ("washing", 500.0),
    ("heater", 2000.0),
];

/// Metered consumption for one billing month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReading {
    /// First day of the billing month.
    pub period: NaiveDate,
    /// Units (kWh) consumed in the month.
    pub units: f64,
}

impl MonthlyReading {
    /// Creates a reading for the month containing `period`.
    #[must_use]
    pub fn new(period: NaiveDate, units: f64) -> Self {
        Self { period: first_of_month(period), units }
    }

    /// Calendar month of the reading (1-12).
    #[must_use]
    pub fn month(&self) -> u32 {
        self.period.month()
    }
}

/// A household appliance and how long it runs per day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplianceLoad {
    /// Appliance name.
    pub name: String,
    /// Rated power draw in watts.
    pub watts: f64,
    /// Average daily running time.
    pub hours_per_day: f64,
    /// Number of identical units.
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

impl ApplianceLoad {
    /// Creates a single appliance.
    #[must_use]
    pub fn new(name: impl Into<String>, watts: f64, hours_per_day: f64) -> Self {
        Self { name: name.into(), watts, hours_per_day, quantity: 1 }
    }

    /// Sets the number of identical units.
    #[must_use]
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Units this appliance consumes over a billing month.
    #[must_use]
    pub fn monthly_units(&self) -> f64 {
        self.watts * self.hours_per_day * f64::from(self.quantity) * DAYS_PER_BILLING_MONTH / 1000.0
    }

    fn validate(&self) -> Result<(), PredictorError> {
        if self.name.trim().is_empty() {
            return Err(PredictorError::InvalidInput("appliance name must not be empty".to_string()));
        }
        if !self.watts.is_finite() || self.watts < 0.0 {
            return Err(PredictorError::InvalidInput(format!(
                "appliance '{}' has invalid wattage {}",
                self.name, self.watts
            )));
        }
        if !self.hours_per_day.is_finite() || !(0.0..=24.0).contains(&self.hours_per_day) {
            return Err(PredictorError::InvalidInput(format!(
                "appliance '{}' has invalid daily hours {}",
                self.name, self.hours_per_day
            )));
        }
        if self.quantity == 0 {
            return Err(PredictorError::InvalidInput(format!(
                "appliance '{}' must have a quantity of at least 1",
                self.name
            )));
        }
        Ok(())
    }
}

/// Feature vector handed, unchanged, to every predictor.
///
/// History is ordered oldest to newest with one reading per month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionInput {
    history: Vec<MonthlyReading>,
    target_month: u32,
    appliances: Vec<ApplianceLoad>,
    occupants: Option<u32>,
}

impl PredictionInput {
    /// Starts building a validated input.
    #[must_use]
    pub fn builder() -> PredictionInputBuilder {
        PredictionInputBuilder::default()
    }

    /// Monthly readings, oldest first.
    #[must_use]
    pub fn history(&self) -> &[MonthlyReading] {
        &self.history
    }

    /// Units of every reading, oldest first.
    #[must_use]
    pub fn units(&self) -> Vec<f64> {
        self.history.iter().map(|reading| reading.units).collect()
    }

    /// The most recent `count` readings, oldest first.
    #[must_use]
    pub fn recent(&self, count: usize) -> &[MonthlyReading] {
        &self.history[self.history.len().saturating_sub(count)..]
    }

    /// The newest reading, if any.
    #[must_use]
    pub fn last_reading(&self) -> Option<&MonthlyReading> {
        self.history.last()
    }

    /// Calendar month (1-12) being predicted.
    #[must_use]
    pub fn target_month(&self) -> u32 {
        self.target_month
    }

    /// Declared appliance loads.
    #[must_use]
    pub fn appliances(&self) -> &[ApplianceLoad] {
        &self.appliances
    }

    /// Household size, when known.
    #[must_use]
    pub fn occupants(&self) -> Option<u32> {
        self.occupants
    }

    /// Sum of every appliance's monthly units.
    #[must_use]
    pub fn appliance_units(&self) -> f64 {
        self.appliances.iter().map(ApplianceLoad::monthly_units).sum()
    }

    /// Adapts a legacy untyped payload.
    ///
    /// Recognised keys: `historical_data` (array of `{date, units}`; dates may
    /// be `YYYY-MM-DD` or `YYYY-MM`), `appliances` (bare names from the legacy
    /// wattage table, or `{name, wattage|watts, usage_hours|hours_per_day,
    /// quantity}` objects), `month`, and `occupants` (top level or inside
    /// `house_profile`). Readings without a date are assigned consecutive
    /// months ending the month before `today`; `month` defaults to `today`'s.
    pub fn from_legacy_json(payload: &Value, today: NaiveDate) -> Result<Self, PredictorError> {
        let mut builder = Self::builder();

        let entries = payload.get("historical_data").and_then(Value::as_array).cloned().unwrap_or_default();
        let undated = entries.iter().filter(|entry| entry.get("date").is_none()).count();
        let mut next_undated = first_of_month(today)
            .checked_sub_months(Months::new(u32::try_from(undated).unwrap_or(u32::MAX)))
            .ok_or_else(|| PredictorError::InvalidInput("too many undated readings".to_string()))?;
        for (index, entry) in entries.iter().enumerate() {
            let units = entry.get("units").and_then(Value::as_f64).ok_or_else(|| {
                PredictorError::InvalidInput(format!("historical_data[{index}] has no numeric 'units'"))
            })?;
            let period = match entry.get("date").and_then(Value::as_str) {
                Some(raw) => parse_legacy_date(raw).ok_or_else(|| {
                    PredictorError::InvalidInput(format!("historical_data[{index}] has unparseable date '{raw}'"))
                })?,
                None => {
                    let period = next_undated;
                    next_undated = next_undated
                        .checked_add_months(Months::new(1))
                        .ok_or_else(|| PredictorError::InvalidInput("date out of range".to_string()))?;
                    period
                }
            };
            builder = builder.reading(period, units);
        }

        for (index, entry) in payload.get("appliances").and_then(Value::as_array).into_iter().flatten().enumerate() {
            builder = builder.appliance(legacy_appliance(index, entry)?);
        }

        let month = payload
            .get("month")
            .and_then(Value::as_u64)
            .map_or(Ok(today.month()), |m| {
                u32::try_from(m).map_err(|_| PredictorError::InvalidInput(format!("month {m} is out of range")))
            })?;
        builder = builder.target_month(month);

        let occupants = payload
            .get("occupants")
            .or_else(|| payload.get("house_profile").and_then(|profile| profile.get("occupants")))
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok());
        if let Some(occupants) = occupants {
            builder = builder.occupants(occupants);
        }

        builder.build()
    }
}

/// Builder that validates a [`PredictionInput`].
#[derive(Debug, Clone, Default)]
pub struct PredictionInputBuilder {
    history: Vec<MonthlyReading>,
    target_month: Option<u32>,
    appliances: Vec<ApplianceLoad>,
    occupants: Option<u32>,
}

impl PredictionInputBuilder {
    /// Adds a reading for the month containing `period`.
    #[must_use]
    pub fn reading(mut self, period: NaiveDate, units: f64) -> Self {
        self.history.push(MonthlyReading::new(period, units));
        self
    }

    /// Adds several readings.
    #[must_use]
    pub fn readings(mut self, readings: impl IntoIterator<Item = MonthlyReading>) -> Self {
        self.history.extend(readings.into_iter().map(|r| MonthlyReading::new(r.period, r.units)));
        self
    }

    /// Sets the calendar month to predict.
    #[must_use]
    pub fn target_month(mut self, month: u32) -> Self {
        self.target_month = Some(month);
        self
    }

    /// Adds an appliance load.
    #[must_use]
    pub fn appliance(mut self, appliance: ApplianceLoad) -> Self {
        self.appliances.push(appliance);
        self
    }

    /// Sets the household size.
    #[must_use]
    pub fn occupants(mut self, occupants: u32) -> Self {
        self.occupants = Some(occupants);
        self
    }

    /// Validates and builds the input.
    ///
    /// Readings are sorted by period. Without an explicit target month the
    /// month after the newest reading is predicted.
    pub fn build(mut self) -> Result<PredictionInput, PredictorError> {
        self.history.sort_by_key(|reading| reading.period);

        for reading in &self.history {
            if !reading.units.is_finite() || reading.units < 0.0 {
                return Err(PredictorError::InvalidInput(format!(
                    "reading for {} has invalid units {}",
                    reading.period.format("%Y-%m"),
                    reading.units
                )));
            }
        }
        if let Some(pair) = self.history.windows(2).find(|pair| pair[0].period == pair[1].period) {
            return Err(PredictorError::InvalidInput(format!(
                "duplicate reading for {}",
                pair[0].period.format("%Y-%m")
            )));
        }
        for appliance in &self.appliances {
            appliance.validate()?;
        }

        let target_month = match (self.target_month, self.history.last()) {
            (Some(month), _) => month,
            (None, Some(last)) => last.month() % 12 + 1,
            (None, None) => {
                return Err(PredictorError::InvalidInput(
                    "a target month is required when no history is given".to_string(),
                ));
            }
        };
        if !(1..=12).contains(&target_month) {
            return Err(PredictorError::InvalidInput(format!("target month {target_month} is not in 1..=12")));
        }

        Ok(PredictionInput {
            history: self.history,
            target_month,
            appliances: self.appliances,
            occupants: self.occupants,
        })
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn parse_legacy_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d"))
        .ok()
}

fn legacy_appliance(index: usize, entry: &Value) -> Result<ApplianceLoad, PredictorError> {
    if let Some(name) = entry.as_str() {
        let key = name.trim().to_lowercase();
        let watts = LEGACY_APPLIANCE_WATTS
            .iter()
            .find(|(known, _)| *known == key)
            .map(|(_, watts)| *watts)
            .ok_or_else(|| PredictorError::InvalidInput(format!("unknown appliance '{name}'")))?;
        return Ok(ApplianceLoad::new(key, watts, LEGACY_DEFAULT_HOURS));
    }

    let name = entry
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| PredictorError::InvalidInput(format!("appliances[{index}] has no 'name'")))?;
    let watts = entry
        .get("wattage")
        .or_else(|| entry.get("watts"))
        .and_then(Value::as_f64)
        .ok_or_else(|| PredictorError::InvalidInput(format!("appliance '{name}' has no wattage")))?;
    let hours = entry
        .get("usage_hours")
        .or_else(|| entry.get("hours_per_day"))
        .and_then(Value::as_f64)
        .unwrap_or(0.0);
    let quantity = entry
        .get("quantity")
        .and_then(Value::as_u64)
        .map_or(Ok(1), |q| {
            u32::try_from(q).map_err(|_| PredictorError::InvalidInput(format!("appliance '{name}' quantity too large")))
        })?;

    Ok(ApplianceLoad::new(name, watts, hours).with_quantity(quantity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_builder_sorts_and_defaults_target_month() {
        let input = PredictionInput::builder()
            .reading(date(2025, 3, 1), 300.0)
            .reading(date(2025, 1, 15), 250.0)
            .reading(date(2025, 2, 1), 270.0)
            .build()
            .unwrap();

        assert_eq!(input.units(), vec![250.0, 270.0, 300.0]);
        assert_eq!(input.history()[0].period, date(2025, 1, 1));
        assert_eq!(input.target_month(), 4);
        assert_eq!(input.recent(2)[0].units, 270.0);
        assert_eq!(input.recent(2)[1].units, 300.0);
        assert_eq!(input.recent(10).len(), 3);
    }

    #[test]
    fn test_builder_wraps_target_month_after_december() {
        let input = PredictionInput::builder().reading(date(2024, 12, 1), 410.0).build().unwrap();
        assert_eq!(input.target_month(), 1);
    }

    #[test]
    fn test_builder_rejects_bad_readings() {
        let negative = PredictionInput::builder().reading(date(2025, 1, 1), -3.0).build();
        assert!(matches!(negative, Err(PredictorError::InvalidInput(_))));

        let nan = PredictionInput::builder().reading(date(2025, 1, 1), f64::NAN).build();
        assert!(nan.is_err());

        let duplicate = PredictionInput::builder()
            .reading(date(2025, 1, 1), 100.0)
            .reading(date(2025, 1, 20), 120.0)
            .build();
        assert!(duplicate.is_err());
    }

    #[test]
    fn test_builder_requires_target_month_without_history() {
        assert!(PredictionInput::builder().build().is_err());
        assert!(PredictionInput::builder().target_month(13).build().is_err());
        assert!(PredictionInput::builder().target_month(7).build().is_ok());
    }

    #[test]
    fn test_appliance_monthly_units() {
        let ac = ApplianceLoad::new("ac", 1500.0, 8.0).with_quantity(2);
        assert!((ac.monthly_units() - 720.0).abs() < 1e-9);

        let input = PredictionInput::builder()
            .target_month(6)
            .appliance(ac)
            .appliance(ApplianceLoad::new("fridge", 150.0, 24.0))
            .build()
            .unwrap();
        assert!((input.appliance_units() - 828.0).abs() < 1e-9);
    }

    #[test]
    fn test_builder_rejects_bad_appliance() {
        let result = PredictionInput::builder()
            .target_month(6)
            .appliance(ApplianceLoad::new("ac", 1500.0, 30.0))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_legacy_payload_with_dates() {
        let payload = json!({
            "historical_data": [
                {"date": "2023-08-01", "units": 245, "bill_amount": 4580},
                {"date": "2023-09", "units": 267},
                {"date": "2023-10-01", "units": 231}
            ],
            "appliances": ["ac", {"name": "iron", "wattage": 1000, "usage_hours": 0.5, "quantity": 1}],
            "house_profile": {"occupants": 5},
            "month": 11
        });

        let input = PredictionInput::from_legacy_json(&payload, date(2023, 11, 3)).unwrap();
        assert_eq!(input.units(), vec![245.0, 267.0, 231.0]);
        assert_eq!(input.history()[1].period, date(2023, 9, 1));
        assert_eq!(input.target_month(), 11);
        assert_eq!(input.occupants(), Some(5));
        assert_eq!(input.appliances().len(), 2);
        assert_eq!(input.appliances()[0].watts, 1500.0);
        assert_eq!(input.appliances()[0].hours_per_day, 8.0);
    }

    #[test]
    fn test_legacy_payload_without_dates_uses_preceding_months() {
        let payload = json!({
            "historical_data": [{"units": 300, "amount": 50.0}, {"units": 320, "amount": 55.0}]
        });

        let input = PredictionInput::from_legacy_json(&payload, date(2025, 3, 14)).unwrap();
        assert_eq!(input.history()[0].period, date(2025, 1, 1));
        assert_eq!(input.history()[1].period, date(2025, 2, 1));
        assert_eq!(input.target_month(), 3);
    }

    #[test]
    fn test_legacy_payload_rejects_unknown_appliance() {
        let payload = json!({"appliances": ["jacuzzi"], "month": 5});
        assert!(PredictionInput::from_legacy_json(&payload, date(2025, 5, 1)).is_err());
    }

    #[test]
    fn test_legacy_payload_rejects_missing_units() {
        let payload = json!({"historical_data": [{"date": "2025-01-01"}]});
        assert!(PredictionInput::from_legacy_json(&payload, date(2025, 2, 1)).is_err());
    }
}
