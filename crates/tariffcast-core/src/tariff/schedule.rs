//! Validated tariff schedules.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::slab::Slab;
use crate::error::InvalidScheduleError;

/// An immutable, validated progressive tariff.
///
/// A `TariffSchedule` can only be obtained through [`TariffScheduleBuilder::build`]
/// or deserialization, both of which run [`TariffSchedule::validate`]. Once
/// built it is never modified; a rate change is a new schedule with a later
/// `effective_from`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ScheduleDefinition", into = "ScheduleDefinition")]
pub struct TariffSchedule {
    name: String,
    effective_from: NaiveDate,
    currency: String,
    slabs: Vec<Slab>,
    fixed_service_charge: f64,
    tax_rates: BTreeMap<String, f64>,
    off_peak_discount_rate: Option<f64>,
    fees: BTreeMap<String, f64>,
}

impl TariffSchedule {
    /// Starts building a schedule.
    #[must_use]
    pub fn builder(name: impl Into<String>, effective_from: NaiveDate) -> TariffScheduleBuilder {
        TariffScheduleBuilder::new(name, effective_from)
    }

    /// Schedule name, shared by every version of the same tariff.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// First day this version applies.
    #[must_use]
    pub fn effective_from(&self) -> NaiveDate {
        self.effective_from
    }

    /// ISO currency code of every amount in the schedule.
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Slabs in ascending order; the last one is unbounded.
    #[must_use]
    pub fn slabs(&self) -> &[Slab] {
        &self.slabs
    }

    /// Flat monthly charge billed regardless of consumption.
    #[must_use]
    pub fn fixed_service_charge(&self) -> f64 {
        self.fixed_service_charge
    }

    /// Named tax percentages applied to the discounted energy charge.
    #[must_use]
    pub fn tax_rates(&self) -> &BTreeMap<String, f64> {
        &self.tax_rates
    }

    /// Fraction (0-1) taken off the off-peak share of the energy charge.
    #[must_use]
    pub fn off_peak_discount_rate(&self) -> Option<f64> {
        self.off_peak_discount_rate
    }

    /// Named flat fees billed only when something was consumed.
    #[must_use]
    pub fn fees(&self) -> &BTreeMap<String, f64> {
        &self.fees
    }

    /// Checks every structural invariant of the schedule.
    ///
    /// Slabs must start at unit 1, be contiguous and non-overlapping, carry
    /// finite non-negative rates, and end with exactly one unbounded slab.
    pub fn validate(&self) -> Result<(), InvalidScheduleError> {
        if self.name.trim().is_empty() {
            return Err(InvalidScheduleError::EmptyName);
        }
        let schedule = || self.name.clone();

        if self.currency.trim().is_empty() {
            return Err(InvalidScheduleError::EmptyCurrency { schedule: schedule() });
        }

        let Some(first) = self.slabs.first() else {
            return Err(InvalidScheduleError::NoSlabs { schedule: schedule() });
        };
        if first.lower_bound != 1 {
            return Err(InvalidScheduleError::FirstSlabStart {
                schedule: schedule(),
                lower_bound: first.lower_bound,
            });
        }

        let last_index = self.slabs.len() - 1;
        for (index, slab) in self.slabs.iter().enumerate() {
            if !slab.rate_per_unit.is_finite() || slab.rate_per_unit < 0.0 {
                return Err(InvalidScheduleError::InvalidRate {
                    schedule: schedule(),
                    index,
                    rate: slab.rate_per_unit,
                });
            }

            let Some(upper_bound) = slab.upper_bound else {
                if index != last_index {
                    return Err(InvalidScheduleError::UnboundedNotLast { schedule: schedule(), index });
                }
                continue;
            };
            if upper_bound < slab.lower_bound {
                return Err(InvalidScheduleError::InvertedSlab {
                    schedule: schedule(),
                    index,
                    lower_bound: slab.lower_bound,
                    upper_bound,
                });
            }

            let Some(next) = self.slabs.get(index + 1) else {
                return Err(InvalidScheduleError::MissingUnboundedSlab { schedule: schedule() });
            };
            let expected = u64::from(upper_bound) + 1;
            let next_lower_bound = u64::from(next.lower_bound);
            if next_lower_bound < expected {
                return Err(InvalidScheduleError::Overlapping {
                    schedule: schedule(),
                    index,
                    upper_bound,
                    next_lower_bound: next.lower_bound,
                });
            }
            if next_lower_bound > expected {
                return Err(InvalidScheduleError::NonContiguous {
                    schedule: schedule(),
                    index,
                    upper_bound,
                    next_lower_bound: next.lower_bound,
                });
            }
        }

        if !is_non_negative(self.fixed_service_charge) {
            return Err(InvalidScheduleError::InvalidServiceCharge {
                schedule: schedule(),
                amount: self.fixed_service_charge,
            });
        }

        for (tax, &rate) in &self.tax_rates {
            if tax.trim().is_empty() || !rate.is_finite() || !(0.0..=100.0).contains(&rate) {
                return Err(InvalidScheduleError::InvalidTaxRate { schedule: schedule(), tax: tax.clone(), rate });
            }
        }

        if let Some(rate) = self.off_peak_discount_rate {
            if !rate.is_finite() || !(0.0..=1.0).contains(&rate) {
                return Err(InvalidScheduleError::InvalidOffPeakRate { schedule: schedule(), rate });
            }
        }

        for (fee, &amount) in &self.fees {
            if fee.trim().is_empty() || !is_non_negative(amount) {
                return Err(InvalidScheduleError::InvalidFee { schedule: schedule(), fee: fee.clone(), amount });
            }
        }

        Ok(())
    }
}

fn is_non_negative(amount: f64) -> bool {
    amount.is_finite() && amount >= 0.0
}

/// Builder for [`TariffSchedule`].
#[derive(Debug, Clone)]
pub struct TariffScheduleBuilder {
    name: String,
    effective_from: NaiveDate,
    currency: String,
    slabs: Vec<Slab>,
    fixed_service_charge: f64,
    tax_rates: BTreeMap<String, f64>,
    off_peak_discount_rate: Option<f64>,
    fees: BTreeMap<String, f64>,
}

impl TariffScheduleBuilder {
    /// Creates an empty builder. The currency defaults to `PKR`.
    #[must_use]
    pub fn new(name: impl Into<String>, effective_from: NaiveDate) -> Self {
        Self {
            name: name.into(),
            effective_from,
            currency: "PKR".to_string(),
            slabs: Vec::new(),
            fixed_service_charge: 0.0,
            tax_rates: BTreeMap::new(),
            off_peak_discount_rate: None,
            fees: BTreeMap::new(),
        }
    }

    /// Sets the currency code.
    #[must_use]
    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Appends a slab.
    #[must_use]
    pub fn slab(mut self, slab: Slab) -> Self {
        self.slabs.push(slab);
        self
    }

    /// Sets the flat monthly service charge.
    #[must_use]
    pub fn service_charge(mut self, amount: f64) -> Self {
        self.fixed_service_charge = amount;
        self
    }

    /// Adds a named tax, as a percentage of the discounted energy charge.
    #[must_use]
    pub fn tax(mut self, name: impl Into<String>, percent: f64) -> Self {
        self.tax_rates.insert(name.into(), percent);
        self
    }

    /// Sets the off-peak discount rate (0-1).
    #[must_use]
    pub fn off_peak_discount(mut self, rate: f64) -> Self {
        self.off_peak_discount_rate = Some(rate);
        self
    }

    /// Adds a named flat fee billed when consumption is positive.
    #[must_use]
    pub fn fee(mut self, name: impl Into<String>, amount: f64) -> Self {
        self.fees.insert(name.into(), amount);
        self
    }

    /// Validates and builds the schedule.
    pub fn build(self) -> Result<TariffSchedule, InvalidScheduleError> {
        let schedule = TariffSchedule {
            name: self.name,
            effective_from: self.effective_from,
            currency: self.currency,
            slabs: self.slabs,
            fixed_service_charge: self.fixed_service_charge,
            tax_rates: self.tax_rates,
            off_peak_discount_rate: self.off_peak_discount_rate,
            fees: self.fees,
        };
        schedule.validate()?;
        Ok(schedule)
    }
}

/// Serialized shape of a schedule, as written in tariff TOML files.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScheduleDefinition {
    name: String,
    effective_from: NaiveDate,
    #[serde(default = "default_currency")]
    currency: String,
    slabs: Vec<Slab>,
    #[serde(default)]
    fixed_service_charge: f64,
    #[serde(default)]
    tax_rates: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    off_peak_discount_rate: Option<f64>,
    #[serde(default)]
    fees: BTreeMap<String, f64>,
}

fn default_currency() -> String {
    "PKR".to_string()
}

impl TryFrom<ScheduleDefinition> for TariffSchedule {
    type Error = InvalidScheduleError;

    fn try_from(definition: ScheduleDefinition) -> Result<Self, Self::Error> {
        let schedule = TariffSchedule {
            name: definition.name,
            effective_from: definition.effective_from,
            currency: definition.currency,
            slabs: definition.slabs,
            fixed_service_charge: definition.fixed_service_charge,
            tax_rates: definition.tax_rates,
            off_peak_discount_rate: definition.off_peak_discount_rate,
            fees: definition.fees,
        };
        schedule.validate()?;
        Ok(schedule)
    }
}

impl From<TariffSchedule> for ScheduleDefinition {
    fn from(schedule: TariffSchedule) -> Self {
        Self {
            name: schedule.name,
            effective_from: schedule.effective_from,
            currency: schedule.currency,
            slabs: schedule.slabs,
            fixed_service_charge: schedule.fixed_service_charge,
            tax_rates: schedule.tax_rates,
            off_peak_discount_rate: schedule.off_peak_discount_rate,
            fees: schedule.fees,
        }
    }
}
