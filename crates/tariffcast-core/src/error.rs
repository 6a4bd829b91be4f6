//! Error types for Tariffcast Core.

use chrono::NaiveDate;
use thiserror::Error;

/// A malformed tariff schedule.
///
/// Raised when a schedule is built or loaded, never during billing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidScheduleError {
    /// The schedule has no name.
    #[error("Tariff schedule name must not be empty")]
    EmptyName,

    /// The schedule has no currency code.
    #[error("Tariff schedule '{schedule}' has no currency")]
    EmptyCurrency {
        /// Schedule name.
        schedule: String,
    },

    /// The schedule has no slabs at all.
    #[error("Tariff schedule '{schedule}' has no slabs")]
    NoSlabs {
        /// Schedule name.
        schedule: String,
    },

    /// The first slab does not start at the first unit.
    #[error("First slab of '{schedule}' must start at unit 1, found {lower_bound}")]
    FirstSlabStart {
        /// Schedule name.
        schedule: String,
        /// The first slab's lower bound.
        lower_bound: u32,
    },

    /// A bounded slab ends before it starts.
    #[error("Slab {index} of '{schedule}' has upper bound {upper_bound} below lower bound {lower_bound}")]
    InvertedSlab {
        /// Schedule name.
        schedule: String,
        /// Slab position.
        index: usize,
        /// Slab lower bound.
        lower_bound: u32,
        /// Slab upper bound.
        upper_bound: u32,
    },

    /// Two adjacent slabs cover the same units.
    #[error("Slab {index} of '{schedule}' overlaps the next slab: it ends at {upper_bound}, next starts at {next_lower_bound}")]
    Overlapping {
        /// Schedule name.
        schedule: String,
        /// Position of the first slab of the pair.
        index: usize,
        /// Upper bound of the first slab.
        upper_bound: u32,
        /// Lower bound of the following slab.
        next_lower_bound: u32,
    },

    /// Units between two adjacent slabs are not covered.
    #[error("Gap after slab {index} of '{schedule}': slab ends at {upper_bound}, next starts at {next_lower_bound}")]
    NonContiguous {
        /// Schedule name.
        schedule: String,
        /// Position of the first slab of the pair.
        index: usize,
        /// Upper bound of the first slab.
        upper_bound: u32,
        /// Lower bound of the following slab.
        next_lower_bound: u32,
    },

    /// A slab rate is negative or not a number.
    #[error("Slab {index} of '{schedule}' has invalid rate {rate}")]
    InvalidRate {
        /// Schedule name.
        schedule: String,
        /// Slab position.
        index: usize,
        /// The rejected rate.
        rate: f64,
    },

    /// An unbounded slab appears before the end of the table.
    #[error("Unbounded slab {index} of '{schedule}' must be the last slab")]
    UnboundedNotLast {
        /// Schedule name.
        schedule: String,
        /// Slab position.
        index: usize,
    },

    /// The table ends with a bounded slab.
    #[error("Tariff schedule '{schedule}' has no terminal unbounded slab")]
    MissingUnboundedSlab {
        /// Schedule name.
        schedule: String,
    },

    /// The fixed service charge is negative or not a number.
    #[error("Tariff schedule '{schedule}' has invalid service charge {amount}")]
    InvalidServiceCharge {
        /// Schedule name.
        schedule: String,
        /// The rejected amount.
        amount: f64,
    },

    /// A tax rate is outside 0-100 percent, or unnamed.
    #[error("Tax '{tax}' of '{schedule}' has invalid rate {rate}% (expected 0-100)")]
    InvalidTaxRate {
        /// Schedule name.
        schedule: String,
        /// Tax name.
        tax: String,
        /// The rejected percentage.
        rate: f64,
    },

    /// The off-peak discount rate is outside 0-1.
    #[error("Tariff schedule '{schedule}' has off-peak discount rate {rate} outside 0..=1")]
    InvalidOffPeakRate {
        /// Schedule name.
        schedule: String,
        /// The rejected rate.
        rate: f64,
    },

    /// A flat fee is negative, not a number, or unnamed.
    #[error("Fee '{fee}' of '{schedule}' has invalid amount {amount}")]
    InvalidFee {
        /// Schedule name.
        schedule: String,
        /// Fee name.
        fee: String,
        /// The rejected amount.
        amount: f64,
    },
}

/// A bill request the calculator refuses to process.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BillingError {
    /// A consumption figure is negative or not a finite number.
    #[error("Invalid {field} {value}: {reason}")]
    InvalidArgument {
        /// Name of the rejected argument.
        field: &'static str,
        /// The rejected value.
        value: f64,
        /// Why it was rejected.
        reason: &'static str,
    },
}

/// Errors that can occur during configuration loading or validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading a configuration or tariff file.
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("Failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// A tariff schedule failed validation.
    #[error("Invalid tariff schedule: {0}")]
    Schedule(#[from] InvalidScheduleError),

    /// Any other validation failure.
    #[error("Invalid configuration: {0}")]
    Validation(String),

    /// No schedule with this name is in effect on the requested date.
    #[error("No tariff '{name}' is in effect on {date}")]
    UnknownTariff {
        /// Requested schedule name.
        name: String,
        /// Requested date.
        date: NaiveDate,
    },

    /// Two schedules share a name and effective date.
    #[error("Tariff '{name}' effective {effective_from} is defined more than once")]
    DuplicateTariff {
        /// Schedule name.
        name: String,
        /// Shared effective date.
        effective_from: NaiveDate,
    },
}

/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
