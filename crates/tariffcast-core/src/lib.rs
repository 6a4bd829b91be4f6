//! Tariffcast Core - tariff schedules, billing and configuration.
//!
//! This crate provides:
//! - validated, versioned progressive tariff schedules
//! - the bill calculator that turns consumption into an itemized bill
//! - the TOML configuration surface shared by the predictor crates
//!
//! # Example
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use tariffcast_core::{BillCalculator, TariffRegistry};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = TariffRegistry::builtin()?;
//!     let on = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap_or_default();
//!     let schedule = registry.effective_on("lesco-domestic", on)?;
//!     let bill = BillCalculator::new().calculate(&schedule, 320.0, 80.0)?;
//!     println!("{} {}", bill.total_due, bill.currency);
//!     Ok(())
//! }
//! ```

pub mod billing;
pub mod config;
pub mod error;
pub mod tariff;

pub use billing::{round_money, Bill, BillCalculator, SlabCharge};
pub use config::{
    ConfidenceSettings, Config, EnsembleSettings, FallbackSettings, PredictorKind, PredictorSpec,
    TariffSources,
};
pub use error::{BillingError, ConfigError, InvalidScheduleError};
pub use tariff::{Slab, TariffRegistry, TariffSchedule, TariffScheduleBuilder};
