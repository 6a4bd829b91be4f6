//! Progressive ("slab") tariff schedules.
//!
//! Schedules are authored as configuration, validated once, and never
//! mutated afterwards. The registry keys them by name and effective date so
//! a rate change is a new version, not an edited constant.

pub mod registry;
pub mod schedule;
pub mod slab;

pub use registry::TariffRegistry;
pub use schedule::{TariffSchedule, TariffScheduleBuilder};
pub use slab::Slab;
