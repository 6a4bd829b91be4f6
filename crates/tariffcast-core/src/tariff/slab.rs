//! A single consumption slab.

use serde::{Deserialize, Serialize};

/// A consumption range billed at one per-unit rate.
///
/// Bounds are inclusive unit counts. A missing `upper_bound` marks the
/// terminal slab, which bills every remaining unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Slab {
    /// First unit billed at this rate.
    pub lower_bound: u32,
    /// Last unit billed at this rate; `None` means unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_bound: Option<u32>,
    /// Price per unit.
    pub rate_per_unit: f64,
}

impl Slab {
    /// Creates a bounded slab covering `lower_bound..=upper_bound`.
    #[must_use]
    pub const fn bounded(lower_bound: u32, upper_bound: u32, rate_per_unit: f64) -> Self {
        Self { lower_bound, upper_bound: Some(upper_bound), rate_per_unit }
    }

    /// Creates the terminal slab starting at `lower_bound`.
    #[must_use]
    pub const fn unbounded(lower_bound: u32, rate_per_unit: f64) -> Self {
        Self { lower_bound, upper_bound: None, rate_per_unit }
    }

    /// Number of units the slab covers, or `None` when unbounded.
    #[must_use]
    pub fn width(&self) -> Option<f64> {
        self.upper_bound
            .map(|upper| f64::from(upper.saturating_sub(self.lower_bound)) + 1.0)
    }

    /// Human-readable range, e.g. `51-100` or `601+`.
    #[must_use]
    pub fn label(&self) -> String {
        match self.upper_bound {
            Some(upper) => format!("{}-{}", self.lower_bound, upper),
            None => format!("{}+", self.lower_bound),
        }
    }
}
