//! Monthly consumption seasonality.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tariffcast_abstraction::PredictorError;

/// Relative consumption of each calendar month, January first.
///
/// A factor of 1.5 means the month typically uses half again as much as an
/// average month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonalIndex {
    factors: [f64; 12],
}

impl SeasonalIndex {
    /// Lahore residential profile: cooling load peaks in June, heating in January.
    pub const LESCO: [f64; 12] = [1.30, 1.25, 0.90, 0.95, 1.40, 1.50, 1.45, 1.35, 1.10, 0.95, 0.90, 1.35];

    /// Creates an index, rejecting non-positive or non-finite factors.
    pub fn new(factors: [f64; 12]) -> Result<Self, PredictorError> {
        if let Some((index, factor)) =
            factors.iter().enumerate().find(|(_, factor)| !factor.is_finite() || **factor <= 0.0)
        {
            return Err(PredictorError::InvalidInput(format!(
                "seasonal factor for month {} must be positive, got {factor}",
                index + 1
            )));
        }
        Ok(Self { factors })
    }

    /// An index with every month equal to 1.
    #[must_use]
    pub const fn flat() -> Self {
        Self { factors: [1.0; 12] }
    }

    /// Factor of `month` (1-12). Months outside the calendar get 1.
    #[must_use]
    pub fn factor(&self, month: u32) -> f64 {
        month
            .checked_sub(1)
            .and_then(|index| self.factors.get(index as usize))
            .copied()
            .unwrap_or(1.0)
    }

    /// Multiplier that moves consumption observed in `from` to `to`.
    #[must_use]
    pub fn adjustment(&self, from: u32, to: u32) -> f64 {
        self.factor(to) / self.factor(from)
    }
}

impl Default for SeasonalIndex {
    fn default() -> Self {
        Self { factors: Self::LESCO }
    }
}

/// Months from `last_month` forward to the next occurrence of `target_month`.
///
/// Predicting the same calendar month again means a year ahead.
#[must_use]
pub fn months_ahead(last_month: u32, target_month: u32) -> u32 {
    match (target_month + 12 - last_month % 12) % 12 {
        0 => 12,
        ahead => ahead,
    }
}

/// Position of `date`'s month on a continuous month axis.
#[must_use]
pub fn month_index(date: NaiveDate) -> f64 {
    f64::from(date.year() * 12) + f64::from(date.month0())
}
