use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Units billed within one slab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlabCharge {
    /// Slab range, e.g. `51-100` or `601+`.
    pub slab_label: String,
    /// Units billed at this slab's rate.
    pub units: f64,
    /// Price per unit.
    pub rate: f64,
    /// `units * rate`, rounded to 2 decimals.
    pub cost: f64,
}

/// An itemized electricity bill.
///
/// Every monetary field is rounded once, from its full-precision value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    /// Name of the tariff schedule used.
    pub schedule: String,
    /// Effective date of the schedule version used.
    pub effective_from: NaiveDate,
    /// Units billed.
    pub units_consumed: f64,
    /// Off-peak units after clamping to `units_consumed`.
    pub off_peak_units: f64,
    /// Slab-by-slab energy charge, in slab order.
    pub per_slab_breakdown: Vec<SlabCharge>,
    /// Energy charge before discounts and taxes.
    pub subtotal: f64,
    /// Off-peak discount taken off the subtotal.
    pub off_peak_savings: f64,
    /// Each tax on the discounted energy charge.
    pub tax_amounts: BTreeMap<String, f64>,
    /// Sum of all taxes.
    pub tax_total: f64,
    /// Flat monthly service charge.
    pub service_charge: f64,
    /// Flat fees, present only when something was consumed.
    pub fees: BTreeMap<String, f64>,
    /// Amount payable.
    pub total_due: f64,
    /// `total_due / units_consumed`, or 0 when nothing was consumed.
    pub per_unit_average: f64,
    /// Currency of every amount.
    pub currency: String,
}

impl Bill {
    /// Total units across the slab breakdown.
    #[must_use]
    pub fn billed_units(&self) -> f64 {
        self.per_slab_breakdown.iter().map(|charge| charge.units).sum()
    }

    /// Energy charge after the off-peak discount.
    #[must_use]
    pub fn discounted_subtotal(&self) -> f64 {
        super::round_money(self.subtotal - self.off_peak_savings)
    }

    /// Sum of all flat fees.
    #[must_use]
    pub fn fee_total(&self) -> f64 {
        super::round_money(self.fees.values().sum())
    }
}
