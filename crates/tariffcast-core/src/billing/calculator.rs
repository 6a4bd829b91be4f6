//! Progressive slab billing.

use std::collections::BTreeMap;

use tracing::debug;

use super::bill::{Bill, SlabCharge};
use super::round_money;
use crate::error::BillingError;
use crate::tariff::TariffSchedule;

/// Computes itemized bills from a [`TariffSchedule`].
///
/// The calculator is stateless apart from the tax toggle; every call builds a
/// fresh [`Bill`] from its inputs. Intermediate amounts stay at full precision
/// and are rounded once when the bill is assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillCalculator {
    include_taxes: bool,
}

impl Default for BillCalculator {
    fn default() -> Self {
        Self { include_taxes: true }
    }
}

/// Full-precision amounts before rounding.
struct RawCharges {
    breakdown: Vec<SlabCharge>,
    subtotal: f64,
}

impl BillCalculator {
    /// Creates a calculator that applies the schedule's taxes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a calculator that skips taxes entirely.
    #[must_use]
    pub const fn without_taxes() -> Self {
        Self { include_taxes: false }
    }

    /// Returns true if taxes are applied.
    #[must_use]
    pub const fn includes_taxes(&self) -> bool {
        self.include_taxes
    }

    /// Bills `units_consumed` units, `off_peak_units` of which fell in
    /// discounted hours.
    ///
    /// Off-peak units above `units_consumed` are clamped. Zero consumption
    /// yields a bill holding only the fixed service charge.
    ///
    /// # Errors
    /// Returns `BillingError::InvalidArgument` if either figure is negative or
    /// not a finite number.
    pub fn calculate(
        &self,
        schedule: &TariffSchedule,
        units_consumed: f64,
        off_peak_units: f64,
    ) -> Result<Bill, BillingError> {
        check_units("units_consumed", units_consumed)?;
        check_units("off_peak_units", off_peak_units)?;

        if units_consumed == 0.0 {
            return Ok(self.assemble(schedule, 0.0, 0.0, RawCharges { breakdown: Vec::new(), subtotal: 0.0 }));
        }

        let raw = sweep(schedule, units_consumed);
        let off_peak_units = off_peak_units.min(units_consumed);
        Ok(self.assemble(schedule, units_consumed, off_peak_units, raw))
    }

    fn assemble(&self, schedule: &TariffSchedule, units: f64, off_peak_units: f64, raw: RawCharges) -> Bill {
        let RawCharges { breakdown, subtotal } = raw;

        let off_peak_savings = match schedule.off_peak_discount_rate() {
            Some(rate) if units > 0.0 => ((off_peak_units / units) * subtotal * rate).min(subtotal),
            _ => 0.0,
        };
        let discounted = subtotal - off_peak_savings;

        let taxes: BTreeMap<String, f64> = if self.include_taxes && units > 0.0 {
            schedule
                .tax_rates()
                .iter()
                .map(|(name, percent)| (name.clone(), discounted * percent / 100.0))
                .collect()
        } else {
            BTreeMap::new()
        };
        let tax_total: f64 = taxes.values().sum();

        let fees: BTreeMap<String, f64> = if units > 0.0 { schedule.fees().clone() } else { BTreeMap::new() };
        let fee_total: f64 = fees.values().sum();

        let service_charge = schedule.fixed_service_charge();
        let total_due = discounted + tax_total + service_charge + fee_total;
        let per_unit_average = if units > 0.0 { total_due / units } else { 0.0 };

        debug!(
            tariff = %schedule.name(),
            units,
            off_peak_units,
            subtotal,
            off_peak_savings,
            tax_total,
            total_due,
            "Calculated bill"
        );

        Bill {
            schedule: schedule.name().to_string(),
            effective_from: schedule.effective_from(),
            units_consumed: units,
            off_peak_units,
            per_slab_breakdown: breakdown,
            subtotal: round_money(subtotal),
            off_peak_savings: round_money(off_peak_savings),
            tax_amounts: taxes.into_iter().map(|(name, amount)| (name, round_money(amount))).collect(),
            tax_total: round_money(tax_total),
            service_charge: round_money(service_charge),
            fees: fees.into_iter().map(|(name, amount)| (name, round_money(amount))).collect(),
            total_due: round_money(total_due),
            per_unit_average: round_money(per_unit_average),
            currency: schedule.currency().to_string(),
        }
    }
}

fn check_units(field: &'static str, value: f64) -> Result<(), BillingError> {
    if value.is_nan() || value.is_infinite() {
        return Err(BillingError::InvalidArgument { field, value, reason: "must be a finite number" });
    }
    if value < 0.0 {
        return Err(BillingError::InvalidArgument { field, value, reason: "must not be negative" });
    }
    Ok(())
}

/// Walks the slabs in order, billing each one up to its width.
fn sweep(schedule: &TariffSchedule, units: f64) -> RawCharges {
    let mut remaining = units;
    let mut subtotal = 0.0;
    let mut breakdown = Vec::new();

    for slab in schedule.slabs() {
        if remaining <= 0.0 {
            break;
        }
        let billed = slab.width().map_or(remaining, |width| remaining.min(width));
        let cost = billed * slab.rate_per_unit;
        subtotal += cost;
        remaining -= billed;
        breakdown.push(SlabCharge {
            slab_label: slab.label(),
            units: billed,
            rate: slab.rate_per_unit,
            cost: round_money(cost),
        });
    }

    RawCharges { breakdown, subtotal }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::tariff::Slab;

    fn four_slabs() -> crate::tariff::TariffScheduleBuilder {
        TariffSchedule::builder("test", NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
            .slab(Slab::bounded(1, 50, 22.0))
            .slab(Slab::bounded(51, 100, 32.0))
            .slab(Slab::bounded(101, 200, 37.0))
            .slab(Slab::unbounded(201, 43.0))
    }

    #[test]
    fn test_progressive_sweep_120_units() {
        let schedule = four_slabs().build().unwrap();
        let bill = BillCalculator::new().calculate(&schedule, 120.0, 0.0).unwrap();

        let units: Vec<f64> = bill.per_slab_breakdown.iter().map(|c| c.units).collect();
        let costs: Vec<f64> = bill.per_slab_breakdown.iter().map(|c| c.cost).collect();
        assert_eq!(units, vec![50.0, 50.0, 20.0]);
        assert_eq!(costs, vec![1100.0, 1600.0, 740.0]);
        assert_eq!(bill.per_slab_breakdown[2].slab_label, "101-200");
        assert_eq!(bill.subtotal, 3440.0);
        assert_eq!(bill.total_due, 3440.0);
        assert_eq!(bill.currency, "PKR");
    }

    #[test]
    fn test_terminal_slab_has_no_upper_limit() {
        let schedule = four_slabs().build().unwrap();
        let bill = BillCalculator::new().calculate(&schedule, 1200.0, 0.0).unwrap();

        let last = bill.per_slab_breakdown.last().unwrap();
        assert_eq!(last.slab_label, "201+");
        assert_eq!(last.units, 1000.0);
        assert_eq!(bill.subtotal, 1100.0 + 1600.0 + 3700.0 + 43_000.0);
    }

    #[test]
    fn test_zero_units_bills_service_charge_only() {
        let schedule = four_slabs().service_charge(50.0).tax("gst", 17.0).fee("tv_licence", 35.0).build().unwrap();
        let bill = BillCalculator::new().calculate(&schedule, 0.0, 0.0).unwrap();

        assert!(bill.per_slab_breakdown.is_empty());
        assert!(bill.tax_amounts.is_empty());
        assert!(bill.fees.is_empty());
        assert_eq!(bill.subtotal, 0.0);
        assert_eq!(bill.total_due, 50.0);
        assert_eq!(bill.per_unit_average, 0.0);
    }

    #[test]
    fn test_invalid_arguments_rejected() {
        let schedule = four_slabs().build().unwrap();
        let calculator = BillCalculator::new();

        let err = calculator.calculate(&schedule, -1.0, 0.0).unwrap_err();
        assert!(matches!(err, BillingError::InvalidArgument { field: "units_consumed", .. }));

        let err = calculator.calculate(&schedule, 100.0, -5.0).unwrap_err();
        assert!(matches!(err, BillingError::InvalidArgument { field: "off_peak_units", .. }));

        assert!(calculator.calculate(&schedule, f64::NAN, 0.0).is_err());
        assert!(calculator.calculate(&schedule, f64::INFINITY, 0.0).is_err());
        assert!(calculator.calculate(&schedule, 100.0, f64::NAN).is_err());
    }

    #[test]
    fn test_off_peak_discount_is_proportional() {
        let schedule = four_slabs().off_peak_discount(0.2).build().unwrap();
        let bill = BillCalculator::new().calculate(&schedule, 120.0, 60.0).unwrap();

        assert_eq!(bill.off_peak_savings, 344.0);
        assert_eq!(bill.total_due, 3096.0);
    }

    #[test]
    fn test_off_peak_units_clamped_to_consumption() {
        let schedule = four_slabs().off_peak_discount(0.2).build().unwrap();
        let bill = BillCalculator::new().calculate(&schedule, 120.0, 500.0).unwrap();

        assert_eq!(bill.off_peak_units, 120.0);
        assert_eq!(bill.off_peak_savings, 688.0);
        assert!(bill.off_peak_savings <= bill.subtotal);
    }

    #[test]
    fn test_full_discount_never_exceeds_subtotal() {
        let schedule = four_slabs().off_peak_discount(1.0).build().unwrap();
        let bill = BillCalculator::new().calculate(&schedule, 75.0, 75.0).unwrap();

        assert_eq!(bill.off_peak_savings, bill.subtotal);
        assert_eq!(bill.total_due, 0.0);
    }

    #[test]
    fn test_taxes_apply_to_discounted_subtotal() {
        let schedule = four_slabs().off_peak_discount(0.2).tax("gst", 17.0).tax("electricity_duty", 1.5).build().unwrap();
        let bill = BillCalculator::new().calculate(&schedule, 120.0, 60.0).unwrap();

        // 3440 - 344 = 3096
        assert_eq!(bill.discounted_subtotal(), 3096.0);
        assert_eq!(bill.tax_amounts["gst"], 526.32);
        assert_eq!(bill.tax_amounts["electricity_duty"], 46.44);
        assert_eq!(bill.tax_total, 572.76);
        assert_eq!(bill.total_due, 3668.76);
    }

    #[test]
    fn test_without_taxes() {
        let schedule = four_slabs().tax("gst", 17.0).build().unwrap();
        let calculator = BillCalculator::without_taxes();
        assert!(!calculator.includes_taxes());

        let bill = calculator.calculate(&schedule, 120.0, 0.0).unwrap();
        assert!(bill.tax_amounts.is_empty());
        assert_eq!(bill.tax_total, 0.0);
        assert_eq!(bill.total_due, 3440.0);
    }

    #[test]
    fn test_service_charge_and_fees_untaxed() {
        let schedule = four_slabs().service_charge(50.0).tax("gst", 10.0).fee("tv_licence", 35.0).build().unwrap();
        let bill = BillCalculator::new().calculate(&schedule, 10.0, 0.0).unwrap();

        assert_eq!(bill.subtotal, 220.0);
        assert_eq!(bill.tax_amounts["gst"], 22.0);
        assert_eq!(bill.fees["tv_licence"], 35.0);
        assert_eq!(bill.fee_total(), 35.0);
        assert_eq!(bill.total_due, 220.0 + 22.0 + 50.0 + 35.0);
        assert_eq!(bill.per_unit_average, 32.7);
    }

    #[test]
    fn test_fractional_units_fully_covered() {
        let schedule = four_slabs().build().unwrap();
        let bill = BillCalculator::new().calculate(&schedule, 120.5, 0.0).unwrap();

        assert_eq!(bill.billed_units(), 120.5);
        assert_eq!(bill.per_slab_breakdown[2].units, 20.5);
        assert_eq!(bill.subtotal, 3458.5);
    }

    #[test]
    fn test_single_rounding() {
        let schedule = TariffSchedule::builder("fine", NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
            .slab(Slab::bounded(1, 1, 0.004))
            .slab(Slab::bounded(2, 2, 0.004))
            .slab(Slab::unbounded(3, 0.004))
            .build()
            .unwrap();
        let bill = BillCalculator::new().calculate(&schedule, 3.0, 0.0).unwrap();

        // Each slab rounds to 0.00 on its own; the total does not.
        assert!(bill.per_slab_breakdown.iter().all(|c| c.cost == 0.0));
        assert_eq!(bill.subtotal, 0.01);
        assert_eq!(bill.total_due, 0.01);
    }
}
