//! Bill command.
//!
//! Bills an externally supplied reading against the tariff in force.

use chrono::NaiveDate;
use colored::Colorize;
use tariffcast_core::{BillCalculator, Config};
use tariffcast_orchestrator::ConsumptionAdvisor;

use super::{date_or_today, print_bill, print_json};

/// Execute the bill command.
pub fn execute(
    config: &Config,
    units: f64,
    off_peak: f64,
    tariff: &str,
    date: Option<NaiveDate>,
    no_taxes: bool,
    json: bool,
) -> anyhow::Result<()> {
    let calculator = if no_taxes { BillCalculator::without_taxes() } else { BillCalculator::new() };
    let advisor = ConsumptionAdvisor::from_config(config)?.with_calculator(calculator);
    let bill = advisor.bill_actual(units, off_peak, tariff, date_or_today(date))?;

    if json {
        return print_json(&bill);
    }

    println!("{}", "tariffcast bill".bold().cyan());
    println!();
    print_bill(&bill);
    Ok(())
}
