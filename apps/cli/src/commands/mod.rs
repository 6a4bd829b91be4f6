//! Command implementations for the Tariffcast CLI.

pub mod bill;
pub mod predict;
pub mod savings;
pub mod tariffs;
pub mod validate;

use chrono::{Local, NaiveDate};
use colored::Colorize;
use comfy_table::Table;
use serde::Serialize;
use tariffcast_core::Bill;

/// Tariff used when none is named.
pub const DEFAULT_TARIFF: &str = "lesco-domestic";

/// The given date, or today's.
pub fn date_or_today(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Local::now().date_naive())
}

/// Prints `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints an itemized bill.
pub fn print_bill(bill: &Bill) {
    let currency = &bill.currency;
    println!(
        "  Tariff: {} (effective {})",
        bill.schedule.cyan(),
        bill.effective_from
    );
    println!("  Units:  {} ({} off-peak)", bill.units_consumed, bill.off_peak_units);
    println!();

    if !bill.per_slab_breakdown.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Slab", "Units", "Rate", "Cost"]);
        for charge in &bill.per_slab_breakdown {
            table.add_row(vec![
                charge.slab_label.clone(),
                charge.units.to_string(),
                format!("{:.2}", charge.rate),
                format!("{:.2}", charge.cost),
            ]);
        }
        println!("{}", table);
        println!();
    }

    println!("  {:<22} {:>12.2} {}", "Energy charge", bill.subtotal, currency);
    if bill.off_peak_savings > 0.0 {
        println!("  {:<22} {:>12.2} {}", "Off-peak discount", -bill.off_peak_savings, currency);
        println!("  {:<22} {:>12.2} {}", "Discounted charge", bill.discounted_subtotal(), currency);
    }
    for (name, amount) in &bill.tax_amounts {
        println!("  {:<22} {:>12.2} {}", name, amount, currency);
    }
    if bill.service_charge > 0.0 {
        println!("  {:<22} {:>12.2} {}", "Service charge", bill.service_charge, currency);
    }
    for (name, amount) in &bill.fees {
        println!("  {:<22} {:>12.2} {}", name, amount, currency);
    }
    println!(
        "  {:<22} {:>12} {}",
        "Total due".bold(),
        format!("{:.2}", bill.total_due).bold().green(),
        currency
    );
    println!("  {:<22} {:>12.2} {}/unit", "Average", bill.per_unit_average, currency);
}
