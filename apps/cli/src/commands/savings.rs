//! Savings command.
//!
//! Compares the bill at a reading with the bill at a reduced consumption.

use chrono::NaiveDate;
use colored::Colorize;
use comfy_table::Table;
use serde::Serialize;
use tariffcast_core::Config;
use tariffcast_orchestrator::{ConsumptionAdvisor, SavingsEstimate};

use super::{date_or_today, print_json};

#[derive(Serialize)]
struct JsonOutput<'a> {
    #[serde(flatten)]
    estimate: &'a SavingsEstimate,
    yearly_savings: f64,
}

/// Execute the savings command.
///
/// Without `target`, the reduced consumption is the typical cut for the
/// household's consumption level.
pub fn execute(
    config: &Config,
    units: f64,
    target: Option<f64>,
    tariff: &str,
    date: Option<NaiveDate>,
    json: bool,
) -> anyhow::Result<()> {
    let advisor = ConsumptionAdvisor::from_config(config)?;
    let on_date = date_or_today(date);
    let estimate = match target {
        Some(target) => advisor.potential_savings(units, target, tariff, on_date)?,
        None => advisor.typical_savings(units, tariff, on_date)?,
    };

    if json {
        return print_json(&JsonOutput { estimate: &estimate, yearly_savings: estimate.yearly_savings() });
    }

    let currency = &estimate.current.currency;
    println!("{}", "tariffcast savings".bold().cyan());
    println!();

    let mut table = Table::new();
    table.set_header(vec!["", "Units", "Total due"]);
    table.add_row(vec![
        "Current".to_string(),
        estimate.current.units_consumed.to_string(),
        format!("{:.2} {}", estimate.current.total_due, currency),
    ]);
    table.add_row(vec![
        "Reduced".to_string(),
        estimate.optimized.units_consumed.to_string(),
        format!("{:.2} {}", estimate.optimized.total_due, currency),
    ]);
    println!("{}", table);
    println!();

    let amount = format!("{:.2} {}", estimate.savings_amount, currency);
    println!("  Monthly savings: {} ({:.2}%)", amount.bold().green(), estimate.savings_percent);
    println!("  Yearly savings:  {:.2} {}", estimate.yearly_savings(), currency);
    Ok(())
}
