//! Tariffs command.

use std::sync::Arc;

use anyhow::bail;
use colored::Colorize;
use comfy_table::Table;
use tariffcast_core::{Config, TariffSchedule};

use super::print_json;

/// Execute the tariffs command.
///
/// Without a name, lists every loaded schedule version. With a name, shows
/// the slabs of each version of that tariff.
pub fn execute(config: &Config, name: Option<&str>, json: bool) -> anyhow::Result<()> {
    let registry = config.tariff_registry()?;

    let schedules: Vec<Arc<TariffSchedule>> = match name {
        Some(name) => {
            let versions = registry.versions(name);
            if versions.is_empty() {
                bail!("Unknown tariff '{}' (loaded: {})", name, registry.names().collect::<Vec<_>>().join(", "));
            }
            versions
        }
        None => registry.names().flat_map(|name| registry.versions(name)).collect(),
    };

    if json {
        let plain: Vec<&TariffSchedule> = schedules.iter().map(AsRef::as_ref).collect();
        return print_json(&plain);
    }

    println!("{}", "tariffcast tariffs".bold().cyan());
    println!();

    if name.is_none() {
        let mut table = Table::new();
        table.set_header(vec!["Tariff", "Effective from", "Currency", "Slabs", "Service charge", "Taxes (%)"]);
        for schedule in &schedules {
            table.add_row(vec![
                schedule.name().to_string(),
                schedule.effective_from().to_string(),
                schedule.currency().to_string(),
                schedule.slabs().len().to_string(),
                format!("{:.2}", schedule.fixed_service_charge()),
                taxes(schedule),
            ]);
        }
        println!("{}", table);
        println!();
        println!("  {} schedule(s) loaded", schedules.len());
        return Ok(());
    }

    for schedule in &schedules {
        println!(
            "  {} effective {} ({})",
            schedule.name().bold(),
            schedule.effective_from(),
            schedule.currency()
        );
        let mut table = Table::new();
        table.set_header(vec!["Slab", "Rate per unit"]);
        for slab in schedule.slabs() {
            table.add_row(vec![slab.label(), format!("{:.2}", slab.rate_per_unit)]);
        }
        println!("{}", table);
        if let Some(rate) = schedule.off_peak_discount_rate() {
            println!("  Off-peak discount: {:.0}%", rate * 100.0);
        }
        if !schedule.tax_rates().is_empty() {
            println!("  Taxes: {}", taxes(schedule));
        }
        for (fee, amount) in schedule.fees() {
            println!("  Fee {}: {:.2}", fee, amount);
        }
        println!();
    }
    Ok(())
}

fn taxes(schedule: &TariffSchedule) -> String {
    schedule
        .tax_rates()
        .iter()
        .map(|(name, rate)| format!("{name} {rate}"))
        .collect::<Vec<_>>()
        .join(", ")
}
