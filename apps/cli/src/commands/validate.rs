//! Tariff file validation command.

use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use serde::Serialize;
use tariffcast_core::TariffRegistry;

#[derive(Serialize)]
struct JsonOutput {
    file: String,
    valid: bool,
    schedules: Vec<JsonSchedule>,
}

#[derive(Serialize)]
struct JsonSchedule {
    name: String,
    effective_from: String,
    slabs: usize,
}

/// Execute the validate command.
///
/// Fails on the first malformed schedule; nothing is reported as valid
/// unless the whole file is.
pub fn execute(file: &Path, json: bool) -> anyhow::Result<()> {
    let mut registry = TariffRegistry::new();
    let loaded = registry
        .load_file(file)
        .with_context(|| format!("{} is not a valid tariff file", file.display()))?;

    if json {
        let output = JsonOutput {
            file: file.display().to_string(),
            valid: true,
            schedules: registry
                .names()
                .flat_map(|name| registry.versions(name))
                .map(|schedule| JsonSchedule {
                    name: schedule.name().to_string(),
                    effective_from: schedule.effective_from().to_string(),
                    slabs: schedule.slabs().len(),
                })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", "tariffcast validate".bold().cyan());
    println!();
    println!("  {} {}: {} schedule(s) valid", "✓".green(), file.display(), loaded);
    for name in registry.names() {
        for schedule in registry.versions(name) {
            println!("    {} effective {}", schedule.name(), schedule.effective_from());
        }
    }
    Ok(())
}
