//! Predict command.
//!
//! Runs the predictor ensemble over a household file and optionally bills
//! the estimate. Ctrl-C cancels the run; predictors that already finished
//! still contribute.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::NaiveDate;
use colored::Colorize;
use comfy_table::{Cell, Color as ComfyColor, Table};
use serde_json::Value;
use tariffcast_abstraction::PredictionInput;
use tariffcast_core::{BillCalculator, Config};
use tariffcast_models::PredictorFactory;
use tariffcast_orchestrator::{ConsumptionAdvisor, EnsembleOutcome, EnsemblePredictor, PredictorRegistry};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::{date_or_today, print_bill, print_json};

/// Options of the predict command.
#[derive(Debug, Clone)]
pub struct PredictOptions {
    /// Predictor names to run; empty runs every enabled predictor.
    pub predictors: Vec<String>,
    /// Also bill the estimate.
    pub bill: bool,
    /// Tariff for the bill.
    pub tariff: String,
    /// Off-peak fraction of the estimate.
    pub off_peak_share: f64,
    /// Reference date.
    pub today: Option<NaiveDate>,
    /// JSON output.
    pub json: bool,
}

/// Execute the predict command.
pub async fn execute(config: &Config, input_path: &Path, options: PredictOptions) -> anyhow::Result<()> {
    let today = date_or_today(options.today);
    let input = read_input(input_path, today)?;

    let factory = PredictorFactory::new();
    let mut registry = PredictorRegistry::from_config(config, &factory)?;
    if !options.predictors.is_empty() {
        if let Some(unknown) = options.predictors.iter().find(|name| registry.get(name).is_none()) {
            bail!("Unknown predictor '{}' (configured: {})", unknown, registry.names().join(", "));
        }
        let names: Vec<&str> = options.predictors.iter().map(String::as_str).collect();
        registry = registry.subset(&names);
    }
    let ensemble = EnsemblePredictor::from_config(config, *factory.seasonal_index());

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, keeping predictions that already finished");
            on_interrupt.cancel();
        }
    });
    let deadline = Instant::now() + ensemble.settings().timeout();

    if options.bill {
        let tariffs = Arc::new(config.tariff_registry()?);
        let advisor = ConsumptionAdvisor::new(registry, ensemble, tariffs, BillCalculator::new());
        let forecast = advisor
            .forecast_until(&input, &options.tariff, today, options.off_peak_share, deadline, &cancel)
            .await;
        interrupt.abort();
        let forecast = forecast?;
        if options.json {
            return print_json(&forecast);
        }
        print_outcome(&forecast.outcome);
        println!();
        print_bill(&forecast.bill);
    } else {
        let weights = &ensemble.settings().weights;
        let outcome = ensemble.predict_ensemble(registry.predictors(), &input, Some(weights), deadline, &cancel).await;
        interrupt.abort();
        if options.json {
            return print_json(&outcome);
        }
        print_outcome(&outcome);
    }
    Ok(())
}

fn read_input(path: &Path, today: NaiveDate) -> anyhow::Result<PredictionInput> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let payload: Value =
        serde_json::from_str(&content).with_context(|| format!("{} is not valid JSON", path.display()))?;
    PredictionInput::from_legacy_json(&payload, today)
        .with_context(|| format!("{} is not a usable household file", path.display()))
}

fn print_outcome(outcome: &EnsembleOutcome) {
    println!("{}", "tariffcast predict".bold().cyan());
    println!();

    let confidence = format!("{}%", outcome.confidence);
    let confidence = match outcome.confidence {
        70.. => confidence.green(),
        40..=69 => confidence.yellow(),
        _ => confidence.red(),
    };
    println!("  Predicted units: {}", format!("{:.1}", outcome.predicted_units).bold());
    println!("  Confidence:      {}", confidence);
    if outcome.used_fallback {
        println!("  {} Too few predictors succeeded, trend fallback used", "!".yellow());
    } else {
        println!("  Sources:         {}", outcome.contributing_sources.join(", "));
    }
    if outcome.clamped {
        println!("  {} Clamped from {:.1}", "!".yellow(), outcome.raw_units);
    }

    if !outcome.failures.is_empty() {
        println!();
        let mut table = Table::new();
        table.set_header(vec!["Failed predictor", "Cause"]);
        for failure in &outcome.failures {
            table.add_row(vec![
                Cell::new(&failure.source).fg(ComfyColor::Red),
                Cell::new(failure.error.to_string()),
            ]);
        }
        println!("{}", table);
    }
}
