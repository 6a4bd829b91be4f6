//! Tariffcast CLI - command-line front-end for slab billing and consumption
//! forecasting.
//!
//! This CLI provides a `tariffcast` command that bills a known reading,
//! forecasts next month's consumption and bill, and inspects tariff files.

mod commands;
mod config;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{bill, predict, savings, tariffs, validate};

/// Tariffcast CLI - slab-tariff billing and consumption forecasting
#[derive(Parser, Debug)]
#[command(
    name = "tariffcast",
    author,
    version,
    about = "Tariffcast - slab-tariff billing and consumption forecasting",
    long_about = "Tariffcast bills electricity consumption against progressive slab tariffs and forecasts next month's consumption with a resilient ensemble of predictors."
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,

    /// Configuration file (overrides TARIFFCAST_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bill a known consumption
    ///
    /// Applies the tariff in force on the given date to a meter reading,
    /// for example one read off a scanned bill.
    Bill {
        /// Units consumed in the billing period
        #[arg(short, long, allow_negative_numbers = true)]
        units: f64,

        /// Units consumed during discounted off-peak hours
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        off_peak: f64,

        /// Tariff name
        #[arg(short, long, default_value = commands::DEFAULT_TARIFF)]
        tariff: String,

        /// Billing date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Leave taxes out of the bill
        #[arg(long)]
        no_taxes: bool,

        /// Output the bill as JSON
        #[arg(long)]
        json: bool,
    },

    /// Forecast next month's consumption
    ///
    /// Reads a household JSON file (`historical_data`, `appliances`, `month`)
    /// and runs every configured predictor concurrently.
    Predict {
        /// Household JSON file
        input: PathBuf,

        /// Only run these predictors (repeatable)
        #[arg(short, long = "predictor")]
        predictors: Vec<String>,

        /// Also bill the predicted consumption
        #[arg(long)]
        bill: bool,

        /// Tariff used with --bill
        #[arg(short, long, default_value = commands::DEFAULT_TARIFF)]
        tariff: String,

        /// Expected off-peak fraction of the predicted units (0-1), used with --bill
        #[arg(long, default_value_t = 0.0)]
        off_peak_share: f64,

        /// Reference date (YYYY-MM-DD) for undated readings and the tariff, defaults to today
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Output the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Estimate what reducing consumption would save
    ///
    /// Bills the current and the reduced consumption under the same tariff.
    /// Without --target the reduction is 10%, 20% above 300 units or 30%
    /// above 500 units.
    Savings {
        /// Units currently consumed per month
        #[arg(short, long, allow_negative_numbers = true)]
        units: f64,

        /// Reduced monthly consumption to compare against
        #[arg(long, allow_negative_numbers = true)]
        target: Option<f64>,

        /// Tariff name
        #[arg(short, long, default_value = commands::DEFAULT_TARIFF)]
        tariff: String,

        /// Billing date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Output the estimate as JSON
        #[arg(long)]
        json: bool,
    },

    /// List loaded tariff schedules
    Tariffs {
        /// Show the slabs of one tariff
        name: Option<String>,

        /// Output schedules as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a tariff file
    ///
    /// Loads every `[[schedules]]` entry of the file and reports the first
    /// defect found.
    Validate {
        /// Tariff TOML file
        file: PathBuf,

        /// Output the result as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let Some(command) = args.command else {
        Args::command().print_help()?;
        return Ok(());
    };

    match command {
        Command::Bill { units, off_peak, tariff, date, no_taxes, json } => {
            let config = config::load(args.config.as_deref())?;
            bill::execute(&config, units, off_peak, &tariff, date, no_taxes, json)?;
        }
        Command::Predict { input, predictors, bill, tariff, off_peak_share, today, json } => {
            let config = config::load(args.config.as_deref())?;
            let options = predict::PredictOptions { predictors, bill, tariff, off_peak_share, today, json };
            predict::execute(&config, &input, options).await?;
        }
        Command::Savings { units, target, tariff, date, json } => {
            let config = config::load(args.config.as_deref())?;
            savings::execute(&config, units, target, &tariff, date, json)?;
        }
        Command::Tariffs { name, json } => {
            let config = config::load(args.config.as_deref())?;
            tariffs::execute(&config, name.as_deref(), json)?;
        }
        Command::Validate { file, json } => {
            validate::execute(&file, json)?;
        }
    }

    Ok(())
}
