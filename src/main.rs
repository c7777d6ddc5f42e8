//! Contract Monitoring - Main Entry Point
//!
//! Loads a contract dataset, classifies risk, predicts priority, raises
//! alerts and optionally exports the monitored table.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use contract_monitor::{
    config::{AppConfig, LoggingConfig},
    risk, ModelBundle, Pipeline, Report,
};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "contract_monitor", version, about = "Procurement contract monitoring")]
struct Cli {
    /// Configuration file (defaults to config/config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the monitoring pipeline over a contract CSV
    Run {
        /// Contract dataset
        #[arg(short, long)]
        input: PathBuf,

        /// Export the monitored table; without a path the configured default is used
        #[arg(long, num_args = 0..=1)]
        export: Option<Option<PathBuf>>,

        /// Also run the experimental duration prediction
        #[arg(long)]
        experimental: bool,

        /// Rows shown in the previews
        #[arg(long, default_value_t = 5)]
        preview_rows: usize,
    },
    /// Print the rule-based risk level of a single contract
    Classify {
        #[arg(long)]
        value: f64,
        #[arg(long)]
        duration: f64,
        #[arg(long)]
        delay: f64,
    },
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(format!("contract_monitor={}", logging.level)),
    };
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if logging.format.eq_ignore_ascii_case("json") {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow::anyhow!("Failed to initialise logging: {}", e))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from_path(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => AppConfig::load()?,
    };
    init_logging(&config.logging)?;

    match cli.command {
        Command::Classify {
            value,
            duration,
            delay,
        } => {
            println!("{}", risk::classify(value, duration, delay));
            Ok(())
        }
        Command::Run {
            input,
            export,
            experimental,
            preview_rows,
        } => run(&config, input, export, experimental, preview_rows),
    }
}

fn run(
    config: &AppConfig,
    input: PathBuf,
    export: Option<Option<PathBuf>>,
    experimental: bool,
    preview_rows: usize,
) -> Result<()> {
    info!("Starting Contract Monitoring");
    let with_duration = experimental || config.duration.enabled;

    let bundle = ModelBundle::load(config, with_duration);
    let pipeline = Pipeline::new(&bundle, config, with_duration);

    let run = match pipeline.run_path(&input) {
        Ok(run) => run,
        Err(e) => {
            error!(input = %input.display(), error = %e, "Dataset rejected");
            return Err(e).with_context(|| format!("Failed to process {}", input.display()));
        }
    };

    print!(
        "{}",
        Report::new(&run)
            .with_input(&input)
            .with_preview_rows(preview_rows)
    );

    if let Some(path) = export {
        let path = path.unwrap_or_else(|| PathBuf::from(&config.export.default_filename));
        let rows = run.export(&path, config.export.delimiter_byte()?)?;
        println!();
        println!("Exported {} rows to {}", rows, path.display());
    }

    run.stats.log_summary();
    Ok(())
}
