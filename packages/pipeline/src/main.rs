#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the field data pipeline.

use std::io::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use field_data_pipeline::output::write_csv;
use field_data_pipeline::validate::validate_csv;
use field_data_pipeline_models::{CONFIG_ENV, DEFAULT_CONFIG_PATH, load_config};

#[derive(Parser)]
#[command(name = "field_data", about = "Field record correction and weather enrichment")]
struct Cli {
    /// Pipeline config file
    #[arg(long, global = true, env = CONFIG_ENV, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest, correct, and merge field records, then write them as CSV
    Process {
        /// Output file (defaults to stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Check a corrected CSV for negative elevations and unknown crop types
    Validate {
        /// CSV file to check
        #[arg(long)]
        input: PathBuf,
    },
    /// Print the resolved configuration
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Process { output } => {
            let merged = field_data_pipeline::run(config).await.map_err(|e| {
                log::error!("Pipeline failed at {} stage: {e}", e.stage());
                e
            })?;

            if let Some(path) = output {
                let file = std::fs::File::create(&path)?;
                write_csv(&merged.table, std::io::BufWriter::new(file))?;
                log::info!("Wrote {} rows to {}", merged.len(), path.display());
            } else {
                write_csv(&merged.table, std::io::stdout().lock())?;
            }
        }
        Commands::Validate { input } => {
            let violations = validate_csv(&input, &config)?;
            if violations.is_empty() {
                log::info!("{}: no violations", input.display());
            } else {
                let mut stdout = std::io::stdout().lock();
                for violation in &violations {
                    writeln!(stdout, "{violation}")?;
                }
                log::error!("{}: {} violation(s)", input.display(), violations.len());
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::ShowConfig => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(ExitCode::SUCCESS)
}
