//! deembed: open/short de-embedding of two-port S-parameter measurements.
//!
//! This is the main entry point for the de-embedding tool.

mod config;
mod orchestrator;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use deembed_core::calibration::SingularityPolicy;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Overrides;
use crate::orchestrator::{Orchestrator, RunRequest};

#[derive(Parser)]
#[command(name = "deembed")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Summary format
    #[arg(short, long, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// De-embed one DUT measurement
    Run {
        /// DUT measurement (.csv or .s2p)
        #[arg(long)]
        dut: PathBuf,

        /// Short calibration structure
        #[arg(long)]
        short: PathBuf,

        /// Open calibration structure
        #[arg(long)]
        open: PathBuf,

        /// Output file (.s2p writes Touchstone, anything else CSV)
        #[arg(short, long)]
        output: PathBuf,

        /// Run configuration (TOML, or JSON with a .json extension)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Reference impedance in ohms
        #[arg(long)]
        z0: Option<f64>,

        /// Behaviour on singular frequency points
        #[arg(long)]
        policy: Option<SingularityPolicy>,

        /// Also write a raw vs de-embedded comparison table
        #[arg(long)]
        compare: Option<PathBuf>,

        /// Write Touchstone regardless of the output extension
        #[arg(long)]
        touchstone: bool,
    },

    /// De-embed every open/short/DUT set found in a directory
    Batch {
        /// Directory with measurement files
        #[arg(short, long)]
        input_dir: PathBuf,

        /// Directory for results
        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,

        /// Run configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Merge every structure of every set into one table
    Merge {
        /// Directory with measurement files
        #[arg(short, long)]
        input_dir: PathBuf,

        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,

        /// Reference impedance in ohms for CSV inputs
        #[arg(long)]
        z0: Option<f64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match cli.command {
        Commands::Run {
            dut,
            short,
            open,
            output,
            config,
            z0,
            policy,
            compare,
            touchstone,
        } => {
            let overrides = Overrides {
                z0,
                policy,
            };
            let request = RunRequest {
                dut,
                short,
                open,
                output,
                compare,
                touchstone,
            };
            run_single(config.as_deref(), overrides, &request, cli.format)?;
        }
        Commands::Batch {
            input_dir,
            output_dir,
            config,
        } => {
            run_batch(config.as_deref(), &input_dir, &output_dir, cli.format)?;
        }
        Commands::Merge {
            input_dir,
            output,
            z0,
        } => {
            let config = config::resolve(None, Overrides { z0, policy: None })?;
            let rows = Orchestrator::new(config)?.merge(&input_dir, &output)?;
            println!("Wrote {} rows to {}", rows, output.display());
        }
    }

    Ok(())
}

fn run_single(
    config_path: Option<&Path>,
    overrides: Overrides,
    request: &RunRequest,
    format: OutputFormat,
) -> Result<()> {
    let config = config::resolve(config_path, overrides)?;
    let report = Orchestrator::new(config)?.run(request)?;

    output::write_run(&mut std::io::stdout().lock(), &report, format)?;
    Ok(())
}

fn run_batch(
    config_path: Option<&Path>,
    input_dir: &Path,
    output_dir: &Path,
    format: OutputFormat,
) -> Result<()> {
    tracing::info!("Scanning {:?}", input_dir);

    let config = config::resolve(config_path, Overrides::default())?;
    let report = Orchestrator::new(config)?.run_batch(input_dir, output_dir)?;

    output::write_batch(&mut std::io::stdout().lock(), &report, format)?;

    let failed = report.failures();
    if failed > 0 {
        anyhow::bail!("{} of {} sets failed", failed, report.sets.len());
    }
    Ok(())
}
