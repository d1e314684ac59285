//! Sagres CLI binary.
//!
//! Runs the Quality Minus Junk pipeline over a directory of CSV tables.

mod cmd;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "sagres")]
#[command(about = "Quality Minus Junk factor pipeline", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Date range and model parameters shared by the subcommands.
#[derive(clap::Args, Debug, Clone)]
pub(crate) struct RunArgs {
    /// Directory holding returns.csv, fundamentals.csv and links.csv
    #[arg(short, long = "data-dir")]
    data_dir: PathBuf,

    /// Start date (YYYY-MM-DD, defaults to SAGRES_START_DATE)
    #[arg(long)]
    start: Option<String>,

    /// End date (YYYY-MM-DD, defaults to SAGRES_END_DATE)
    #[arg(long)]
    end: Option<String>,

    /// Per-period risk-free rate (defaults to SAGRES_RISK_FREE_RATE or 0)
    #[arg(long = "risk-free")]
    risk_free_rate: Option<f64>,

    /// Months a fundamentals report must age before use
    #[arg(long, default_value = "12")]
    lag_months: u32,

    /// Read every row, skipping the format and link-type filters
    #[arg(long)]
    no_filters: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline and report the spread metrics
    Run {
        #[command(flatten)]
        args: RunArgs,

        /// Metrics to compute
        #[arg(short, long, value_delimiter = ',', default_value = "t-test,regression,sharpe")]
        metrics: Vec<cmd::Metric>,

        /// Directory for the output tables and metrics.json
        #[arg(short, long = "output")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Load the inputs and check that they can be joined
    Validate {
        #[command(flatten)]
        args: RunArgs,
    },
}

/// Console output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum Format {
    Text,
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Warning: logging was already initialized");
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Run {
            args,
            metrics,
            output,
            format,
        } => cmd::run::run_pipeline(&args, &metrics, output, format),
        Commands::Validate { args } => cmd::validate::validate_inputs(&args),
    }
}
