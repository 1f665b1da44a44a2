//! tickbars CLI - Custom tick charts from bar files.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod display;
mod input;

use display::Format;

#[derive(Parser)]
#[command(name = "tickbars")]
#[command(about = "Fold fine tick bars into custom-size tick bars", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress progress output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build synthetic bars for a chart
    Aggregate {
        /// Chart bar file (CSV with timestamp, open, high, low, close columns)
        chart: PathBuf,

        /// Chart time frame (e.g. Tick5)
        #[arg(short, long)]
        timeframe: String,

        /// Synthetic bar size in ticks (overrides the config file)
        #[arg(short, long)]
        size: Option<u32>,

        /// Extra source stream as GRANULARITY=FILE (e.g. Tick1=ticks.csv)
        #[arg(long = "source", value_name = "GRANULARITY=FILE")]
        sources: Vec<String>,

        /// Only resolve against the granularities given with --source
        #[arg(long)]
        available_only: bool,

        /// Session config file (JSON). Defaults to the user config directory.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output file for synthetic bars. Defaults to <chart>.bars.<format>
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output file for the projected chart series
        #[arg(long)]
        series: Option<PathBuf>,

        /// Output file for bar render descriptions (JSON)
        #[arg(long)]
        drawings: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: Format,
    },

    /// Show how a bar size would be fed from a chart granularity
    Resolve {
        /// Synthetic bar size in ticks
        size: u32,

        /// Chart time frame (e.g. Tick10)
        #[arg(short, long, default_value = "Tick1")]
        current: String,

        /// Restrict the catalog to these granularities (e.g. 1,2,4)
        #[arg(long, value_delimiter = ',')]
        catalog: Option<Vec<u32>>,
    },

    /// List catalog granularities
    Granularities {
        /// Only granularities that evenly divide this size
        #[arg(short, long)]
        divides: Option<u32>,
    },
}

/// Installs the log subscriber; `RUST_LOG` takes precedence over `-v`.
fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    // Show help if no command provided
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Aggregate {
            chart,
            timeframe,
            size,
            sources,
            available_only,
            config,
            output,
            series,
            drawings,
            format,
        } => {
            commands::aggregate::aggregate(
                commands::aggregate::AggregateArgs {
                    chart,
                    timeframe,
                    size,
                    sources,
                    available_only,
                    config,
                    output,
                    series,
                    drawings,
                    format,
                },
                cli.quiet,
            )
            .await
        }
        Commands::Resolve {
            size,
            current,
            catalog,
        } => commands::resolve::resolve(size, &current, catalog.as_deref()),
        Commands::Granularities { divides } => commands::granularities::list(divides),
    }
}
