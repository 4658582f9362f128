//! CLI entry point for the driftbook rebalancer.

use std::io;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use driftbook_rebalancer::config::{Config, OutputFormat};
use driftbook_rebalancer::run::{self, PlanOptions};

#[derive(Parser)]
#[command(name = "rebalancer")]
#[command(about = "Multi-account portfolio rebalancer")]
#[command(version)]
struct Cli {
    /// Path to rebalance.toml
    #[arg(long, default_value = "rebalance.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compute and print the rebalance orders
    Plan {
        /// Output format (overrides the config file)
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,

        /// Write orders to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Show current holdings and total value
    Holdings,

    /// Show the allocation the plan would produce
    Project,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            process::exit(1);
        }
    };

    let mut stdout = io::stdout().lock();
    let result = match cli.command {
        Command::Plan { format, output } => {
            let mut opts = PlanOptions::from_config(&config);
            if let Some(format) = format {
                opts.format = format;
            }
            if output.is_some() {
                opts.output = output;
            }
            run::plan(&config, &cli.config, &opts, &mut stdout).map(|_| ())
        }
        Command::Holdings => run::holdings(&config, &cli.config, &mut stdout).map(|_| ()),
        Command::Project => run::project(&config, &cli.config, &mut stdout).map(|_| ()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
