use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod settings;
mod utils;

use settings::Settings;

/// Tag flow log records by destination port and protocol
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Sets the level of verbosity
    #[clap(short, long, global = true)]
    verbose: bool,

    /// Configuration file (TOML, YAML or JSON)
    #[clap(short, long, global = true)]
    config: Option<PathBuf>,

    #[clap(flatten)]
    overrides: Overrides,

    /// Subcommand to execute (defaults to `report`)
    #[clap(subcommand)]
    command: Option<Commands>,
}

/// Command-line values that take precedence over the config file and
/// environment.
#[derive(Args, Debug, Default)]
pub struct Overrides {
    /// Lookup table (dstport,protocol,tag)
    #[clap(short, long, global = true)]
    lookup: Option<PathBuf>,

    /// Flow log file
    #[clap(short, long, global = true)]
    flows: Option<PathBuf>,

    /// Report destination
    #[clap(short, long, global = true)]
    output: Option<PathBuf>,

    /// Report format: text or json
    #[clap(long, global = true)]
    format: Option<String>,

    /// Field delimiter of the lookup table
    #[clap(short, long, global = true)]
    delimiter: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify the flow log and write the report
    Report,

    /// Load the lookup table and print its entries
    Lookup,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(
        if cli.verbose { "debug" } else { "info" }
    )).init();

    let settings = Settings::load(cli.config.as_deref(), &cli.overrides)?;

    // Execute the specified command
    match cli.command.unwrap_or(Commands::Report) {
        Commands::Report => commands::report::run(&settings)?,
        Commands::Lookup => commands::lookup::show(&settings)?,
    }

    Ok(())
}
