//! LBRS Sync CLI
//!
//! The command-line interface for synchronizing statewide LBRS county layers
//! into a GeoPackage store.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing if verbose
    if cli.verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");
        tracing::debug!("Verbose mode enabled");
    }

    let config_path = cli.config.as_deref();

    match cli.command {
        Some(Commands::Sync {
            force,
            limit,
            counties,
            layers,
            json,
        }) => {
            let mut config = commands::load_config(config_path)?;
            commands::narrow_config(&mut config, &counties, &layers)?;
            if force {
                config.force_import = true;
            }
            if limit.is_some() {
                config.feature_limit = limit;
            }
            commands::run_sync(&config, json)
        }
        Some(Commands::Fetch {
            projections,
            counties,
            layers,
            json,
        }) => {
            let mut config = commands::load_config(config_path)?;
            commands::narrow_config(&mut config, &counties, &layers)?;
            commands::run_fetch(&config, projections, json)
        }
        Some(Commands::Config) => {
            let config = commands::load_config(config_path)?;
            commands::run_config(&config)
        }
        None => {
            // No command provided - show help hint
            println!("{} LBRS Sync CLI", "lbrs".green().bold());
            println!();
            println!("Run {} for available commands.", "lbrs --help".cyan());
            Ok(())
        }
    }
}
