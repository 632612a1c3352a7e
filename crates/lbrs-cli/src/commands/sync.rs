//! Sync command implementation

use colored::Colorize;

use lbrs_core::{Decision, HttpSource, OgrUtility, SyncConfig, SyncEngine};

use crate::error::Result;

/// Run the sync command
///
/// Drives one full engine run and prints either a human summary or the raw
/// JSON report.
pub fn run_sync(config: &SyncConfig, json: bool) -> Result<()> {
    if !json {
        println!(
            "{} Synchronizing {} layers into {}...",
            "=>".blue().bold(),
            config.layer_keys().len(),
            config.store_path().display().to_string().cyan()
        );
    }

    let utility = OgrUtility::new(&config.ogr2ogr, &config.ogrinfo);
    let source = HttpSource::new(&config.source_url);
    let engine = SyncEngine::new(config, &utility, &source);
    let report = engine.run()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "   {} updated, {} already current",
        report.state.updated.len().to_string().green(),
        report.state.up_to_date
    );
    for key in &report.state.missing_source {
        println!("   {} {} missing upstream", "-".yellow(), key);
    }
    for key in &report.state.empty {
        println!("   {} {} imported zero features", "!".red(), key);
    }
    for key in &report.state.mismatched {
        println!("   {} {} failed the spatial check", "!".red(), key);
    }

    match &report.decision {
        Decision::Promote => {
            println!(
                "{} Store promoted to {}.",
                "OK".green().bold(),
                config.archive_store_path().display()
            );
        }
        Decision::Hold { reasons } => {
            println!("{} Promotion held:", "HELD".yellow().bold());
            for reason in reasons {
                println!("   {} {}", "-".yellow(), reason);
            }
        }
    }
    Ok(())
}
