//! Fetch command implementation

use colored::Colorize;

use lbrs_core::fetch::{self, FetchKind};
use lbrs_core::{HttpSource, SyncConfig};

use crate::error::Result;

/// Run the fetch command: raw archives, or projection sidecars only.
pub fn run_fetch(config: &SyncConfig, projections: bool, json: bool) -> Result<()> {
    let kind = if projections {
        FetchKind::Projection
    } else {
        FetchKind::Archive
    };
    if !json {
        let what = if projections {
            "projection sidecars"
        } else {
            "raw archives"
        };
        println!(
            "{} Fetching {} for {} layers...",
            "=>".blue().bold(),
            what,
            config.layer_keys().len()
        );
    }

    let source = HttpSource::new(&config.source_url);
    let report = fetch::run(config, &source, kind)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "   {} fetched, {} missing",
        report.fetched.len().to_string().green(),
        report.missing.len()
    );
    for key in &report.missing {
        println!("   {} {}", "-".yellow(), key);
    }
    Ok(())
}
