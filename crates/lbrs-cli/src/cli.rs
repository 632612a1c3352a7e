//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// LBRS Sync - Synchronize statewide LBRS county layers into a GeoPackage store
#[derive(Parser, Debug)]
#[command(name = "lbrs")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true, env = "LBRS_CONFIG")]
    pub config: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Synchronize the configured layers into the workspace store
    ///
    /// Imports every (county, layer type) pair whose upstream archive
    /// timestamp differs from the recorded one, validates the results, and
    /// promotes the store to the archive when the run is clean.
    ///
    /// Examples:
    ///   lbrs sync                         # Full statewide run
    ///   lbrs sync -c config.toml --json   # Machine-readable report
    ///   lbrs sync --county HAR --county ALL --force
    Sync {
        /// Re-import every layer regardless of recorded timestamps
        #[arg(long)]
        force: bool,

        /// Limit features per layer (testing aid)
        #[arg(long)]
        limit: Option<u64>,

        /// Narrow the run to these counties (repeatable)
        #[arg(long = "county")]
        counties: Vec<String>,

        /// Narrow the run to these layer types (repeatable)
        #[arg(long = "layer")]
        layers: Vec<String>,

        /// Output the run report as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Download raw layer archives without touching any store
    ///
    /// Whole archives land in the workspace raw/ directory; with
    /// --projections only the .prj sidecars are extracted, into PRJs/.
    Fetch {
        /// Extract only the projection sidecars
        #[arg(long)]
        projections: bool,

        /// Narrow the run to these counties (repeatable)
        #[arg(long = "county")]
        counties: Vec<String>,

        /// Narrow the run to these layer types (repeatable)
        #[arg(long = "layer")]
        layers: Vec<String>,

        /// Output the fetch report as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration as TOML
    Config,
}
