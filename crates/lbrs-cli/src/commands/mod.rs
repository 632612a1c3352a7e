//! Command implementations

mod fetch;
mod sync;

pub use fetch::run_fetch;
pub use sync::run_sync;

use std::path::Path;

use lbrs_core::SyncConfig;

use crate::error::Result;

/// Load configuration from an explicit file, or fall back to the built-in
/// statewide defaults.
pub fn load_config(path: Option<&Path>) -> Result<SyncConfig> {
    match path {
        Some(path) => Ok(SyncConfig::load(path)?),
        None => Ok(SyncConfig::default()),
    }
}

/// Apply command-line county/layer narrowing on top of the loaded config.
pub fn narrow_config(
    config: &mut SyncConfig,
    counties: &[String],
    layers: &[String],
) -> Result<()> {
    if !counties.is_empty() {
        config.counties = counties
            .iter()
            .map(|code| code.parse().map_err(crate::error::CliError::Core))
            .collect::<Result<_>>()?;
    }
    if !layers.is_empty() {
        config.layer_types = layers
            .iter()
            .map(|code| code.parse().map_err(crate::error::CliError::Core))
            .collect::<Result<_>>()?;
    }
    Ok(())
}

/// Print the effective configuration as TOML.
pub fn run_config(config: &SyncConfig) -> Result<()> {
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| crate::error::CliError::user(format!("could not render config: {e}")))?;
    print!("{rendered}");
    Ok(())
}
