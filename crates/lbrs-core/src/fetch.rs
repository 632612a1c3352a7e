//! Raw fetch mode: download archives or projection sidecars, no store
//!
//! The counterpart to a full sync run for when only the upstream bytes are
//! wanted: whole archives land in `raw/`, projection sidecars in `PRJs/`.
//! Failures are per-layer, mirroring the sync engine's isolation.

use std::path::PathBuf;

use serde::Serialize;

use crate::config::SyncConfig;
use crate::domain::LayerKey;
use crate::source::{LayerSource, Probe};
use crate::Result;

/// What to download per layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// The whole zip archive.
    Archive,
    /// Only the `.prj` projection sidecar.
    Projection,
}

/// Outcome of one fetch run.
#[derive(Debug, Default, Serialize)]
pub struct FetchReport {
    /// Files written, in layer order.
    pub fetched: Vec<PathBuf>,
    /// Layers with nothing to fetch (absent upstream, no sidecar, or a
    /// failed download).
    pub missing: Vec<LayerKey>,
}

/// Download the configured layers without touching any store.
pub fn run<S: LayerSource>(
    config: &SyncConfig,
    source: &S,
    kind: FetchKind,
) -> Result<FetchReport> {
    let dest_dir = match kind {
        FetchKind::Archive => config.raw_dir(),
        FetchKind::Projection => config.prj_dir(),
    };
    std::fs::create_dir_all(&dest_dir)?;

    let mut report = FetchReport::default();
    for key in config.layer_keys() {
        match source.probe(&key) {
            Ok(Probe::Available { .. }) => {}
            Ok(Probe::Unavailable) => {
                tracing::warn!(key = %key, "nothing published upstream");
                report.missing.push(key);
                continue;
            }
            Err(err) => {
                tracing::warn!(key = %key, %err, "probe failed");
                report.missing.push(key);
                continue;
            }
        }

        let fetched = match kind {
            FetchKind::Archive => source.fetch_archive(&key, &dest_dir).map(Some),
            FetchKind::Projection => source.fetch_projection(&key, &dest_dir),
        };
        match fetched {
            Ok(Some(path)) => report.fetched.push(path),
            Ok(None) => {
                tracing::info!(key = %key, "no projection sidecar in the archive");
                report.missing.push(key);
            }
            Err(err) => {
                tracing::warn!(key = %key, %err, "fetch failed");
                report.missing.push(key);
            }
        }
    }

    tracing::info!(
        fetched = report.fetched.len(),
        missing = report.missing.len(),
        "fetch complete"
    );
    Ok(report)
}
