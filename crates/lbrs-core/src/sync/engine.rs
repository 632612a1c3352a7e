//! The sync engine: one run over the configured layer set
//!
//! Failures are isolated per layer. A layer that cannot be probed, imported,
//! or validated is recorded and the run moves on; only workspace-level
//! problems (no store, no lock, unreadable boundary payload) abort the run.

use std::fs::File;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::Serialize;

use crate::config::SyncConfig;
use crate::domain::LayerKey;
use crate::gdal::VectorUtility;
use crate::ledger::{self, FreshnessLedger, SENTINEL_STAMP};
use crate::source::{LayerSource, Probe};
use crate::sync::promote::{self, Decision};
use crate::sync::state::RunState;
use crate::sync::{export, import, validate};
use crate::{Error, Result};

const LOCK_FILE: &str = ".lbrs.lock";

/// What one run did, in machine-readable form.
#[derive(Debug, Serialize)]
pub struct RunReport {
    #[serde(flatten)]
    pub state: RunState,
    #[serde(flatten)]
    pub decision: Decision,
    /// Whether the archive was actually replaced.
    pub promoted: bool,
}

/// Holds the workspace lock for the duration of a run.
struct WorkspaceLock {
    _file: File,
}

/// One configured run over a layer source and a vector utility.
pub struct SyncEngine<'a, U, S> {
    config: &'a SyncConfig,
    utility: &'a U,
    source: &'a S,
    store: PathBuf,
}

impl<'a, U: VectorUtility, S: LayerSource> SyncEngine<'a, U, S> {
    pub fn new(config: &'a SyncConfig, utility: &'a U, source: &'a S) -> Self {
        Self {
            config,
            utility,
            source,
            store: config.store_path(),
        }
    }

    /// Run the full pipeline: prepare the workspace, sync every configured
    /// layer, gate the promotion, and summarize.
    pub fn run(&self) -> Result<RunReport> {
        std::fs::create_dir_all(&self.config.workspace)?;
        let _lock = self.lock_workspace()?;
        self.prepare_workspace()?;

        let mut state = RunState::default();
        for key in self.config.layer_keys() {
            self.sync_layer(&key, &mut state);
        }

        let decision = promote::decide(self.config, &state);
        let promoted = match &decision {
            Decision::Promote => {
                self.promote()?;
                true
            }
            Decision::Hold { reasons } => {
                for reason in reasons {
                    tracing::warn!("promotion held: {reason}");
                }
                false
            }
        };
        self.summarize(&state, promoted);
        Ok(RunReport {
            state,
            decision,
            promoted,
        })
    }

    fn lock_workspace(&self) -> Result<WorkspaceLock> {
        let path = self.config.workspace.join(LOCK_FILE);
        let file = File::create(&path)?;
        file.try_lock_exclusive()
            .map_err(|_| Error::WorkspaceLocked { path })?;
        Ok(WorkspaceLock { _file: file })
    }

    /// Bring the workspace to a runnable state: a store exists (pulled from
    /// the archive or built from the template) and the ledger is seeded.
    fn prepare_workspace(&self) -> Result<()> {
        let store = self.config.store_path();
        let archive_store = self.config.archive_store_path();
        let in_place = archive_store == store;

        if self.config.clean_workspace {
            self.clean_workspace_files(in_place)?;
        }

        if !store.exists() {
            if self.config.archive_enabled && !in_place && archive_store.exists() {
                tracing::info!(from = %archive_store.display(), "pulling store from archive");
                lbrs_fs::transfer(&archive_store, &store)?;
            } else {
                self.create_store_from_template(&store)?;
                import::import_boundary(self.utility, self.config)?;
            }
        }

        self.ledger().bootstrap(&self.config.layer_types)
    }

    fn create_store_from_template(&self, store: &Path) -> Result<()> {
        let Some(template) = &self.config.store_template else {
            return Err(Error::StoreMissing {
                path: store.to_path_buf(),
            });
        };
        if !template.exists() {
            return Err(Error::TemplateMissing {
                path: template.clone(),
            });
        }
        tracing::info!(template = %template.display(), "creating store from template");
        lbrs_fs::transfer(template, store)?;
        Ok(())
    }

    /// Drop workspace products so the run rebuilds from the archive. The
    /// store itself is only removed when an archive copy exists elsewhere.
    fn clean_workspace_files(&self, in_place: bool) -> Result<()> {
        let store = self.config.store_path();
        if !in_place && store.exists() && self.config.archive_store_path().exists() {
            std::fs::remove_file(&store)?;
        }
        for dir in [
            self.config.export_dir(),
            self.config.raw_dir(),
            self.config.prj_dir(),
        ] {
            if dir.exists() {
                std::fs::remove_dir_all(&dir)?;
            }
        }
        Ok(())
    }

    fn ledger(&self) -> FreshnessLedger<'_, U> {
        FreshnessLedger::new(&self.store, self.utility, &self.config.boundary_table)
    }

    /// Sync one layer end to end, recording its outcome. Never fails the
    /// run.
    fn sync_layer(&self, key: &LayerKey, state: &mut RunState) {
        let url = match self.source.probe(key) {
            Ok(Probe::Available { url }) => url,
            Ok(Probe::Unavailable) => {
                tracing::warn!(key = %key, "nothing published upstream");
                state.record_missing_source(key.clone());
                return;
            }
            Err(err) => {
                tracing::warn!(key = %key, %err, "probe failed");
                state.record_missing_source(key.clone());
                return;
            }
        };

        let manifest = match self.source.manifest(key) {
            Ok(manifest) => manifest,
            Err(err) => {
                tracing::warn!(key = %key, %err, "could not read upstream manifest");
                state.record_omitted(key.clone());
                return;
            }
        };
        let fresh = match manifest.canonical(key) {
            Ok(stamp) => ledger::format_stamp(stamp),
            Err(err) => {
                tracing::warn!(key = %key, %err, "could not read upstream timestamp");
                state.record_omitted(key.clone());
                return;
            }
        };

        let ledger = self.ledger();
        let recorded = match ledger.lookup(key) {
            Ok(stamp) => stamp,
            Err(Error::LedgerNotFound { .. }) => {
                tracing::warn!(key = %key, "no ledger row; treating as stale");
                SENTINEL_STAMP.to_string()
            }
            Err(err) => {
                tracing::warn!(key = %key, %err, "ledger lookup failed");
                state.record_omitted(key.clone());
                return;
            }
        };

        if !self.config.force_import && recorded == fresh {
            tracing::debug!(key = %key, stamp = %fresh, "already synchronized");
            state.record_up_to_date();
            return;
        }

        // The stamp is advanced before the import so a partial import reads
        // as current-but-suspect on the next run instead of silently stale;
        // the validation buckets carry the suspicion.
        if let Err(err) = ledger.update(key, &fresh) {
            tracing::warn!(key = %key, %err, "ledger update failed");
            state.record_omitted(key.clone());
            return;
        }

        let translate_source = format!("/vsizip/vsicurl/{url}");
        if let Err(err) = import::import_layer(self.utility, self.config, key, translate_source) {
            tracing::warn!(key = %key, %err, "import failed");
            state.record_omitted(key.clone());
            return;
        }

        match validate::validate(self.utility, &self.store, key, &self.config.boundary_table) {
            Ok(validate::Verdict::Valid) => {}
            Ok(validate::Verdict::Empty) => {
                tracing::warn!(key = %key, "layer imported zero features");
                state.record_empty(key.clone());
                return;
            }
            Ok(validate::Verdict::Misaligned) => {
                state.record_mismatched(key.clone());
                self.fetch_evidence(key);
                return;
            }
            Err(err) => {
                tracing::warn!(key = %key, %err, "validation failed");
                state.record_omitted(key.clone());
                return;
            }
        }

        state.record_updated(key.clone());

        if self.config.is_export_county(&key.county) {
            if let Err(err) = export::export_layer(self.utility, self.config, key, &manifest) {
                tracing::warn!(key = %key, %err, "export failed");
                state.record_omitted(key.clone());
            }
        }
    }

    /// Keep the raw archive of a misaligned layer for offline inspection.
    /// A failed download here only loses the evidence, not the verdict.
    fn fetch_evidence(&self, key: &LayerKey) {
        match self.source.fetch_archive(key, &self.config.raw_dir()) {
            Ok(path) => {
                tracing::info!(key = %key, path = %path.display(), "kept raw archive for inspection")
            }
            Err(err) => tracing::warn!(key = %key, %err, "could not keep raw archive"),
        }
    }

    /// Replace the archive with this run's store and export packages.
    fn promote(&self) -> Result<()> {
        let store = self.config.store_path();
        let archive_store = self.config.archive_store_path();
        if archive_store == store {
            tracing::info!("archive-in-place; nothing to transfer");
            return Ok(());
        }

        tracing::info!(to = %archive_store.display(), "promoting store to archive");
        lbrs_fs::transfer(&store, &archive_store)?;

        let export_dir = self.config.export_dir();
        if export_dir.exists() {
            let archive_exports = self.config.archive_dir().join("SHPs");
            lbrs_fs::transfer(&export_dir, &archive_exports)?;
        }

        if self.config.clean_workspace {
            self.clean_workspace_files(false)?;
        }
        Ok(())
    }

    fn summarize(&self, state: &RunState, promoted: bool) {
        tracing::info!(
            updated = state.updated.len(),
            up_to_date = state.up_to_date,
            omitted = state.omitted.len(),
            empty = state.empty.len(),
            mismatched = state.mismatched.len(),
            promoted,
            "run complete"
        );
        for key in &state.missing_source {
            tracing::info!(key = %key, "missing upstream");
        }
        for key in &state.empty {
            tracing::warn!(key = %key, "empty after import");
        }
        for key in &state.mismatched {
            tracing::warn!(key = %key, "spatially misaligned");
        }
    }
}
