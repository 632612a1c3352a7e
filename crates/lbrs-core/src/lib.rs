//! Core engine for LBRS Sync
//!
//! Synchronizes a GeoPackage store of statewide county vector layers against
//! the publisher's per-county zip archives:
//!
//! - **Freshness**: a ledger table inside the store records the upstream
//!   timestamp each layer was imported at; layers re-import only when the
//!   publisher's archive timestamp changes
//! - **Correction**: a fixed SRS override table repairs known upstream
//!   projection mislabels during import
//! - **Validation**: imported layers must hold features that spatially
//!   intersect their own county boundary
//! - **Promotion**: the workspace store replaces the durable archive only
//!   when every failure is on the anticipated-omission allow-list
//!
//! All store access goes through external GDAL/OGR binaries behind the
//! [`gdal::VectorUtility`] trait; all publisher access goes through
//! [`source::LayerSource`]. Both seams take fakes in tests.

pub mod catalog;
pub mod config;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod gdal;
pub mod ledger;
pub mod source;
pub mod srs;
pub mod sync;

pub use config::SyncConfig;
pub use domain::{CountyCode, LayerKey, LayerType};
pub use error::{Error, Result};
pub use gdal::{OgrUtility, TranslateRequest, VectorUtility};
pub use source::{ArtifactManifest, HttpSource, LayerSource, Probe};
pub use sync::{Decision, RunReport, RunState, SyncEngine};
