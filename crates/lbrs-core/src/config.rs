//! Runtime configuration for the sync engine
//!
//! One explicit value passed at construction, loaded from a TOML file with
//! per-field defaults. Every recognized option is a typed field here; there
//! is no scattered global state.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog;
use crate::domain::{CountyCode, LayerKey, LayerType};
use crate::srs::{self, SrsCode};
use crate::{Error, Result};

fn default_workspace() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Downloads")
        .join("LBRS")
}

fn default_store_name() -> String {
    "OGRIP_LBRS.gpkg".to_string()
}

fn default_true() -> bool {
    true
}

fn default_target_srs() -> SrsCode {
    srs::DEFAULT_TARGET
}

fn default_source_url() -> String {
    "http://gis3.oit.ohio.gov/LBRS/_downloads".to_string()
}

fn default_boundary_url() -> String {
    // ODOT county boundary feature query, returned as GeoJSON.
    "https://gis.dot.state.oh.us/arcgis/rest/services/TIMS/Boundaries/MapServer/2/query\
     ?where=1%3D1&outFields=*&returnGeometry=true&geometryType=esriGeometryPolygon\
     &inSR=4326&spatialRel=esriSpatialRelIntersects&returnTrueCurves=true\
     &returnIdsOnly=false&returnCountOnly=false&returnZ=false&returnM=false\
     &returnDistinctValues=false&returnExtentsOnly=false&f=pjson"
        .to_string()
}

fn default_boundary_source_layer() -> String {
    "OGRGeoJSON".to_string()
}

fn default_boundary_table() -> String {
    "county".to_string()
}

fn default_transaction_size() -> u32 {
    20_000
}

fn default_ogr2ogr() -> PathBuf {
    PathBuf::from("ogr2ogr")
}

fn default_ogrinfo() -> PathBuf {
    PathBuf::from("ogrinfo")
}

/// Configuration for one sync run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Fast local workspace for active processing. The store format handles
    /// large operations poorly over a network, so this should be local disk.
    #[serde(default = "default_workspace")]
    pub workspace: PathBuf,

    /// Durable archive location. Absent means archive-in-place: the
    /// workspace doubles as the archive and promotion transfers are no-ops.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive: Option<PathBuf>,

    /// Filename of the GeoPackage store in both locations.
    #[serde(default = "default_store_name")]
    pub store_name: String,

    /// Whether a clean run is promoted to the archive at the end.
    #[serde(default = "default_true")]
    pub archive_enabled: bool,

    /// Remove workspace files at the start of the run and rebuild from the
    /// archive. Disabling keeps existing layers, useful for partial updates.
    #[serde(default = "default_true")]
    pub clean_workspace: bool,

    /// Re-import every layer regardless of the freshness comparison.
    #[serde(default)]
    pub force_import: bool,

    /// Cap on features loaded per layer (testing aid); unlimited when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_limit: Option<u64>,

    /// Target projection for every imported layer.
    #[serde(default = "default_target_srs")]
    pub target_srs: SrsCode,

    /// Counties to synchronize. Defaults to the full statewide catalog.
    #[serde(default = "catalog::all_counties")]
    pub counties: Vec<CountyCode>,

    /// Layer types to synchronize.
    #[serde(default = "catalog::default_layer_types")]
    pub layer_types: Vec<LayerType>,

    /// Export-of-interest subset: counties whose corrected layers are also
    /// packaged as standalone shapefiles.
    #[serde(default = "catalog::default_export_counties")]
    pub export_counties: Vec<CountyCode>,

    /// Layer keys whose omission is expected and does not block promotion.
    #[serde(default = "catalog::anticipated_omissions")]
    pub anticipated_omissions: Vec<LayerKey>,

    /// Base URL of the per-layer archive downloads.
    #[serde(default = "default_source_url")]
    pub source_url: String,

    /// Feature query that rebuilds the county boundary layer.
    #[serde(default = "default_boundary_url")]
    pub boundary_url: String,

    /// Source layer token the translation utility reads the boundary
    /// payload through.
    #[serde(default = "default_boundary_source_layer")]
    pub boundary_source_layer: String,

    /// Name of the boundary table inside the store.
    #[serde(default = "default_boundary_table")]
    pub boundary_table: String,

    /// Local empty-store template used when no archive store exists yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_template: Option<PathBuf>,

    /// Per-transaction feature-count governor for the translation utility.
    #[serde(default = "default_transaction_size")]
    pub transaction_size: u32,

    /// Translation utility binary.
    #[serde(default = "default_ogr2ogr")]
    pub ogr2ogr: PathBuf,

    /// Inspection utility binary (SQL against the store).
    #[serde(default = "default_ogrinfo")]
    pub ogrinfo: PathBuf,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            workspace: default_workspace(),
            archive: None,
            store_name: default_store_name(),
            archive_enabled: true,
            clean_workspace: true,
            force_import: false,
            feature_limit: None,
            target_srs: default_target_srs(),
            counties: catalog::all_counties(),
            layer_types: catalog::default_layer_types(),
            export_counties: catalog::default_export_counties(),
            anticipated_omissions: catalog::anticipated_omissions(),
            source_url: default_source_url(),
            boundary_url: default_boundary_url(),
            boundary_source_layer: default_boundary_source_layer(),
            boundary_table: default_boundary_table(),
            store_template: None,
            transaction_size: default_transaction_size(),
            ogr2ogr: default_ogr2ogr(),
            ogrinfo: default_ogrinfo(),
        }
    }
}

impl SyncConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Path of the store inside the workspace.
    pub fn store_path(&self) -> PathBuf {
        self.workspace.join(&self.store_name)
    }

    /// Archive directory, falling back to the workspace (archive-in-place).
    pub fn archive_dir(&self) -> &Path {
        self.archive.as_deref().unwrap_or(&self.workspace)
    }

    /// Path of the store inside the archive.
    pub fn archive_store_path(&self) -> PathBuf {
        self.archive_dir().join(&self.store_name)
    }

    /// Directory holding exported shapefile packages.
    pub fn export_dir(&self) -> PathBuf {
        self.workspace.join("SHPs")
    }

    /// Directory holding raw fallback archives (misalignment evidence).
    pub fn raw_dir(&self) -> PathBuf {
        self.workspace.join("raw")
    }

    /// Directory holding projection-only downloads.
    pub fn prj_dir(&self) -> PathBuf {
        self.workspace.join("PRJs")
    }

    /// Every (county, layer type) pair of this run, county-major, in
    /// configured order.
    pub fn layer_keys(&self) -> Vec<LayerKey> {
        let mut keys = Vec::with_capacity(self.counties.len() * self.layer_types.len());
        for county in &self.counties {
            for layer in &self.layer_types {
                keys.push(LayerKey::new(county.clone(), *layer));
            }
        }
        keys
    }

    /// Whether a county is in the export-of-interest subset.
    pub fn is_export_county(&self, county: &CountyCode) -> bool {
        self.export_counties.contains(county)
    }

    /// Whether an omission of this key is anticipated (allow-listed).
    pub fn is_anticipated(&self, key: &LayerKey) -> bool {
        self.anticipated_omissions.contains(key)
    }
}
