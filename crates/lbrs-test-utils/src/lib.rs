//! Shared test fixtures for LBRS Sync
//!
//! In-memory stand-ins for the two seams the engine runs against: a
//! [`FakeSource`] that plays the publisher and a [`FakeUtility`] that models
//! the store well enough to answer the engine's SQL. Both are deterministic
//! and filesystem-light so integration tests stay fast.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use lbrs_core::gdal::{OutputFormat, TranslateRequest, VectorUtility};
use lbrs_core::source::{ArtifactManifest, LayerSource, Probe};
use lbrs_core::{Error, LayerKey, Result, SyncConfig};

/// Parse a `%Y-%m-%d %H:%M:%S` literal in tests.
pub fn stamp(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").expect("valid test timestamp")
}

/// Parse a layer key literal in tests.
pub fn key(name: &str) -> LayerKey {
    name.parse().expect("valid test layer key")
}

/// A config rooted in a temp directory: local workspace, separate archive,
/// no cleaning, narrowed to nothing until counties are set.
pub fn test_config(root: &Path) -> SyncConfig {
    let mut config = SyncConfig::default();
    config.workspace = root.join("ws");
    config.archive = Some(root.join("archive"));
    config.clean_workspace = false;
    config.counties = Vec::new();
    config.layer_types = Vec::new();
    config
}

/// Create the workspace and drop an empty store file into it, skipping the
/// template path of workspace preparation.
pub fn seed_store(config: &SyncConfig) -> std::io::Result<()> {
    std::fs::create_dir_all(&config.workspace)?;
    std::fs::write(config.store_path(), b"gpkg")
}

// ---------------------------------------------------------------------------
// FakeSource

/// One scripted upstream layer.
#[derive(Debug, Clone)]
pub struct FakeLayer {
    /// Canonical `.shp` entry timestamp.
    pub stamp: NaiveDateTime,
    /// Whether the archive carries a `.prj` sidecar.
    pub has_prj: bool,
}

/// Scripted publisher: layers it knows probe as available, everything else
/// is a no-show.
#[derive(Debug, Default)]
pub struct FakeSource {
    layers: BTreeMap<LayerKey, FakeLayer>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&mut self, key: LayerKey, stamp: NaiveDateTime) -> &mut Self {
        self.layers.insert(
            key,
            FakeLayer {
                stamp,
                has_prj: true,
            },
        );
        self
    }

    pub fn publish_without_prj(&mut self, key: LayerKey, stamp: NaiveDateTime) -> &mut Self {
        self.layers.insert(
            key,
            FakeLayer {
                stamp,
                has_prj: false,
            },
        );
        self
    }
}

impl LayerSource for FakeSource {
    fn probe(&self, key: &LayerKey) -> Result<Probe> {
        match self.layers.contains_key(key) {
            true => Ok(Probe::Available {
                url: format!("http://fake.test/downloads/{key}.zip"),
            }),
            false => Ok(Probe::Unavailable),
        }
    }

    fn manifest(&self, key: &LayerKey) -> Result<ArtifactManifest> {
        let layer = self.layers.get(key).ok_or_else(|| Error::Http {
            url: format!("http://fake.test/downloads/{key}.zip"),
            message: "not published".to_string(),
        })?;
        let mut manifest = ArtifactManifest::default();
        manifest.insert(ArtifactManifest::canonical_file(key), layer.stamp);
        manifest.insert(format!("{key}.dbf"), layer.stamp);
        if layer.has_prj {
            manifest.insert(format!("{key}.prj"), layer.stamp);
        }
        Ok(manifest)
    }

    fn fetch_archive(&self, key: &LayerKey, dest_dir: &Path) -> Result<PathBuf> {
        if !self.layers.contains_key(key) {
            return Err(Error::Http {
                url: format!("http://fake.test/downloads/{key}.zip"),
                message: "not published".to_string(),
            });
        }
        std::fs::create_dir_all(dest_dir)?;
        let dest = dest_dir.join(format!("{key}.zip"));
        std::fs::write(&dest, b"fake archive")?;
        Ok(dest)
    }

    fn fetch_projection(&self, key: &LayerKey, dest_dir: &Path) -> Result<Option<PathBuf>> {
        let Some(layer) = self.layers.get(key) else {
            return Err(Error::Http {
                url: format!("http://fake.test/downloads/{key}.zip"),
                message: "not published".to_string(),
            });
        };
        if !layer.has_prj {
            return Ok(None);
        }
        std::fs::create_dir_all(dest_dir)?;
        let dest = dest_dir.join(format!("{key}.prj"));
        std::fs::write(&dest, b"PROJCS[\"fake\"]")?;
        Ok(Some(dest))
    }
}

// ---------------------------------------------------------------------------
// FakeUtility

/// Scripted behavior of one store table after import.
#[derive(Debug, Clone, Copy)]
pub struct TableBehavior {
    /// Features the table reports after import.
    pub features: u64,
    /// Features among the validation sample that intersect the county.
    pub intersecting: u64,
}

impl Default for TableBehavior {
    fn default() -> Self {
        Self {
            features: 1_000,
            intersecting: 100,
        }
    }
}

#[derive(Debug, Default)]
struct StoreModel {
    /// Rows of the boundary table (county codes).
    counties: Vec<String>,
    /// Ledger rows: county -> stamp column -> value.
    ledger: BTreeMap<String, BTreeMap<String, String>>,
    /// Stamp columns with their defaults, in add order.
    columns: BTreeMap<String, String>,
    /// Per-table post-import behavior.
    behaviors: BTreeMap<String, TableBehavior>,
    /// Tables whose import is scripted to fail.
    failing: Vec<String>,
    /// Tables whose shapefile export is scripted to fail.
    failing_exports: Vec<String>,
    /// Tables actually imported this run.
    imported: Vec<String>,
    translations: Vec<TranslateRequest>,
}

/// In-memory store model that answers the engine's SQL shapes.
///
/// `translate` records the request, registers the imported table, and (for
/// shapefile exports) writes placeholder part files so packaging has bytes
/// to work with.
#[derive(Debug)]
pub struct FakeUtility {
    model: RefCell<StoreModel>,
}

fn quoted(sql: &str, after: &str) -> Option<String> {
    let rest = &sql[sql.find(after)? + after.len()..];
    let start = rest.find('"')? + 1;
    let end = start + rest[start..].find('"')?;
    Some(rest[start..end].to_string())
}

fn single_quoted(sql: &str, after: &str) -> Option<String> {
    let rest = &sql[sql.find(after)? + after.len()..];
    let start = rest.find('\'')? + 1;
    let end = start + rest[start..].find('\'')?;
    Some(rest[start..end].to_string())
}

impl FakeUtility {
    /// A store whose boundary table holds the given counties.
    pub fn with_counties(counties: &[&str]) -> Self {
        let model = StoreModel {
            counties: counties.iter().map(|c| c.to_string()).collect(),
            ..StoreModel::default()
        };
        Self {
            model: RefCell::new(model),
        }
    }

    /// Script what a table looks like once imported.
    pub fn set_behavior(&self, table: &str, features: u64, intersecting: u64) {
        self.model.borrow_mut().behaviors.insert(
            table.to_string(),
            TableBehavior {
                features,
                intersecting,
            },
        );
    }

    /// Script an import of this table to fail.
    pub fn fail_import(&self, table: &str) {
        self.model.borrow_mut().failing.push(table.to_string());
    }

    /// Script the shapefile export of this table to fail.
    pub fn fail_export(&self, table: &str) {
        self.model
            .borrow_mut()
            .failing_exports
            .push(table.to_string());
    }

    /// Pre-set a ledger stamp, as if a previous run recorded it.
    pub fn set_stamp(&self, county: &str, column: &str, value: &str) {
        let mut model = self.model.borrow_mut();
        model
            .columns
            .entry(column.to_string())
            .or_insert_with(|| "0".to_string());
        model
            .ledger
            .entry(county.to_string())
            .or_default()
            .insert(column.to_string(), value.to_string());
    }

    /// Current ledger stamp, if any.
    pub fn stamp_of(&self, county: &str, column: &str) -> Option<String> {
        self.model
            .borrow()
            .ledger
            .get(county)
            .and_then(|row| row.get(column))
            .cloned()
    }

    /// Tables imported this run, in order.
    pub fn imported(&self) -> Vec<String> {
        self.model.borrow().imported.clone()
    }

    /// Every translation request seen, in order.
    pub fn translations(&self) -> Vec<TranslateRequest> {
        self.model.borrow().translations.clone()
    }

    fn behavior(&self, table: &str) -> TableBehavior {
        self.model
            .borrow()
            .behaviors
            .get(table)
            .copied()
            .unwrap_or_default()
    }
}

impl VectorUtility for FakeUtility {
    fn translate(&self, request: &TranslateRequest) -> Result<()> {
        let mut model = self.model.borrow_mut();
        model.translations.push(request.clone());
        match request.format {
            OutputFormat::GeoPackage => {
                if let Some(name) = &request.layer_name {
                    if model.failing.contains(name) {
                        return Err(Error::UtilityFailed {
                            utility: "fake".to_string(),
                            status: Some(1),
                            stderr: format!("scripted failure for {name}"),
                        });
                    }
                    model.imported.push(name.clone());
                }
            }
            OutputFormat::Shapefile => {
                // Materialize the parts the packaging step expects.
                let table = request
                    .source_layers
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "layer".to_string());
                if model.failing_exports.contains(&table) {
                    return Err(Error::UtilityFailed {
                        utility: "fake".to_string(),
                        status: Some(1),
                        stderr: format!("scripted export failure for {table}"),
                    });
                }
                std::fs::create_dir_all(&request.dest)?;
                for ext in ["shp", "shx", "dbf", "prj"] {
                    std::fs::write(request.dest.join(format!("{table}.{ext}")), ext.as_bytes())?;
                }
            }
        }
        Ok(())
    }

    fn execute_sql(&self, _store: &Path, sql: &str) -> Result<()> {
        let mut model = self.model.borrow_mut();
        if sql.starts_with("CREATE TABLE IF NOT EXISTS") {
            return Ok(());
        }
        if sql.starts_with("INSERT INTO") {
            let counties = model.counties.clone();
            let columns = model.columns.clone();
            for county in counties {
                model
                    .ledger
                    .entry(county)
                    .or_insert_with(|| columns.clone());
            }
            return Ok(());
        }
        if sql.starts_with("ALTER TABLE") {
            let column = quoted(sql, "ADD COLUMN").ok_or_else(|| Error::ScalarParse {
                context: "fake alter".to_string(),
                value: sql.to_string(),
            })?;
            let default = single_quoted(sql, "DEFAULT").unwrap_or_else(|| "0".to_string());
            if model.columns.contains_key(&column) {
                return Err(Error::UtilityFailed {
                    utility: "fake".to_string(),
                    status: Some(1),
                    stderr: format!("duplicate column name: {column}"),
                });
            }
            model.columns.insert(column.clone(), default.clone());
            for row in model.ledger.values_mut() {
                row.entry(column.clone()).or_insert_with(|| default.clone());
            }
            return Ok(());
        }
        if sql.starts_with("UPDATE") {
            let column = quoted(sql, "SET").ok_or_else(|| Error::ScalarParse {
                context: "fake update".to_string(),
                value: sql.to_string(),
            })?;
            let value = single_quoted(sql, "=").unwrap_or_default();
            let county = single_quoted(sql, "WHERE").unwrap_or_default();
            model.ledger.entry(county).or_default().insert(column, value);
            return Ok(());
        }
        Err(Error::UtilityFailed {
            utility: "fake".to_string(),
            status: Some(1),
            stderr: format!("unrecognized statement: {sql}"),
        })
    }

    fn query_scalar(&self, _store: &Path, sql: &str) -> Result<Option<String>> {
        let model = self.model.borrow();
        if sql.contains("st_intersects") {
            let table = quoted(sql, "FROM").ok_or_else(|| Error::ScalarParse {
                context: "fake spatial query".to_string(),
                value: sql.to_string(),
            })?;
            drop(model);
            return Ok(Some(self.behavior(&table).intersecting.to_string()));
        }
        if sql.contains("FROM \"sync_stamps\"") {
            if sql.starts_with("SELECT count(*)") {
                if let Some(county) = single_quoted(sql, "WHERE") {
                    let rows = model.ledger.contains_key(&county) as u64;
                    return Ok(Some(rows.to_string()));
                }
                return Ok(Some(model.ledger.len().to_string()));
            }
            let column = quoted(sql, "SELECT").ok_or_else(|| Error::ScalarParse {
                context: "fake ledger query".to_string(),
                value: sql.to_string(),
            })?;
            let county = single_quoted(sql, "WHERE").unwrap_or_default();
            return Ok(model
                .ledger
                .get(&county)
                .and_then(|row| row.get(&column))
                .cloned());
        }
        if sql.starts_with("SELECT count(*) FROM") {
            let table = quoted(sql, "FROM").ok_or_else(|| Error::ScalarParse {
                context: "fake count query".to_string(),
                value: sql.to_string(),
            })?;
            drop(model);
            return Ok(Some(self.behavior(&table).features.to_string()));
        }
        Err(Error::ScalarUnavailable {
            sql: sql.to_string(),
        })
    }
}
