//! Structured invocation of the external vector translation utilities
//!
//! The store is only ever mutated through `ogr2ogr` and queried through
//! `ogrinfo`, both treated as opaque subprocesses. Requests are built as
//! typed argument lists (never interpolated shell strings) and go through
//! the [`VectorUtility`] trait so the engine can be exercised against a fake.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use crate::srs::SrsPlan;
use crate::{Error, Result};

/// Output driver for a translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    GeoPackage,
    Shapefile,
}

impl OutputFormat {
    pub fn driver_name(self) -> &'static str {
        match self {
            OutputFormat::GeoPackage => "GPKG",
            OutputFormat::Shapefile => "ESRI Shapefile",
        }
    }
}

/// A declarative translation request, rendered to argv by [`to_args`].
///
/// [`to_args`]: TranslateRequest::to_args
#[derive(Debug, Clone)]
pub struct TranslateRequest {
    pub format: OutputFormat,
    /// Append into an existing dataset instead of creating a new one.
    pub update_append: bool,
    /// Tolerate feature-level failures rather than failing the layer.
    pub skip_failures: bool,
    /// Per-transaction feature-count governor (`-gt`).
    pub transaction_size: Option<u32>,
    /// Wrap the whole translation in a dataset transaction.
    pub dataset_transaction: bool,
    /// Drop source field-width constraints.
    pub unset_field_width: bool,
    pub preserve_fid: bool,
    /// Destination layer name (`-nln`).
    pub layer_name: Option<String>,
    /// Geometry column name in the destination.
    pub geometry_column: Option<String>,
    /// Cap on translated features.
    pub feature_limit: Option<u64>,
    pub srs: SrsPlan,
    pub dest: PathBuf,
    pub source: String,
    /// Layer tokens selecting what to read from the source dataset.
    pub source_layers: Vec<String>,
}

impl TranslateRequest {
    /// The standard append/update import into the GeoPackage store, with
    /// feature-level failure tolerance.
    pub fn gpkg_import(
        dest: impl Into<PathBuf>,
        layer_name: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            format: OutputFormat::GeoPackage,
            update_append: true,
            skip_failures: true,
            transaction_size: Some(20_000),
            dataset_transaction: false,
            unset_field_width: true,
            preserve_fid: true,
            layer_name: Some(layer_name.into()),
            geometry_column: Some("geom".to_string()),
            feature_limit: None,
            srs: SrsPlan::default(),
            dest: dest.into(),
            source: source.into(),
            source_layers: Vec::new(),
        }
    }

    /// Extraction of one corrected store table into a standalone shapefile
    /// directory.
    pub fn shapefile_export(
        dest_dir: impl Into<PathBuf>,
        store: &Path,
        table: impl Into<String>,
    ) -> Self {
        Self {
            format: OutputFormat::Shapefile,
            update_append: false,
            skip_failures: false,
            transaction_size: None,
            dataset_transaction: false,
            unset_field_width: false,
            preserve_fid: false,
            layer_name: None,
            geometry_column: None,
            feature_limit: None,
            srs: SrsPlan::default(),
            dest: dest_dir.into(),
            source: store.to_string_lossy().into_owned(),
            source_layers: vec![table.into()],
        }
    }

    /// Render the request as an argv vector for the translation utility.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["-f".to_string(), self.format.driver_name().to_string()];
        if self.update_append {
            args.push("-update".to_string());
            args.push("-append".to_string());
        }
        if let Some(gt) = self.transaction_size {
            args.push("-gt".to_string());
            args.push(gt.to_string());
        }
        if self.skip_failures {
            args.push("-skipfailures".to_string());
        }
        if self.dataset_transaction {
            args.push("-ds_transaction".to_string());
        }
        if self.unset_field_width {
            args.push("-unsetFieldWidth".to_string());
        }
        if let Some(name) = &self.layer_name {
            args.push("-nln".to_string());
            args.push(name.clone());
        }
        if self.preserve_fid {
            args.push("-preserve_fid".to_string());
        }
        if let Some(column) = &self.geometry_column {
            args.push("-geomfield".to_string());
            args.push(column.clone());
        }
        if let Some(limit) = self.feature_limit {
            args.push("-limit".to_string());
            args.push(limit.to_string());
        }
        if let Some(source) = self.srs.source {
            args.push("-s_srs".to_string());
            args.push(source.to_string());
        }
        if let Some(target) = self.srs.target {
            args.push("-t_srs".to_string());
            args.push(target.to_string());
        }
        args.push(self.dest.to_string_lossy().into_owned());
        args.push(self.source.clone());
        args.extend(self.source_layers.iter().cloned());
        args
    }
}

/// The subprocess boundary behind which the store is read and written.
pub trait VectorUtility {
    /// Run one translation; the side effect is mutating the destination.
    fn translate(&self, request: &TranslateRequest) -> Result<()>;

    /// Execute a statement against the store, discarding output.
    fn execute_sql(&self, store: &Path, sql: &str) -> Result<()>;

    /// Execute a query and return the first field of the first feature.
    fn query_scalar(&self, store: &Path, sql: &str) -> Result<Option<String>>;
}

/// The real GDAL/OGR binaries.
pub struct OgrUtility {
    ogr2ogr: PathBuf,
    ogrinfo: PathBuf,
}

impl OgrUtility {
    pub fn new(ogr2ogr: impl Into<PathBuf>, ogrinfo: impl Into<PathBuf>) -> Self {
        Self {
            ogr2ogr: ogr2ogr.into(),
            ogrinfo: ogrinfo.into(),
        }
    }

    fn run(&self, binary: &Path, args: &[String]) -> Result<String> {
        tracing::debug!(binary = %binary.display(), ?args, "invoking vector utility");
        let output = Command::new(binary).args(args).output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::UtilityFailed {
                utility: binary.to_string_lossy().into_owned(),
                status: output.status.code(),
                stderr: stderr.trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn run_sql(&self, store: &Path, sql: &str) -> Result<String> {
        let args = vec![
            store.to_string_lossy().into_owned(),
            "-sql".to_string(),
            sql.to_string(),
        ];
        self.run(&self.ogrinfo, &args)
    }
}

impl VectorUtility for OgrUtility {
    fn translate(&self, request: &TranslateRequest) -> Result<()> {
        self.run(&self.ogr2ogr, &request.to_args()).map(|_| ())
    }

    fn execute_sql(&self, store: &Path, sql: &str) -> Result<()> {
        self.run_sql(store, sql).map(|_| ())
    }

    fn query_scalar(&self, store: &Path, sql: &str) -> Result<Option<String>> {
        // The store occasionally trips over rapid successive reads; a short
        // bounded retry replaces the old unbounded re-entry.
        let policy = backoff::ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(200))
            .with_max_elapsed_time(Some(Duration::from_secs(3)))
            .build();
        let stdout = backoff::retry(policy, || {
            self.run_sql(store, sql).map_err(backoff::Error::transient)
        })
        .map_err(|e| match e {
            backoff::Error::Transient { err, .. } | backoff::Error::Permanent(err) => err,
        })?;
        Ok(parse_scalar(&stdout))
    }
}

/// Pull the first field value out of an `ogrinfo` feature dump.
///
/// The output lists features as `OGRFeature(...)` headers followed by
/// indented `name (Type) = value` lines.
pub fn parse_scalar(output: &str) -> Option<String> {
    let mut in_feature = false;
    for line in output.lines() {
        if line.trim_start().starts_with("OGRFeature(") {
            in_feature = true;
            continue;
        }
        if in_feature {
            if let Some((_, value)) = line.split_once(" = ") {
                return Some(value.trim().to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LayerKey;
    use crate::srs;

    fn import_args(key: &str) -> Vec<String> {
        let key: LayerKey = key.parse().unwrap();
        let mut request = TranslateRequest::gpkg_import(
            "/ws/OGRIP_LBRS.gpkg",
            key.table_name(),
            format!(
                "/vsizip/vsicurl/http://gis3.oit.ohio.gov/LBRS/_downloads/{key}.zip"
            ),
        );
        request.srs = srs::classify(&key).plan(srs::DEFAULT_TARGET);
        request.to_args()
    }

    #[test]
    fn default_group_import_has_target_but_no_source() {
        let args = import_args("ADA_CL");
        assert!(!args.contains(&"-s_srs".to_string()));
        let t = args.iter().position(|a| a == "-t_srs").unwrap();
        assert_eq!(args[t + 1], "EPSG:3734");
        // The standard import shape.
        for flag in ["-update", "-append", "-skipfailures", "-preserve_fid"] {
            assert!(args.contains(&flag.to_string()), "missing {flag}");
        }
        let gt = args.iter().position(|a| a == "-gt").unwrap();
        assert_eq!(args[gt + 1], "20000");
    }

    #[test]
    fn declared_group_import_states_both_codes() {
        let args = import_args("FRA_CL");
        let s = args.iter().position(|a| a == "-s_srs").unwrap();
        assert_eq!(args[s + 1], "EPSG:3735");
        let t = args.iter().position(|a| a == "-t_srs").unwrap();
        assert_eq!(args[t + 1], "EPSG:3734");
    }

    #[test]
    fn mislabeled_group_import_uses_the_corrected_code() {
        let args = import_args("HAR_CL");
        let s = args.iter().position(|a| a == "-s_srs").unwrap();
        assert_eq!(args[s + 1], "EPSG:32123");
    }

    #[test]
    fn in_target_group_import_emits_no_srs_flags() {
        let args = import_args("AUG_CL");
        assert!(!args.contains(&"-s_srs".to_string()));
        assert!(!args.contains(&"-t_srs".to_string()));
    }

    #[test]
    fn feature_limit_renders_when_set() {
        let mut request =
            TranslateRequest::gpkg_import("/ws/store.gpkg", "ADA_CL", "/vsizip/x.zip");
        request.feature_limit = Some(500);
        let args = request.to_args();
        let l = args.iter().position(|a| a == "-limit").unwrap();
        assert_eq!(args[l + 1], "500");
    }

    #[test]
    fn shapefile_export_selects_the_table() {
        let request = TranslateRequest::shapefile_export(
            "/ws/SHPs/HAR_CL",
            Path::new("/ws/OGRIP_LBRS.gpkg"),
            "HAR_CL",
        );
        let args = request.to_args();
        assert_eq!(args[0], "-f");
        assert_eq!(args[1], "ESRI Shapefile");
        assert!(!args.contains(&"-update".to_string()));
        assert_eq!(args[args.len() - 1], "HAR_CL");
        assert_eq!(args[args.len() - 2], "/ws/OGRIP_LBRS.gpkg");
    }

    #[test]
    fn parse_scalar_reads_a_count() {
        let output = "\
INFO: Open of `store.gpkg' using driver `GPKG' successful.

Layer name: SELECT
Geometry: None
Feature Count: 1
Layer SRS WKT: (unknown)
count(*): Integer64 (0.0)
OGRFeature(SELECT):0
  count(*) (Integer64) = 120
";
        assert_eq!(parse_scalar(output), Some("120".to_string()));
    }

    #[test]
    fn parse_scalar_reads_a_text_stamp() {
        let output = "\
OGRFeature(SELECT):0
  CL_stamp (String) = 2020-03-10 17:08:37
";
        assert_eq!(
            parse_scalar(output),
            Some("2020-03-10 17:08:37".to_string())
        );
    }

    #[test]
    fn parse_scalar_returns_none_without_features() {
        assert_eq!(parse_scalar("Layer name: SELECT\nFeature Count: 0\n"), None);
    }
}
