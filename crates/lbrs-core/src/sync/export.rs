//! Standalone shapefile packages for the export-of-interest counties
//!
//! Each exported layer becomes a directory of shapefile parts plus a zip
//! package of that directory, both under the workspace `SHPs/` tree. The
//! part files and the package itself are stamped with the publisher's
//! timestamps as provenance, so a re-export of unchanged data produces an
//! identically-stamped package.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::SyncConfig;
use crate::domain::LayerKey;
use crate::gdal::{TranslateRequest, VectorUtility};
use crate::source::ArtifactManifest;
use crate::{Error, Result};

/// Export one corrected table as a shapefile directory and zip package,
/// carrying the upstream manifest's timestamps onto both. Returns the
/// package path.
pub fn export_layer<U: VectorUtility>(
    utility: &U,
    config: &SyncConfig,
    key: &LayerKey,
    manifest: &ArtifactManifest,
) -> Result<PathBuf> {
    let table = key.table_name();
    let layer_dir = config.export_dir().join(&table);
    // Leftover parts from an interrupted run would be zipped alongside the
    // fresh export, and a real translation refuses to overwrite them.
    if layer_dir.exists() {
        std::fs::remove_dir_all(&layer_dir)?;
    }
    std::fs::create_dir_all(&layer_dir)?;

    tracing::info!(key = %key, dir = %layer_dir.display(), "exporting shapefile");
    let request = TranslateRequest::shapefile_export(&layer_dir, &config.store_path(), &table);
    utility.translate(&request)?;

    stamp_parts(&layer_dir, manifest);

    let package = config.export_dir().join(format!("{table}.zip"));
    package_dir(&layer_dir, &package)?;
    std::fs::remove_dir_all(&layer_dir)?;

    // The package itself carries the canonical layer timestamp. Stamping is
    // best-effort provenance here and in stamp_parts; a clamped filesystem
    // does not fail the export.
    match manifest.canonical(key) {
        Ok(stamp) => {
            if let Err(err) = lbrs_fs::stamp::stamp_datetime(&package, stamp) {
                tracing::warn!(package = %package.display(), %err, "could not stamp package");
            }
        }
        Err(err) => tracing::warn!(key = %key, %err, "no canonical timestamp for package"),
    }
    Ok(package)
}

/// Stamp each exported part with the matching upstream entry's timestamp.
/// Parts the manifest does not know keep their export-time mtime.
fn stamp_parts(layer_dir: &Path, manifest: &ArtifactManifest) {
    let Ok(entries) = std::fs::read_dir(layer_dir) else {
        return;
    };
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(stamp) = manifest.timestamp(&name) else {
            continue;
        };
        if let Err(err) = lbrs_fs::stamp::stamp_datetime(&entry.path(), stamp) {
            tracing::warn!(file = %name, %err, "could not stamp exported part");
        }
    }
}

/// Zip every regular file of `dir` (flat, no subdirectories expected) into
/// `package`, stamping entries with the source files' modification times.
pub fn package_dir(dir: &Path, package: &Path) -> Result<()> {
    let file = File::create(package).map_err(|e| lbrs_fs::Error::io(package, e))?;
    let mut writer = zip::ZipWriter::new(file);

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();

        let mut options =
            zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        if let Some(stamp) = entry_datetime(&path)? {
            options = options.last_modified_time(stamp);
        }
        writer.start_file(&name, options)?;
        let mut source = File::open(&path).map_err(|e| lbrs_fs::Error::io(&path, e))?;
        io::copy(&mut source, &mut writer).map_err(|e| lbrs_fs::Error::io(&path, e))?;
    }
    writer.finish()?;
    tracing::debug!(package = %package.display(), "wrote export package");
    Ok(())
}

/// A file's mtime as a zip entry timestamp, or `None` when it falls outside
/// the format's representable range.
fn entry_datetime(path: &Path) -> Result<Option<zip::DateTime>> {
    let seconds = lbrs_fs::stamp::mtime_seconds(path).map_err(Error::Fs)?;
    let Some(stamp) = chrono::DateTime::from_timestamp(seconds, 0) else {
        return Ok(None);
    };
    let naive = stamp.naive_utc();
    use chrono::{Datelike, Timelike};
    let converted = zip::DateTime::from_date_and_time(
        naive.year() as u16,
        naive.month() as u8,
        naive.day() as u8,
        naive.hour() as u8,
        naive.minute() as u8,
        naive.second() as u8,
    );
    Ok(converted.ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    /// Writes placeholder shapefile parts instead of running a translation.
    struct PartWriter;

    impl VectorUtility for PartWriter {
        fn translate(&self, request: &TranslateRequest) -> Result<()> {
            let table = request.source_layers.first().expect("export names a table");
            for ext in ["shp", "dbf", "prj"] {
                std::fs::write(request.dest.join(format!("{table}.{ext}")), ext.as_bytes())?;
            }
            Ok(())
        }

        fn execute_sql(&self, _store: &Path, _sql: &str) -> Result<()> {
            Ok(())
        }

        fn query_scalar(&self, _store: &Path, _sql: &str) -> Result<Option<String>> {
            Ok(None)
        }
    }

    fn manifest_stamp(s: &str) -> chrono::NaiveDateTime {
        chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn export_carries_manifest_timestamps_onto_parts_and_package() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = SyncConfig::default();
        config.workspace = dir.path().to_path_buf();
        let key: LayerKey = "HAR_CL".parse().unwrap();

        let mut manifest = ArtifactManifest::default();
        manifest.insert("HAR_CL.shp", manifest_stamp("2020-03-10 17:08:37"));
        manifest.insert("HAR_CL.dbf", manifest_stamp("2020-03-10 17:08:40"));

        let package = export_layer(&PartWriter, &config, &key, &manifest).unwrap();

        // The package carries the canonical (.shp) timestamp and the loose
        // part set is gone.
        assert_eq!(
            lbrs_fs::stamp::mtime_seconds(&package).unwrap(),
            manifest_stamp("2020-03-10 17:08:37").and_utc().timestamp()
        );
        assert!(!config.export_dir().join("HAR_CL").exists());

        // Entry timestamps inside the package come from the manifest; a part
        // the manifest does not know (.prj) is still packaged.
        let mut archive = zip::ZipArchive::new(File::open(&package).unwrap()).unwrap();
        assert_eq!(archive.len(), 3);
        let entry = archive.by_name("HAR_CL.dbf").unwrap();
        let modified = entry.last_modified();
        assert_eq!(modified.minute(), 8);
        assert_eq!(modified.second(), 40);
    }

    #[test]
    fn leftover_parts_from_an_interrupted_run_are_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = SyncConfig::default();
        config.workspace = dir.path().to_path_buf();
        let key: LayerKey = "HAR_CL".parse().unwrap();

        let layer_dir = config.export_dir().join("HAR_CL");
        std::fs::create_dir_all(&layer_dir).unwrap();
        std::fs::write(layer_dir.join("stale_leftover.dbf"), b"stale").unwrap();

        let mut manifest = ArtifactManifest::default();
        manifest.insert("HAR_CL.shp", manifest_stamp("2020-03-10 17:08:37"));

        let package = export_layer(&PartWriter, &config, &key, &manifest).unwrap();

        let mut archive = zip::ZipArchive::new(File::open(&package).unwrap()).unwrap();
        assert_eq!(archive.len(), 3);
        assert!(archive.by_name("stale_leftover.dbf").is_err());
    }

    #[test]
    fn packages_every_file_with_its_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let layer_dir = dir.path().join("HAR_CL");
        std::fs::create_dir_all(&layer_dir).unwrap();
        for part in ["HAR_CL.shp", "HAR_CL.dbf", "HAR_CL.prj"] {
            std::fs::write(layer_dir.join(part), part.as_bytes()).unwrap();
        }
        let stamp =
            chrono::NaiveDateTime::parse_from_str("2020-03-10 17:08:37", "%Y-%m-%d %H:%M:%S")
                .unwrap();
        lbrs_fs::stamp::stamp_datetime(&layer_dir.join("HAR_CL.shp"), &stamp).unwrap();

        let package = dir.path().join("HAR_CL.zip");
        package_dir(&layer_dir, &package).unwrap();

        let mut archive = zip::ZipArchive::new(File::open(&package).unwrap()).unwrap();
        assert_eq!(archive.len(), 3);
        let mut entry = archive.by_name("HAR_CL.shp").unwrap();
        let modified = entry.last_modified();
        assert_eq!(modified.year(), 2020);
        assert_eq!(modified.month(), 3);
        assert_eq!(modified.second(), 37);
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        assert_eq!(content, "HAR_CL.shp");
    }

    #[test]
    fn subdirectories_are_not_packaged() {
        let dir = tempfile::tempdir().unwrap();
        let layer_dir = dir.path().join("ADA_CL");
        std::fs::create_dir_all(layer_dir.join("nested")).unwrap();
        std::fs::write(layer_dir.join("ADA_CL.shp"), b"shp").unwrap();

        let package = dir.path().join("ADA_CL.zip");
        package_dir(&layer_dir, &package).unwrap();

        let archive = zip::ZipArchive::new(File::open(&package).unwrap()).unwrap();
        assert_eq!(archive.len(), 1);
    }
}
