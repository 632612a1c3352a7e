//! The remote publisher: probing, manifests, and fallback downloads
//!
//! Each layer is published as one zip archive at a predictable URL. The
//! engine never unpacks these itself; it reads entry timestamps from the
//! central directory to decide freshness and hands the URL to the
//! translation utility (which streams the archive remotely). Direct
//! downloads happen only as misalignment evidence or in raw-fetch mode.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDateTime;

use crate::domain::LayerKey;
use crate::{Error, Result};

/// Entries that several county archives share under a generic name prefix.
const GENERIC_SHARED_PREFIX: &str = "ALL_ADD";

/// Result of checking whether a layer archive exists upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    /// The archive exists at this URL.
    Available { url: String },
    /// Nothing published for this layer.
    Unavailable,
}

/// The per-entry modification timestamps of one layer archive.
///
/// Timestamps come from the zip central directory and are second-granular
/// naive local times, compared only for exact equality.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactManifest {
    files: BTreeMap<String, NaiveDateTime>,
}

impl ArtifactManifest {
    pub fn insert(&mut self, name: impl Into<String>, stamp: NaiveDateTime) {
        self.files.insert(name.into(), stamp);
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn timestamp(&self, name: &str) -> Option<&NaiveDateTime> {
        self.files.get(name)
    }

    /// The entry whose timestamp stands for the whole artifact.
    pub fn canonical_file(key: &LayerKey) -> String {
        format!("{key}.shp")
    }

    /// Canonical timestamp for a layer, or an error naming the missing entry.
    pub fn canonical(&self, key: &LayerKey) -> Result<&NaiveDateTime> {
        let file = Self::canonical_file(key);
        self.files
            .get(&file)
            .ok_or_else(|| Error::MissingCanonicalEntry {
                key: key.to_string(),
                file,
            })
    }

    /// Rewrite generically named shared entries to layer-specific names.
    ///
    /// Some county archives ship support files under the shared `ALL_ADD`
    /// prefix (but a genuine `ALL_ADDS` layer keeps its name). Rekeying them
    /// onto the owning layer keeps the canonical lookup uniform.
    pub fn remap_generic(&mut self, key: &LayerKey) {
        let generic: Vec<String> = self
            .files
            .keys()
            .filter(|name| {
                name.starts_with(GENERIC_SHARED_PREFIX) && !name.starts_with("ALL_ADDS")
            })
            .cloned()
            .collect();
        for name in generic {
            if let Some(stamp) = self.files.remove(&name) {
                let suffix = &name[GENERIC_SHARED_PREFIX.len()..];
                self.files.insert(format!("{key}{suffix}"), stamp);
            }
        }
    }
}

/// Where layer archives come from. The engine talks to this trait; the HTTP
/// implementation below is the production one.
pub trait LayerSource {
    /// Check whether the layer archive exists upstream.
    fn probe(&self, key: &LayerKey) -> Result<Probe>;

    /// Read the archive's per-entry timestamps without unpacking it.
    fn manifest(&self, key: &LayerKey) -> Result<ArtifactManifest>;

    /// Download the whole archive into `dest_dir`, returning its path.
    fn fetch_archive(&self, key: &LayerKey, dest_dir: &Path) -> Result<PathBuf>;

    /// Extract just the projection sidecar into `dest_dir`. `None` when the
    /// archive carries no `.prj` for this layer.
    fn fetch_projection(&self, key: &LayerKey, dest_dir: &Path) -> Result<Option<PathBuf>>;
}

/// HTTP access to the publisher's download directory.
pub struct HttpSource {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(120))
            .build();
        Self {
            agent,
            base_url: base_url.into(),
        }
    }

    /// URL of the layer's zip archive.
    pub fn layer_url(&self, key: &LayerKey) -> String {
        format!("{}/{key}.zip", self.base_url.trim_end_matches('/'))
    }

    /// Virtual path the translation utility streams the remote archive from.
    pub fn virtual_path(&self, key: &LayerKey) -> String {
        format!("/vsizip/vsicurl/{}", self.layer_url(key))
    }

    fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.agent.get(url).call().map_err(|e| Error::Http {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        let mut body = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut body)
            .map_err(|e| Error::Http {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(body)
    }
}

impl LayerSource for HttpSource {
    fn probe(&self, key: &LayerKey) -> Result<Probe> {
        let url = self.layer_url(key);
        match self.agent.head(&url).call() {
            Ok(response) if response.status() == 200 => Ok(Probe::Available { url }),
            Ok(_) => Ok(Probe::Unavailable),
            Err(ureq::Error::Status(_, _)) => Ok(Probe::Unavailable),
            Err(e) => Err(Error::Http {
                url,
                message: e.to_string(),
            }),
        }
    }

    fn manifest(&self, key: &LayerKey) -> Result<ArtifactManifest> {
        let url = self.layer_url(key);
        let body = self.download(&url)?;
        let cursor = std::io::Cursor::new(body);
        let mut archive = zip::ZipArchive::new(cursor)?;

        let prefix = key.to_string();
        let mut manifest = ArtifactManifest::default();
        for index in 0..archive.len() {
            let entry = archive.by_index(index)?;
            let name = entry.name().to_string();
            if !(name.starts_with(&prefix) || name.starts_with(GENERIC_SHARED_PREFIX)) {
                continue;
            }
            if let Some(stamp) = zip_datetime(entry.last_modified()) {
                manifest.insert(name, stamp);
            }
        }
        manifest.remap_generic(key);
        Ok(manifest)
    }

    fn fetch_archive(&self, key: &LayerKey, dest_dir: &Path) -> Result<PathBuf> {
        let url = self.layer_url(key);
        let body = self.download(&url)?;
        std::fs::create_dir_all(dest_dir)?;
        let dest = dest_dir.join(format!("{key}.zip"));
        std::fs::write(&dest, body)?;
        tracing::info!(key = %key, dest = %dest.display(), "fetched raw archive");
        Ok(dest)
    }

    fn fetch_projection(&self, key: &LayerKey, dest_dir: &Path) -> Result<Option<PathBuf>> {
        let url = self.layer_url(key);
        let body = self.download(&url)?;
        let cursor = std::io::Cursor::new(body);
        let mut archive = zip::ZipArchive::new(cursor)?;

        let wanted = format!("{key}.prj");
        let Ok(mut entry) = archive.by_name(&wanted) else {
            return Ok(None);
        };
        let mut content = Vec::new();
        entry.read_to_end(&mut content)?;
        std::fs::create_dir_all(dest_dir)?;
        let dest = dest_dir.join(&wanted);
        std::fs::write(&dest, content)?;
        Ok(Some(dest))
    }
}

/// Convert a zip central-directory timestamp to a naive datetime. Returns
/// `None` for values outside the representable range.
fn zip_datetime(stamp: zip::DateTime) -> Option<NaiveDateTime> {
    chrono::NaiveDate::from_ymd_opt(
        i32::from(stamp.year()),
        u32::from(stamp.month()),
        u32::from(stamp.day()),
    )?
    .and_hms_opt(
        u32::from(stamp.hour()),
        u32::from(stamp.minute()),
        u32::from(stamp.second()),
    )
}
