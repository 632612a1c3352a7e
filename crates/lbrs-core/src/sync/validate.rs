//! Post-import checks: feature presence and spatial plausibility
//!
//! A layer that imported cleanly can still be wrong: zero features, or
//! features reprojected into the wrong place entirely. The spatial check
//! samples up to 100 random features and requires at least one to intersect
//! the owning county's boundary polygon.

use std::path::Path;

use crate::domain::LayerKey;
use crate::gdal::VectorUtility;
use crate::ledger::COUNTY_COLUMN;
use crate::{Error, Result};

/// Sample size for the spatial plausibility check.
const SAMPLE_LIMIT: u32 = 100;

/// Verdict of the post-import validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    /// The table exists but holds no features.
    Empty,
    /// Sampled features do not touch the owning county.
    Misaligned,
}

fn parse_count(sql: &str, value: Option<String>) -> Result<u64> {
    let value = value.ok_or_else(|| Error::ScalarUnavailable {
        sql: sql.to_string(),
    })?;
    value.trim().parse().map_err(|_| Error::ScalarParse {
        context: "feature count".to_string(),
        value,
    })
}

/// Count the features in one store table.
pub fn feature_count<U: VectorUtility>(utility: &U, store: &Path, table: &str) -> Result<u64> {
    let sql = format!("SELECT count(*) FROM \"{table}\"");
    parse_count(&sql, utility.query_scalar(store, &sql)?)
}

/// How many of up to [`SAMPLE_LIMIT`] random features intersect the county.
pub fn intersecting_samples<U: VectorUtility>(
    utility: &U,
    store: &Path,
    key: &LayerKey,
    boundary_table: &str,
) -> Result<u64> {
    let sql = format!(
        "SELECT count(*) FROM (\
         SELECT 1 FROM \"{table}\" lyr, \"{boundary_table}\" c \
         WHERE st_intersects(lyr.geom, c.geom) \
         AND c.\"{COUNTY_COLUMN}\" = '{county}' \
         ORDER BY random() LIMIT {SAMPLE_LIMIT})",
        table = key.table_name(),
        county = key.county,
    );
    parse_count(&sql, utility.query_scalar(store, &sql)?)
}

/// Run both checks against a freshly imported layer.
pub fn validate<U: VectorUtility>(
    utility: &U,
    store: &Path,
    key: &LayerKey,
    boundary_table: &str,
) -> Result<Verdict> {
    let count = feature_count(utility, store, &key.table_name())?;
    if count == 0 {
        return Ok(Verdict::Empty);
    }
    let hits = intersecting_samples(utility, store, key, boundary_table)?;
    if hits == 0 {
        tracing::warn!(key = %key, features = count, "no sampled features intersect the county");
        return Ok(Verdict::Misaligned);
    }
    tracing::debug!(key = %key, features = count, hits, "spatial check passed");
    Ok(Verdict::Valid)
}
