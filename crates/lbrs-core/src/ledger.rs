//! Freshness ledger: one stamp per (county, layer type) inside the store
//!
//! The ledger travels with the store it describes, so a promoted archive
//! always carries the stamps that justified it. Rows are the boundary
//! counties; columns are `{LAYER}_stamp` text fields seeded with a sentinel
//! that never equals a real timestamp.

use std::path::Path;

use chrono::NaiveDateTime;

use crate::domain::{LayerKey, LayerType};
use crate::gdal::VectorUtility;
use crate::{Error, Result};

/// Name of the ledger table inside the store.
pub const LEDGER_TABLE: &str = "sync_stamps";

/// County-code column shared with the boundary table.
pub const COUNTY_COLUMN: &str = "COUNTY_CD";

/// Initial stamp value; guaranteed stale against any real timestamp.
pub const SENTINEL_STAMP: &str = "0";

/// Second-granular render used for both ledger stamps and comparisons.
pub const STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render a timestamp in the ledger's canonical form.
pub fn format_stamp(stamp: &NaiveDateTime) -> String {
    stamp.format(STAMP_FORMAT).to_string()
}

fn stamp_column(layer: LayerType) -> String {
    format!("{}_stamp", layer.code())
}

/// SQL-facing handle on the ledger table of one store.
pub struct FreshnessLedger<'a, U: VectorUtility> {
    store: &'a Path,
    utility: &'a U,
    boundary_table: &'a str,
}

impl<'a, U: VectorUtility> FreshnessLedger<'a, U> {
    pub fn new(store: &'a Path, utility: &'a U, boundary_table: &'a str) -> Self {
        Self {
            store,
            utility,
            boundary_table,
        }
    }

    /// Create and seed the ledger on a fresh store.
    ///
    /// Rows come from the boundary table, so the ledger covers exactly the
    /// counties the store can validate against. Idempotent: the table create
    /// is guarded and reseeding an existing table is skipped.
    pub fn bootstrap(&self, layer_types: &[LayerType]) -> Result<()> {
        self.utility.execute_sql(
            self.store,
            &format!(
                "CREATE TABLE IF NOT EXISTS \"{LEDGER_TABLE}\" \
                 (id integer primary key autoincrement, \"{COUNTY_COLUMN}\" text)"
            ),
        )?;

        let seeded = self
            .utility
            .query_scalar(
                self.store,
                &format!("SELECT count(*) FROM \"{LEDGER_TABLE}\""),
            )?
            .is_some_and(|count| count.trim() != "0");
        if !seeded {
            self.utility.execute_sql(
                self.store,
                &format!(
                    "INSERT INTO \"{LEDGER_TABLE}\" (\"{COUNTY_COLUMN}\") \
                     SELECT \"{COUNTY_COLUMN}\" FROM \"{boundary}\" \
                     ORDER BY \"{COUNTY_COLUMN}\"",
                    boundary = self.boundary_table
                ),
            )?;
        }

        for layer in layer_types {
            let column = stamp_column(*layer);
            // ALTER TABLE has no IF NOT EXISTS; a failed add on an existing
            // column is fine on re-bootstrap.
            let result = self.utility.execute_sql(
                self.store,
                &format!(
                    "ALTER TABLE \"{LEDGER_TABLE}\" \
                     ADD COLUMN \"{column}\" text DEFAULT '{SENTINEL_STAMP}'"
                ),
            );
            if let Err(err) = result {
                tracing::debug!(column, %err, "stamp column already present");
            }
        }
        Ok(())
    }

    /// Read the recorded stamp for a layer.
    pub fn lookup(&self, key: &LayerKey) -> Result<String> {
        let column = stamp_column(key.layer);
        let sql = format!(
            "SELECT \"{column}\" FROM \"{LEDGER_TABLE}\" \
             WHERE \"{COUNTY_COLUMN}\" = '{county}'",
            county = key.county
        );
        self.utility
            .query_scalar(self.store, &sql)?
            .ok_or_else(|| Error::LedgerNotFound {
                key: key.to_string(),
            })
    }

    /// Record a new stamp for a layer.
    pub fn update(&self, key: &LayerKey, stamp: &str) -> Result<()> {
        let column = stamp_column(key.layer);
        self.utility.execute_sql(
            self.store,
            &format!(
                "UPDATE \"{LEDGER_TABLE}\" SET \"{column}\" = '{stamp}' \
                 WHERE \"{COUNTY_COLUMN}\" = '{county}'",
                county = key.county
            ),
        )
    }

}
