//! Error types for lbrs-core

use std::path::PathBuf;

/// Result type for lbrs-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in lbrs-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration file not found at expected path
    #[error("Configuration not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// County code is not a three-letter uppercase code
    #[error("Invalid county code: {code}")]
    InvalidCounty { code: String },

    /// Layer type code not in the closed layer-type set
    #[error("Unknown layer type: {code}")]
    UnknownLayerType { code: String },

    /// Layer key string did not parse as COUNTY_LAYER
    #[error("Invalid layer key: {key}")]
    InvalidLayerKey { key: String },

    /// Workspace store absent and no template configured to create one
    #[error("Workspace store missing at {path} and no template to create it from")]
    StoreMissing { path: PathBuf },

    /// Configured store template does not exist
    #[error("Store template not found at {path}")]
    TemplateMissing { path: PathBuf },

    /// Freshness ledger has no row for the requested county
    ///
    /// Should not occur given the bootstrap invariant; callers treat it as
    /// stale and attempt a resync rather than aborting.
    #[error("Ledger row not found for {key}")]
    LedgerNotFound { key: String },

    /// External utility exited with a failure status
    #[error("{utility} failed (exit code: {status:?}): {stderr}")]
    UtilityFailed {
        utility: String,
        status: Option<i32>,
        stderr: String,
    },

    /// A scalar query produced no readable value
    #[error("No scalar value in utility output for: {sql}")]
    ScalarUnavailable { sql: String },

    /// A scalar value could not be parsed as the expected type
    #[error("Unexpected scalar {value:?} for {context}")]
    ScalarParse { context: String, value: String },

    /// Remote request failed
    #[error("Request failed for {url}: {message}")]
    Http { url: String, message: String },

    /// Remote artifact lacks the entry that anchors its freshness signal
    #[error("Artifact for {key} has no {file} entry")]
    MissingCanonicalEntry { key: String, file: String },

    /// Another process holds the workspace lock
    #[error("Workspace is locked by another process: {path}")]
    WorkspaceLocked { path: PathBuf },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from lbrs-fs
    #[error(transparent)]
    Fs(#[from] lbrs_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    /// Zip archive error
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}
