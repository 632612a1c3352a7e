//! Filesystem layer for LBRS Sync
//!
//! This crate holds the primitives the sync engine relies on when it moves
//! data between the fast local workspace and the (possibly slower) archive
//! location:
//!
//! - **Resilient transfer**: directory-merge-aware, timestamp-preserving copy
//!   that switches to a chunked progress copy for large payloads
//! - **Timestamp stamping**: setting a file's modification time and verifying
//!   it by read-back, used to carry source provenance onto exported packages
//!
//! Nothing in here knows about counties, layers, or GeoPackage stores.

pub mod error;
pub mod stamp;
pub mod transfer;

pub use error::{Error, Result};
pub use transfer::{TransferOutcome, transfer};
