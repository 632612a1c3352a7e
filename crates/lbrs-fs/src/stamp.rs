//! File modification-time stamping with read-back verification
//!
//! Exported packages carry the publisher's timestamps as provenance, and the
//! transfer path uses mtime equality (to the second) to decide whether a copy
//! is needed at all. Both callers go through here so the truncation rules
//! stay in one place.

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::{Error, Result};

/// Convert a naive (second-precision) datetime into a `SystemTime`,
/// interpreting it as UTC.
pub fn system_time(when: &NaiveDateTime) -> SystemTime {
    let secs = when.and_utc().timestamp();
    if secs >= 0 {
        UNIX_EPOCH + Duration::from_secs(secs as u64)
    } else {
        UNIX_EPOCH - Duration::from_secs(secs.unsigned_abs())
    }
}

/// Read a file's modification time.
pub fn mtime(path: &Path) -> Result<SystemTime> {
    let metadata = fs::metadata(path).map_err(|e| Error::io(path, e))?;
    metadata.modified().map_err(|e| Error::io(path, e))
}

/// Read a file's modification time truncated to whole seconds since the
/// Unix epoch. Sub-second precision differs across filesystems, so all
/// freshness comparisons happen at second granularity.
pub fn mtime_seconds(path: &Path) -> Result<i64> {
    Ok(seconds(mtime(path)?))
}

/// Set a file's modification time.
pub fn set_mtime(path: &Path, when: SystemTime) -> Result<()> {
    let file = fs::OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(|e| Error::io(path, e))?;
    file.set_modified(when).map_err(|e| Error::io(path, e))
}

/// Set a file's modification time and verify the write by reading it back.
///
/// Verification compares whole seconds. Some destinations (network shares in
/// particular) silently clamp timestamps, and a silent clamp would break the
/// already-synchronized check on the next run.
pub fn stamp_verified(path: &Path, when: SystemTime) -> Result<()> {
    set_mtime(path, when)?;

    let found = mtime(path)?;
    if seconds(found) != seconds(when) {
        return Err(Error::StampMismatch {
            path: path.to_path_buf(),
            expected: display(when),
            found: display(found),
        });
    }
    tracing::trace!(path = %path.display(), "timestamp stamped and verified");
    Ok(())
}

/// Stamp a file from a naive datetime (UTC) with read-back verification.
pub fn stamp_datetime(path: &Path, when: &NaiveDateTime) -> Result<()> {
    stamp_verified(path, system_time(when))
}

fn seconds(when: SystemTime) -> i64 {
    match when.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    }
}

fn display(when: SystemTime) -> String {
    DateTime::<Utc>::from(when)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}
