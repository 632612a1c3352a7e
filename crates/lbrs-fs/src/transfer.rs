//! Resilient transfer: directory-merge-aware, timestamp-preserving copy
//!
//! Used for archive promotion and for pulling the archived store back into
//! the workspace at the start of a run. The rules, applied in order:
//!
//! 1. identical source and destination paths are a no-op
//! 2. a missing source is skipped with a warning
//! 3. a directory source is merged recursively into the destination
//! 4. a destination with an identical mtime (to the second) is skipped
//! 5. otherwise the file is copied, chunked with progress reporting when the
//!    payload exceeds [`LARGE_FILE_THRESHOLD`]
//!
//! After any copy the destination mtime is set from the source and verified
//! by read-back. Failures on the large-copy path are fatal to the caller:
//! a partially replaced archive is worse than stopping.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use crate::{Error, Result, stamp};

/// Payloads at or above this size use the chunked progress copy. Small write
/// buffers degrade badly on some archive destinations.
pub const LARGE_FILE_THRESHOLD: u64 = 200_000_000;

/// Floor for the chunk size of the large-file copy.
pub const MIN_CHUNK_SIZE: u64 = 10_000_000;

/// Chunk size target is 0.01% of the total payload.
const CHUNK_DIVISOR: u64 = 10_000;

/// Outcome of a [`transfer`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// A file was copied and its timestamp verified.
    Done,
    /// Nothing needed to happen (same path, missing source, or identical
    /// timestamps).
    Skipped,
    /// The source was a directory and its contents were merged.
    Merged,
}

/// Transfer `src` to `dest` according to the rules above.
pub fn transfer(src: &Path, dest: &Path) -> Result<TransferOutcome> {
    if src == dest {
        return Ok(TransferOutcome::Skipped);
    }

    if !src.exists() {
        tracing::warn!(src = %src.display(), "transfer source does not exist, skipping");
        return Ok(TransferOutcome::Skipped);
    }

    if src.is_dir() {
        merge_dirs(src, dest)?;
        tracing::info!(src = %src.display(), dest = %dest.display(), "directory contents transferred");
        return Ok(TransferOutcome::Merged);
    }

    if dest.exists() && stamp::mtime_seconds(src)? == stamp::mtime_seconds(dest)? {
        tracing::debug!(dest = %dest.display(), "destination already synchronized, transfer not needed");
        return Ok(TransferOutcome::Skipped);
    }

    copy_preserving(src, dest)?;
    tracing::info!(src = %src.display(), dest = %dest.display(), "file transfer completed");
    Ok(TransferOutcome::Done)
}

/// Recursively merge one directory into another.
///
/// Missing subdirectories are created; same-path destination files are
/// replaced. `fs::copy`-style tree copies refuse existing directories, which
/// is exactly what a repeated archive promotion hits.
fn merge_dirs(src: &Path, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest).map_err(|e| Error::io(dest, e))?;

    for entry in fs::read_dir(src).map_err(|e| Error::io(src, e))? {
        let entry = entry.map_err(|e| Error::io(src, e))?;
        let src_path = entry.path();
        let dest_path = dest.join(entry.file_name());

        if src_path.is_dir() {
            merge_dirs(&src_path, &dest_path)?;
        } else {
            if dest_path.exists() {
                fs::remove_file(&dest_path).map_err(|e| Error::io(&dest_path, e))?;
            }
            copy_preserving(&src_path, &dest_path)?;
        }
    }
    Ok(())
}

/// Copy one file, preserving its modification time, and verify the stamp.
fn copy_preserving(src: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let size = fs::metadata(src).map_err(|e| Error::io(src, e))?.len();
    if size < LARGE_FILE_THRESHOLD {
        fs::copy(src, dest).map_err(|e| Error::io(dest, e))?;
    } else {
        copy_chunked(src, dest, size)?;
    }

    stamp::stamp_verified(dest, stamp::mtime(src)?)
}

/// Chunked copy with progress reporting for large payloads.
///
/// The chunk size is 0.01% of the total, floored at [`MIN_CHUNK_SIZE`].
fn copy_chunked(src: &Path, dest: &Path, size: u64) -> Result<()> {
    if dest.exists() {
        fs::remove_file(dest).map_err(|e| Error::io(dest, e))?;
        if dest.exists() {
            return Err(Error::UnremovableDestination {
                path: dest.to_path_buf(),
            });
        }
    }

    let chunk_size = (size / CHUNK_DIVISOR).max(MIN_CHUNK_SIZE) as usize;
    tracing::info!(
        src = %src.display(),
        size,
        chunk_mb = chunk_size / 1_000_000,
        "copying large file in chunks"
    );

    let mut reader = fs::File::open(src).map_err(|e| Error::io(src, e))?;
    let mut writer = fs::File::create(dest).map_err(|e| Error::io(dest, e))?;

    let mut buffer = vec![0u8; chunk_size];
    let mut copied: u64 = 0;
    let mut last_reported: u64 = 0;
    loop {
        let read = reader.read(&mut buffer).map_err(|e| Error::io(src, e))?;
        if read == 0 {
            break;
        }
        writer
            .write_all(&buffer[..read])
            .map_err(|e| Error::io(dest, e))?;
        copied += read as u64;

        let percent = copied * 100 / size.max(1);
        if percent >= last_reported + 10 {
            tracing::info!(percent, copied, size, "large copy progress");
            last_reported = percent;
        }
    }
    writer.sync_all().map_err(|e| Error::io(dest, e))?;

    Ok(())
}
