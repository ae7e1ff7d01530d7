//! Copy and removal primitives used by the reconciler.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use replisync_core::{DirectoryEntry, EntryKind, SyncError};

/// Copy a single file over `dest`, preserving its modification time.
///
/// Returns the number of bytes copied.
pub(crate) fn copy_file(source: &Path, dest: &Path) -> Result<u64, SyncError> {
    let bytes = fs::copy(source, dest).map_err(|e| SyncError::io(source, e))?;

    let metadata = fs::metadata(source).map_err(|e| SyncError::io(source, e))?;
    if let Ok(modified) = metadata.modified() {
        set_modified(dest, modified)?;
    }

    Ok(bytes)
}

fn set_modified(path: &Path, modified: SystemTime) -> Result<(), SyncError> {
    // futimens needs ownership, not write access; Windows needs a writable handle.
    let file = if cfg!(unix) {
        File::open(path)
    } else {
        File::options().write(true).open(path)
    }
    .map_err(|e| SyncError::io(path, e))?;

    file.set_modified(modified).map_err(|e| SyncError::io(path, e))
}

/// Copy the directory `source` to `dest`, which must not exist yet.
///
/// Walks with an explicit stack, so depth is bounded by memory rather than
/// by the call stack. Entries that are neither files nor directories are
/// skipped. Returns the number of file bytes copied.
pub(crate) fn copy_dir(source: &Path, dest: &Path) -> Result<u64, SyncError> {
    let mut total_bytes = 0u64;
    let mut pending: Vec<(PathBuf, PathBuf)> = vec![(source.to_path_buf(), dest.to_path_buf())];

    while let Some((src_dir, dest_dir)) = pending.pop() {
        fs::create_dir(&dest_dir).map_err(|e| SyncError::io(&dest_dir, e))?;

        for entry in DirectoryEntry::list(&src_dir)? {
            let dest_path = dest_dir.join(&entry.name);
            match entry.kind {
                EntryKind::Directory => pending.push((entry.path, dest_path)),
                EntryKind::File => total_bytes += copy_file(&entry.path, &dest_path)?,
                EntryKind::Other => {
                    debug!(path = %entry.path.display(), "Skipping special entry during copy");
                }
            }
        }
    }

    Ok(total_bytes)
}

/// Remove a replica entry; directories go with everything beneath them.
pub(crate) fn remove_entry(path: &Path, kind: EntryKind) -> Result<(), SyncError> {
    let result = if kind.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|e| SyncError::io(path, e))
}
