//! Write-then-rename file replacement
//!
//! Used for the collection file, exports and the config file so that a
//! crash mid-write never leaves a half-written target behind.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::Builder;

use crate::storage::error::{StorageError, StorageResult};

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file over the target path
///
/// The temporary file is removed on every failure path (it is owned by a
/// `NamedTempFile` until the rename succeeds).
pub fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    let parent = parent_dir(path);
    std::fs::create_dir_all(&parent).map_err(|e| StorageError::from_io(e, parent.clone()))?;

    let mut temp = Builder::new()
        .prefix(".optcg-")
        .suffix(".tmp")
        .tempfile_in(&parent)
        .map_err(|e| StorageError::from_io(e, parent.clone()))?;

    temp.write_all(data)
        .map_err(|e| StorageError::from_io(e, temp.path().to_path_buf()))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| StorageError::from_io(e, temp.path().to_path_buf()))?;

    temp.persist(path)
        .map_err(|e| StorageError::AtomicWriteFailed {
            to: path.to_path_buf(),
            source: e.error,
        })?;

    Ok(())
}

/// Directory the temp file must live in for the rename to stay atomic
fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
