//! Filesystem helpers shared by backup and deploy

use std::fs::{self, File};
use std::io;
use std::path::Path;

use tracing::debug;

/// Copy a file's contents, permission bits and modification time.
///
/// The mtime is best-effort: a platform that refuses it still gets the copy.
/// Timestamps are set through a read-only handle, so sources without write
/// permission keep their mtime too.
pub fn copy_with_metadata(from: &Path, to: &Path) -> io::Result<u64> {
    let bytes = fs::copy(from, to)?;

    if let Ok(modified) = fs::metadata(from).and_then(|m| m.modified())
        && let Err(e) = File::open(to).and_then(|f| f.set_modified(modified))
    {
        debug!(path = ?to, error = %e, "Could not preserve modification time");
    }

    Ok(bytes)
}
