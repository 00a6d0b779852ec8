use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures of the deploy/reload core.
///
/// Only `ProfileNotFound` and `BackupFailed` are returned as errors; the rest
/// are rendered into deploy and reload messages.
#[derive(Debug, Error)]
pub enum WaybarError {
    #[error("profile not found: {}", .0.display())]
    ProfileNotFound(PathBuf),

    #[error("{name} file missing")]
    ConfigurationMissing { name: String },

    #[error("backup failed at {}: {source}", .path.display())]
    BackupFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to copy {} to {}: {source}", .from.display(), .to.display())]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to terminate {name}: {reason}")]
    ProcessTerminateFailed { name: String, reason: String },

    #[error("failed to start {command}: {reason}")]
    ProcessStartFailed { command: String, reason: String },
}
