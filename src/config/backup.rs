//! Configuration Backup Manager
//!
//! Snapshots the live Waybar directory before a deploy overwrites it.
//! Each snapshot is a plain directory named after the local time it was taken
//! (`YYYY-MM-DD_HHMMSS_bak`). Snapshots are never modified or pruned.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::common::fs::copy_with_metadata;
use crate::constants::config::backup::{SEQUENCE_SEPARATOR, SUFFIX, TIMESTAMP_FORMAT};
use crate::waybar::WaybarError;

/// A snapshot directory found on disk
#[derive(Debug, Clone, Serialize)]
pub struct BackupEntry {
    pub name: String,
    pub path: PathBuf,
    pub created: NaiveDateTime,
    /// 1 for the first snapshot in a given second, 2 for the next, ...
    pub sequence: u32,
}

/// Result of a single `snapshot` call
#[derive(Debug, Clone, Serialize)]
pub struct BackupSnapshot {
    pub path: PathBuf,
    pub copied: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

pub struct BackupManager {
    root: PathBuf,
}

impl BackupManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Copy every regular file directly inside `active_dir` into a new
    /// snapshot directory.
    ///
    /// Failing to create the snapshot directory is fatal. Failing to copy an
    /// individual file is logged and skipped, and a missing `active_dir`
    /// yields an empty snapshot.
    pub fn snapshot(&self, active_dir: &Path) -> Result<BackupSnapshot, WaybarError> {
        fs::create_dir_all(&self.root).map_err(|source| WaybarError::BackupFailed {
            path: self.root.clone(),
            source,
        })?;

        let path = self.create_snapshot_dir()?;
        let mut snapshot = BackupSnapshot {
            path,
            copied: Vec::new(),
            skipped: Vec::new(),
        };

        let entries = match fs::read_dir(active_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = ?active_dir, error = %e, "Active config directory unreadable, snapshot is empty");
                return Ok(snapshot);
            }
        };

        for entry in entries {
            let source = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable directory entry");
                    continue;
                }
            };
            if !source.is_file() {
                debug!(path = ?source, "Not a regular file, not backed up");
                continue;
            }
            let Some(file_name) = source.file_name() else {
                continue;
            };

            let target = snapshot.path.join(file_name);
            match copy_with_metadata(&source, &target) {
                Ok(_) => {
                    info!(from = ?source, to = ?target, "Backed up");
                    snapshot.copied.push(source);
                }
                Err(e) => {
                    let err = WaybarError::CopyFailed {
                        from: source.clone(),
                        to: target,
                        source: e,
                    };
                    warn!(error = %err, "Backup copy skipped");
                    snapshot.skipped.push(source);
                }
            }
        }

        Ok(snapshot)
    }

    /// Create the snapshot directory exclusively, adding a sequence number
    /// when the timestamped name is already taken.
    fn create_snapshot_dir(&self) -> Result<PathBuf, WaybarError> {
        let stem = format!("{}{}", Local::now().format(TIMESTAMP_FORMAT), SUFFIX);
        let mut sequence = 1u32;

        loop {
            let name = if sequence == 1 {
                stem.clone()
            } else {
                format!("{stem}{SEQUENCE_SEPARATOR}{sequence}")
            };
            let path = self.root.join(name);

            match fs::create_dir(&path) {
                Ok(()) => {
                    info!(path = ?path, "Created backup snapshot");
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => sequence += 1,
                Err(source) => return Err(WaybarError::BackupFailed { path, source }),
            }
        }
    }

    /// List all snapshots, newest first
    pub fn list_backups(&self) -> Result<Vec<BackupEntry>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();
        for entry in fs::read_dir(&self.root)
            .with_context(|| format!("Failed to read backup directory {:?}", self.root))?
        {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if let Some((created, sequence)) = parse_snapshot_name(&name) {
                backups.push(BackupEntry {
                    name,
                    path,
                    created,
                    sequence,
                });
            }
        }

        backups.sort_by(|a, b| (b.created, b.sequence).cmp(&(a.created, a.sequence)));
        Ok(backups)
    }
}

/// Split a snapshot directory name into its timestamp and sequence number
fn parse_snapshot_name(name: &str) -> Option<(NaiveDateTime, u32)> {
    let (stamp, rest) = name.split_once(SUFFIX)?;
    let created = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;

    let sequence = if rest.is_empty() {
        1
    } else {
        rest.strip_prefix(SEQUENCE_SEPARATOR)?.parse().ok()?
    };

    Some((created, sequence))
}
