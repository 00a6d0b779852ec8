//! Profile resolution
//!
//! A profile is a directory holding a bar config and a stylesheet. Either file
//! may be missing; callers decide what that means.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use super::error::WaybarError;
use crate::constants::waybar::{CONFIG_FILENAME, STYLE_FILENAME};

/// A named configuration bundle rooted at a single directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub name: String,
    pub root: PathBuf,
    pub config_path: PathBuf,
    pub style_path: PathBuf,
}

impl Profile {
    /// Derive the two file paths from a profile directory
    pub fn from_root(root: PathBuf) -> Self {
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());

        Self {
            name,
            config_path: root.join(CONFIG_FILENAME),
            style_path: root.join(STYLE_FILENAME),
            root,
        }
    }

    pub fn has_config(&self) -> bool {
        self.config_path.is_file()
    }

    pub fn has_style(&self) -> bool {
        self.style_path.is_file()
    }

    /// A profile is usable when at least one of its files exists
    pub fn is_deployable(&self) -> bool {
        self.has_config() || self.has_style()
    }
}

/// Listing row for `waybar profiles`
#[derive(Debug, Clone, Serialize)]
pub struct ProfileSummary {
    #[serde(flatten)]
    pub profile: Profile,
    pub has_config: bool,
    pub has_style: bool,
}

impl From<Profile> for ProfileSummary {
    fn from(profile: Profile) -> Self {
        Self {
            has_config: profile.has_config(),
            has_style: profile.has_style(),
            profile,
        }
    }
}

pub struct ProfileStore {
    root: PathBuf,
}

impl ProfileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a profile directory, or a file inside one, into a `Profile`.
    pub fn resolve(path: &Path) -> Result<Profile, WaybarError> {
        if !path.exists() {
            return Err(WaybarError::ProfileNotFound(path.to_path_buf()));
        }

        let root = if path.is_file() {
            path.parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| WaybarError::ProfileNotFound(path.to_path_buf()))?
        } else {
            path.to_path_buf()
        };

        Ok(Profile::from_root(root))
    }

    /// Resolve a CLI argument: an existing path wins, otherwise a profile name
    /// under the store root.
    pub fn lookup(&self, arg: &str) -> Result<Profile, WaybarError> {
        let as_path = Path::new(arg);
        if as_path.exists() {
            return Self::resolve(as_path);
        }
        Self::resolve(&self.root.join(arg))
    }

    /// All immediate subdirectories of the root, sorted by name
    pub fn list(&self) -> Result<Vec<Profile>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut profiles = Vec::new();
        for entry in fs::read_dir(&self.root)
            .with_context(|| format!("Failed to read profiles directory {:?}", self.root))?
        {
            let path = entry?.path();
            if path.is_dir() {
                profiles.push(Profile::from_root(path));
            }
        }

        profiles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(profiles)
    }
}
