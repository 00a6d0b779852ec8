//! Configuration management
//!
//! Handles the YAML settings file and snapshots of the live Waybar
//! configuration taken before each deploy.

pub mod backup;
pub mod settings;

pub use backup::BackupManager;
pub use settings::Settings;
