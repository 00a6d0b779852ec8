//! Waybar profile deployment and process reload
//!
//! `ProfileStore` resolves a profile directory, `Deployer` backs up the live
//! configuration, copies the profile over it and drives a `Reload`.

pub mod deploy;
pub mod error;
pub mod process;
pub mod profile;
pub mod reload;

pub use deploy::{ActiveConfig, Deployer, MessageLevel};
pub use error::WaybarError;
pub use process::SystemProcessControl;
pub use profile::{ProfileStore, ProfileSummary};
pub use reload::{Reload, ReloadSettings, Reloader};
