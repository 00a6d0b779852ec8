//! CLI command handlers
//!
//! Each handler returns `Ok(false)` when the command ran but the outcome
//! should turn into a non-zero exit status.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{error, info};

use crate::config::{BackupManager, Settings};
use crate::tui;
use crate::waybar::{
    ActiveConfig, Deployer, MessageLevel, ProfileStore, ProfileSummary, Reload, ReloadSettings,
    Reloader, SystemProcessControl,
};

fn reloader(settings: &Settings) -> Reloader<SystemProcessControl> {
    Reloader::new(
        SystemProcessControl,
        ReloadSettings {
            process_name: settings.process_name.clone(),
            launch_command: settings.launch_command.clone(),
            timeout: settings.reload_timeout,
        },
    )
}

fn deployer(settings: &Settings) -> Deployer<Reloader<SystemProcessControl>> {
    Deployer::new(
        BackupManager::new(&settings.backups_dir),
        ActiveConfig::new(&settings.active_dir),
        reloader(settings),
        settings.process_name.clone(),
    )
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

pub fn reload(settings: &Settings, json: bool) -> Result<bool> {
    info!("Attempting to reload {}...", settings.process_name);
    let outcome = reloader(settings).reload();

    if json {
        print_json(&outcome)?;
    } else if outcome.is_fatal() {
        error!("{}", outcome.summary(&settings.process_name));
    } else {
        info!("{}", outcome.summary(&settings.process_name));
    }
    Ok(!outcome.is_fatal())
}

pub fn deploy(settings: &Settings, profile_arg: &str, json: bool) -> Result<bool> {
    let store = ProfileStore::new(&settings.profiles_dir);
    let profile = store.lookup(profile_arg)?;
    if !profile.is_deployable() {
        info!(
            profile = %profile.name,
            "Profile has neither config nor style.css; deploying anyway"
        );
    }

    let result = deployer(settings).deploy(&profile);
    if json {
        print_json(&result)?;
    } else {
        for message in &result.messages {
            println!("{message}");
        }
        let warnings = result.count(MessageLevel::Warning);
        if warnings > 0 {
            info!(warnings, "Profile {} deployed with warnings", result.profile);
        }
    }
    Ok(result.success)
}

pub fn profiles(settings: &Settings, json: bool) -> Result<bool> {
    let store = ProfileStore::new(&settings.profiles_dir);
    let summaries: Vec<ProfileSummary> = store.list()?.into_iter().map(Into::into).collect();

    if json {
        print_json(&summaries)?;
        return Ok(true);
    }

    if summaries.is_empty() {
        println!("No profiles in {}", store.root().display());
        return Ok(true);
    }
    for summary in &summaries {
        let mark = |present: bool| if present { "✓" } else { "✗" };
        println!(
            "{:<24} config {}  style.css {}  {}",
            summary.profile.name,
            mark(summary.has_config),
            mark(summary.has_style),
            summary.profile.root.display()
        );
    }
    Ok(true)
}

pub fn backups(settings: &Settings, json: bool) -> Result<bool> {
    let manager = BackupManager::new(&settings.backups_dir);
    let backups = manager.list_backups()?;

    if json {
        print_json(&backups)?;
        return Ok(true);
    }

    if backups.is_empty() {
        println!("No backups in {}", manager.root().display());
        return Ok(true);
    }
    for backup in &backups {
        println!(
            "{}  {}",
            backup.created.format("%Y-%m-%d %H:%M:%S"),
            backup.path.display()
        );
    }
    Ok(true)
}

pub fn select(settings: &Settings) -> Result<bool> {
    let deployer = deployer(settings);
    tui::run(&deployer, &settings.process_name, &settings.profiles_dir)?;
    Ok(true)
}
