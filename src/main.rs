#![deny(unsafe_code)]

mod commands;
mod common;
mod config;
mod constants;
mod tui;
mod waybar;

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::config::Settings;

#[derive(Parser)]
#[command(name = "waypy")]
#[command(version)]
#[command(about = "Switch Waybar configuration profiles and restart Waybar", long_about = None)]
struct Cli {
    /// Path to the YAML config file (default: ~/.config/waypy/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging and print an environment report
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage Waybar
    Waybar {
        #[command(subcommand)]
        command: WaybarCommand,
    },
}

#[derive(Subcommand)]
enum WaybarCommand {
    /// Restart Waybar so it rereads its configuration
    Reload {
        /// Seconds to wait for the old instance before launching anyway
        #[arg(long)]
        timeout: Option<f64>,
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Back up the live config, copy a profile over it and restart Waybar
    Deploy {
        /// Profile directory, a file inside one, or a profile name
        profile: String,
        /// Seconds to wait for the old instance before launching anyway
        #[arg(long)]
        timeout: Option<f64>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// List available profiles
    Profiles {
        #[arg(long)]
        json: bool,
    },
    /// List backup snapshots, newest first
    Backups {
        #[arg(long)]
        json: bool,
    },
    /// Pick and deploy a profile interactively
    Select,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let interactive = matches!(
        cli.command,
        Command::Waybar {
            command: WaybarCommand::Select
        }
    );

    init_logging(cli.debug, interactive)?;

    let config_path = cli.config.clone().unwrap_or_else(Settings::default_path);
    let settings = match Settings::load(&config_path) {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = ?e, "Failed to load config file");
            std::process::exit(1);
        }
    };
    if let Err(e) = settings.ensure_dirs() {
        error!(error = %e, "Could not prepare profiles directory");
    }

    if cli.debug {
        common::debug::log_system_info(&settings);
    }

    let Command::Waybar { command } = cli.command;
    let ok = match command {
        WaybarCommand::Reload { timeout, json } => {
            commands::reload(&settings.with_timeout(timeout), json)?
        }
        WaybarCommand::Deploy {
            profile,
            timeout,
            json,
        } => commands::deploy(&settings.with_timeout(timeout), &profile, json)?,
        WaybarCommand::Profiles { json } => commands::profiles(&settings, json)?,
        WaybarCommand::Backups { json } => commands::backups(&settings, json)?,
        WaybarCommand::Select => commands::select(&settings)?,
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

/// Install the global subscriber. The picker owns the terminal, so it logs
/// to a file instead of stderr.
fn init_logging(debug: bool, interactive: bool) -> Result<()> {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env(constants::config::LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let result = if interactive {
        let dir = Settings::app_dir();
        std::fs::create_dir_all(&dir)?;
        let file = File::create(dir.join(constants::config::TUI_LOG_FILENAME))?;
        builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init()
    } else {
        builder.with_writer(std::io::stderr).try_init()
    };

    result.map_err(|e| anyhow!("Failed to set tracing subscriber: {e}"))
}
