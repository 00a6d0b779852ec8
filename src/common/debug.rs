use std::path::PathBuf;
use std::process::Command;
use tracing::info;

use crate::config::Settings;
use crate::constants::process::HYPRLAND_SIGNATURE_ENV;

/// Log session and tool information for debugging purposes
pub fn log_system_info(settings: &Settings) {
    info!("=== System Information ===");

    // Kernel Version
    if let Ok(kernel) = get_command_output("uname", &["-sr"]) {
        info!("Kernel: {}", kernel);
    }

    // OS / Distribution
    if let Ok(os_release) = std::fs::read_to_string("/etc/os-release") {
        for line in os_release.lines() {
            if line.starts_with("PRETTY_NAME=") {
                let name = line.trim_start_matches("PRETTY_NAME=").trim_matches('"');
                info!("OS: {}", name);
                break;
            }
        }
    }

    if let Ok(session) = std::env::var("XDG_SESSION_TYPE") {
        info!("Session Type: {}", session);
    }
    if let Ok(desktop) = std::env::var("XDG_CURRENT_DESKTOP") {
        info!("Desktop Environment: {}", desktop);
    }
    if let Ok(wayland_display) = std::env::var("WAYLAND_DISPLAY") {
        info!("Wayland Display: {}", wayland_display);
    }
    info!(
        "Hyprland instance: {}",
        if std::env::var_os(HYPRLAND_SIGNATURE_ENV).is_some() {
            "detected"
        } else {
            "not detected"
        }
    );

    match find_on_path(&settings.process_name) {
        Some(path) => info!("{} binary: {}", settings.process_name, path.display()),
        None => info!("{} binary: not found on PATH", settings.process_name),
    }
    if let Some(program) = settings.launch_command.first()
        && program != &settings.process_name
    {
        match find_on_path(program) {
            Some(path) => info!("Launcher: {}", path.display()),
            None => info!("Launcher {}: not found on PATH", program),
        }
    }

    info!("Profiles: {}", settings.profiles_dir.display());
    info!("Backups: {}", settings.backups_dir.display());
    info!("Active config: {}", settings.active_dir.display());

    info!("==========================");
}

fn find_on_path(program: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

fn get_command_output(cmd: &str, args: &[&str]) -> anyhow::Result<String> {
    let output = Command::new(cmd).args(args).output()?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
