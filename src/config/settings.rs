//! Application settings loaded from `config.yaml`
//!
//! Every key is optional. A missing file means defaults; a file that exists
//! but cannot be read or parsed is an error the caller treats as fatal.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::constants::{config, process, waybar};

/// On-disk shape of `config.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub waybar_configs_dir: Option<String>,
    pub backups_path: Option<String>,
    pub waybar_active_dir: Option<String>,
    pub process_name: Option<String>,
    pub launch_command: Option<Vec<String>>,
    pub reload_timeout_secs: Option<f64>,
}

/// Resolved settings with defaults applied
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub profiles_dir: PathBuf,
    pub backups_dir: PathBuf,
    pub active_dir: PathBuf,
    pub process_name: String,
    pub launch_command: Vec<String>,
    pub reload_timeout: Duration,
}

impl Settings {
    /// Application directory (`$WAYPY_CONFIG_HOME` or `<config dir>/waypy`)
    pub fn app_dir() -> PathBuf {
        if let Some(dir) = std::env::var_os(config::DIR_ENV) {
            return PathBuf::from(dir);
        }
        config_home().join(config::APP_DIR)
    }

    /// Default location of `config.yaml`
    pub fn default_path() -> PathBuf {
        Self::app_dir().join(config::FILENAME)
    }

    /// Load settings from `path`, falling back to defaults when it is absent
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("Config file {:?} does not exist. Using defaults.", path);
            return Ok(Self::from_file(FileConfig::default()));
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;

        let file: FileConfig = if contents.trim().is_empty() {
            debug!("Config file is empty, using defaults");
            FileConfig::default()
        } else {
            serde_yaml_ng::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML from {:?}", path))?
        };

        info!(path = ?path, "Loaded config");
        Ok(Self::from_file(file))
    }

    /// Apply defaults to whatever the file provided
    pub fn from_file(file: FileConfig) -> Self {
        let app_dir = Self::app_dir();

        let profiles_dir = file
            .waybar_configs_dir
            .as_deref()
            .map(expand_tilde)
            .unwrap_or_else(|| {
                config::PROFILES_SUBDIR
                    .iter()
                    .fold(app_dir.clone(), |p, part| p.join(part))
            });

        let backups_dir = file
            .backups_path
            .as_deref()
            .map(expand_tilde)
            .unwrap_or_else(|| app_dir.join(config::backup::SUBDIR));

        let active_dir = file
            .waybar_active_dir
            .as_deref()
            .map(expand_tilde)
            .unwrap_or_else(|| config_home().join(waybar::ACTIVE_DIR));

        let process_name = file
            .process_name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| process::DEFAULT_NAME.to_string());

        let launch_command = file
            .launch_command
            .filter(|argv| !argv.is_empty())
            .unwrap_or_else(|| default_launch_command(&process_name));

        let reload_timeout = match file.reload_timeout_secs {
            Some(secs) => parse_reload_timeout(secs).unwrap_or_else(|| {
                warn!(secs, "Ignoring invalid reload_timeout_secs, using default");
                default_reload_timeout()
            }),
            None => default_reload_timeout(),
        };

        Self {
            profiles_dir,
            backups_dir,
            active_dir,
            process_name,
            launch_command,
            reload_timeout,
        }
    }

    /// Copy of these settings with a command-line timeout override applied
    pub fn with_timeout(&self, secs: Option<f64>) -> Self {
        let mut settings = self.clone();
        if let Some(secs) = secs {
            match parse_reload_timeout(secs) {
                Some(timeout) => settings.reload_timeout = timeout,
                None => warn!(
                    secs,
                    "Ignoring invalid --timeout, keeping {:?}",
                    self.reload_timeout
                ),
            }
        }
        settings
    }

    /// Create the profiles root so the picker and `profiles` have something to show
    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.profiles_dir)
            .with_context(|| format!("Failed to create profiles directory {:?}", self.profiles_dir))
    }
}

fn default_reload_timeout() -> Duration {
    Duration::from_secs_f64(process::DEFAULT_RELOAD_TIMEOUT_SECS)
}

/// Positive finite seconds, clamped to `MAX_RELOAD_TIMEOUT_SECS`
fn parse_reload_timeout(secs: f64) -> Option<Duration> {
    if !secs.is_finite() || secs <= 0.0 {
        return None;
    }
    if secs > process::MAX_RELOAD_TIMEOUT_SECS {
        warn!(
            secs,
            max = process::MAX_RELOAD_TIMEOUT_SECS,
            "Reload timeout too large, clamping"
        );
    }
    Duration::try_from_secs_f64(secs.min(process::MAX_RELOAD_TIMEOUT_SECS)).ok()
}

fn config_home() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Launch through Hyprland when a compositor instance is reachable
fn default_launch_command(process_name: &str) -> Vec<String> {
    let mut argv: Vec<String> = Vec::new();
    if std::env::var_os(process::HYPRLAND_SIGNATURE_ENV).is_some() {
        argv.extend(process::HYPRLAND_EXEC.iter().map(|s| s.to_string()));
    }
    argv.push(process_name.to_string());
    argv
}

fn expand_tilde(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    if raw == "~"
        && let Some(home) = dirs::home_dir()
    {
        return home;
    }
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let raw = r#"
waybar_configs_dir: /srv/bars
backups_path: /srv/bars-backups
waybar_active_dir: /tmp/waybar-live
process_name: waybar
launch_command: ["hyprctl", "dispatch", "exec", "waybar"]
reload_timeout_secs: 2.5
"#;
        let file: FileConfig = serde_yaml_ng::from_str(raw).unwrap();
        let settings = Settings::from_file(file);

        assert_eq!(settings.profiles_dir, PathBuf::from("/srv/bars"));
        assert_eq!(settings.backups_dir, PathBuf::from("/srv/bars-backups"));
        assert_eq!(settings.active_dir, PathBuf::from("/tmp/waybar-live"));
        assert_eq!(settings.process_name, "waybar");
        assert_eq!(
            settings.launch_command,
            vec!["hyprctl", "dispatch", "exec", "waybar"]
        );
        assert_eq!(settings.reload_timeout, Duration::from_millis(2500));
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let raw = "hyprland_configs_dir: /srv/hypr\nprocess_name: bar\n";
        let file: FileConfig = serde_yaml_ng::from_str(raw).unwrap();
        assert_eq!(file.process_name.as_deref(), Some("bar"));
    }

    #[test]
    fn test_defaults_fill_missing_keys() {
        let settings = Settings::from_file(FileConfig {
            launch_command: Some(Vec::new()),
            reload_timeout_secs: Some(-1.0),
            ..FileConfig::default()
        });

        assert_eq!(settings.process_name, "waybar");
        assert_eq!(settings.launch_command.last().map(String::as_str), Some("waybar"));
        assert_eq!(settings.reload_timeout, Duration::from_secs(10));
        assert!(settings.profiles_dir.ends_with("profiles/waybar"));
        assert!(settings.backups_dir.ends_with("backups"));
        assert!(settings.active_dir.ends_with("waybar"));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("config.yaml")).unwrap();
        assert_eq!(settings, Settings::from_file(FileConfig::default()));
    }

    #[test]
    fn test_load_empty_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "\n").unwrap();
        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.process_name, "waybar");
    }

    #[test]
    fn test_load_invalid_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "launch_command: [unterminated\n").unwrap();

        let err = Settings::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse YAML"));
    }

    #[test]
    fn test_expand_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/bars"), home.join("bars"));
            assert_eq!(expand_tilde("~"), home);
        }
        assert_eq!(expand_tilde("/abs/~/x"), PathBuf::from("/abs/~/x"));
    }

    #[test]
    fn test_timeout_override() {
        let base = Settings::from_file(FileConfig::default());
        assert_eq!(
            base.with_timeout(Some(0.5)).reload_timeout,
            Duration::from_millis(500)
        );
        assert_eq!(base.with_timeout(Some(0.0)).reload_timeout, base.reload_timeout);
        assert_eq!(base.with_timeout(None), base);
    }

    #[test]
    fn test_huge_timeout_is_clamped() {
        let base = Settings::from_file(FileConfig::default());
        let max = Duration::from_secs_f64(process::MAX_RELOAD_TIMEOUT_SECS);

        assert_eq!(base.with_timeout(Some(1e20)).reload_timeout, max);
        assert_eq!(base.with_timeout(Some(f64::NAN)), base);
        assert_eq!(base.with_timeout(Some(f64::INFINITY)), base);

        let file: FileConfig = serde_yaml_ng::from_str("reload_timeout_secs: 1e20\n").unwrap();
        assert_eq!(Settings::from_file(file).reload_timeout, max);
    }

    #[test]
    fn test_ensure_dirs_creates_profiles_root() {
        let dir = tempfile::tempdir().unwrap();
        let profiles = dir.path().join("a").join("b");
        let settings = Settings {
            profiles_dir: profiles.clone(),
            ..Settings::from_file(FileConfig::default())
        };
        settings.ensure_dirs().unwrap();
        assert!(profiles.is_dir());
    }
}
