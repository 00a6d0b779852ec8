//! Profile deployment
//!
//! Backup, copy the two profile files over the live ones, then reload.
//! Only the backup step can abort a deploy.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{error, info, warn};

use super::error::WaybarError;
use super::profile::{Profile, ProfileStore};
use super::reload::{Reload, ReloadOutcome, StartResult};
use crate::common::fs::copy_with_metadata;
use crate::config::backup::BackupManager;
use crate::constants::waybar::{CONFIG_FILENAME, STYLE_FILENAME};

/// The live files the running bar reads at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveConfig {
    pub dir: PathBuf,
}

impl ActiveConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILENAME)
    }

    pub fn style_path(&self) -> PathBuf {
        self.dir.join(STYLE_FILENAME)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployMessage {
    pub level: MessageLevel,
    pub text: String,
}

impl fmt::Display for DeployMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.level {
            MessageLevel::Info => "•",
            MessageLevel::Success => "✅",
            MessageLevel::Warning => "⚠️",
            MessageLevel::Error => "❌",
        };
        write!(f, "{marker} {}", self.text)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeployResult {
    pub profile: String,
    pub success: bool,
    pub messages: Vec<DeployMessage>,
    pub backup: Option<PathBuf>,
    pub reload: Option<ReloadOutcome>,
}

impl DeployResult {
    fn new(profile: &Profile) -> Self {
        Self {
            profile: profile.name.clone(),
            success: true,
            messages: Vec::new(),
            backup: None,
            reload: None,
        }
    }

    fn push(&mut self, level: MessageLevel, text: impl Into<String>) {
        let text = text.into();
        match level {
            MessageLevel::Warning => warn!("{}", text),
            MessageLevel::Error => error!("{}", text),
            _ => info!("{}", text),
        }
        self.messages.push(DeployMessage { level, text });
    }

    pub fn count(&self, level: MessageLevel) -> usize {
        self.messages.iter().filter(|m| m.level == level).count()
    }

    /// All messages joined for a status panel
    pub fn render(&self) -> String {
        self.messages
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub struct Deployer<R: Reload> {
    backups: BackupManager,
    active: ActiveConfig,
    reloader: R,
    process_name: String,
}

impl<R: Reload> Deployer<R> {
    pub fn new(
        backups: BackupManager,
        active: ActiveConfig,
        reloader: R,
        process_name: impl Into<String>,
    ) -> Self {
        Self {
            backups,
            active,
            reloader,
            process_name: process_name.into(),
        }
    }

    pub fn reloader(&self) -> &R {
        &self.reloader
    }

    /// Resolve `path` (a profile directory or a file inside one) and deploy it
    pub fn deploy_path(&self, path: &Path) -> Result<DeployResult, WaybarError> {
        let profile = ProfileStore::resolve(path)?;
        Ok(self.deploy(&profile))
    }

    pub fn deploy(&self, profile: &Profile) -> DeployResult {
        let mut result = DeployResult::new(profile);
        info!(profile = %profile.name, root = ?profile.root, "Deploying profile");

        match self.backups.snapshot(&self.active.dir) {
            Ok(snapshot) => {
                result.push(
                    MessageLevel::Info,
                    format!(
                        "Backed up {} file(s) to {}",
                        snapshot.copied.len(),
                        snapshot.path.display()
                    ),
                );
                result.backup = Some(snapshot.path);
            }
            Err(e) => {
                result.success = false;
                result.push(MessageLevel::Error, format!("{e}; nothing deployed"));
                return result;
            }
        }

        if let Err(e) = fs::create_dir_all(&self.active.dir) {
            warn!(path = ?self.active.dir, error = %e, "Could not create active config directory");
        }

        self.deploy_file(
            &mut result,
            &profile.config_path,
            &self.active.config_path(),
            "config",
            "Config",
        );
        self.deploy_file(
            &mut result,
            &profile.style_path,
            &self.active.style_path(),
            STYLE_FILENAME,
            STYLE_FILENAME,
        );

        let outcome = self.reloader.reload();
        let summary = outcome.summary(&self.process_name);
        if outcome.is_fatal() {
            result.success = false;
            result.push(MessageLevel::Error, summary);
        } else if outcome.start == StartResult::Unconfirmed {
            result.push(MessageLevel::Warning, summary);
        } else {
            result.push(MessageLevel::Info, summary);
        }
        result.reload = Some(outcome);

        result
    }

    fn deploy_file(
        &self,
        result: &mut DeployResult,
        from: &Path,
        to: &Path,
        missing_label: &str,
        deployed_label: &str,
    ) {
        if !from.is_file() {
            let missing = WaybarError::ConfigurationMissing {
                name: missing_label.to_string(),
            };
            result.push(MessageLevel::Warning, missing.to_string());
            return;
        }

        match copy_with_metadata(from, to) {
            Ok(_) => result.push(MessageLevel::Success, format!("{deployed_label} deployed")),
            Err(source) => {
                let err = WaybarError::CopyFailed {
                    from: from.to_path_buf(),
                    to: to.to_path_buf(),
                    source,
                };
                result.push(MessageLevel::Warning, err.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waybar::reload::{KillResult, ReloadState};
    use std::cell::Cell;
    use std::time::Duration;

    /// `Reload` that counts calls and returns a fixed outcome
    struct CountingReload {
        calls: Cell<usize>,
        start: StartResult,
    }

    impl CountingReload {
        fn started() -> Self {
            Self {
                calls: Cell::new(0),
                start: StartResult::Started { pid: 99 },
            }
        }

        fn failing() -> Self {
            Self {
                calls: Cell::new(0),
                start: StartResult::Failed {
                    reason: "No such file or directory".into(),
                },
            }
        }
    }

    impl Reload for CountingReload {
        fn reload(&self) -> ReloadOutcome {
            self.calls.set(self.calls.get() + 1);
            ReloadOutcome {
                kill: KillResult::Killed { count: 1 },
                start: self.start.clone(),
                kill_signalled: true,
                launcher: None,
                elapsed: Duration::from_millis(5),
            }
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        active: PathBuf,
        backups: PathBuf,
        profiles: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let active = dir.path().join("waybar");
            let backups = dir.path().join("backups");
            let profiles = dir.path().join("profiles");
            fs::create_dir_all(&active).unwrap();
            fs::create_dir_all(&profiles).unwrap();
            Self {
                _dir: dir,
                active,
                backups,
                profiles,
            }
        }

        fn profile(&self, name: &str, config: Option<&str>, style: Option<&str>) -> Profile {
            let root = self.profiles.join(name);
            fs::create_dir_all(&root).unwrap();
            if let Some(config) = config {
                fs::write(root.join("config"), config).unwrap();
            }
            if let Some(style) = style {
                fs::write(root.join("style.css"), style).unwrap();
            }
            Profile::from_root(root)
        }

        fn deployer<R: Reload>(&self, reload: R) -> Deployer<R> {
            Deployer::new(
                BackupManager::new(&self.backups),
                ActiveConfig::new(&self.active),
                reload,
                "waybar",
            )
        }

        fn snapshots(&self) -> Vec<PathBuf> {
            BackupManager::new(&self.backups)
                .list_backups()
                .unwrap()
                .into_iter()
                .map(|b| b.path)
                .collect()
        }
    }

    #[test]
    fn test_config_only_profile_scenario() {
        let fx = Fixture::new();
        fs::write(fx.active.join("config"), "old").unwrap();
        fs::write(fx.active.join("style.css"), "old-style").unwrap();
        let profile = fx.profile("bare", Some("new"), None);

        let deployer = fx.deployer(CountingReload::started());
        let result = deployer.deploy(&profile);

        assert!(result.success);
        assert_eq!(fs::read_to_string(fx.active.join("config")).unwrap(), "new");
        assert_eq!(
            fs::read_to_string(fx.active.join("style.css")).unwrap(),
            "old-style"
        );

        let snapshots = fx.snapshots();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(
            fs::read_to_string(snapshots[0].join("config")).unwrap(),
            "old"
        );
        assert_eq!(result.backup.as_ref(), Some(&snapshots[0]));

        assert_eq!(result.count(MessageLevel::Success), 1);
        assert_eq!(result.count(MessageLevel::Warning), 1);
        assert!(
            result
                .messages
                .iter()
                .any(|m| m.text == "Config deployed")
        );
        assert!(
            result
                .messages
                .iter()
                .any(|m| m.text == "style.css file missing")
        );
        assert_eq!(deployer.reloader().calls.get(), 1);
    }

    #[test]
    fn test_empty_profile_still_backs_up_and_reloads() {
        let fx = Fixture::new();
        fs::write(fx.active.join("config"), "live").unwrap();
        let profile = fx.profile("empty", None, None);

        let deployer = fx.deployer(CountingReload::started());
        let result = deployer.deploy(&profile);

        assert!(result.success);
        assert_eq!(fx.snapshots().len(), 1);
        assert_eq!(result.count(MessageLevel::Warning), 2);
        assert_eq!(result.count(MessageLevel::Success), 0);
        assert_eq!(deployer.reloader().calls.get(), 1);
        assert_eq!(fs::read_to_string(fx.active.join("config")).unwrap(), "live");
    }

    #[test]
    fn test_backup_failure_aborts_before_overwrite() {
        let fx = Fixture::new();
        fs::write(fx.active.join("config"), "keep-me").unwrap();
        fs::write(&fx.backups, "blocking file").unwrap();
        let profile = fx.profile("full", Some("replacement"), Some("css"));

        let deployer = fx.deployer(CountingReload::started());
        let result = deployer.deploy(&profile);

        assert!(!result.success);
        assert_eq!(result.count(MessageLevel::Error), 1);
        assert!(result.backup.is_none());
        assert!(result.reload.is_none());
        assert_eq!(
            fs::read_to_string(fx.active.join("config")).unwrap(),
            "keep-me"
        );
        assert!(!fx.active.join("style.css").exists());
        assert_eq!(deployer.reloader().calls.get(), 0);
    }

    #[test]
    fn test_failed_start_marks_deploy_failed() {
        let fx = Fixture::new();
        let profile = fx.profile("full", Some("cfg"), Some("css"));

        let deployer = fx.deployer(CountingReload::failing());
        let result = deployer.deploy(&profile);

        assert!(!result.success);
        assert_eq!(result.count(MessageLevel::Success), 2);
        let last = result.messages.last().unwrap();
        assert_eq!(last.level, MessageLevel::Error);
        assert!(last.text.contains("failed to start"));
        assert_eq!(
            result.reload.as_ref().map(|r| r.state()),
            Some(ReloadState::StartFailed)
        );
    }

    #[test]
    fn test_copy_failure_is_a_warning() {
        let fx = Fixture::new();
        // A directory where the stylesheet should go makes the copy fail
        fs::create_dir(fx.active.join("style.css")).unwrap();
        let profile = fx.profile("full", Some("cfg"), Some("css"));

        let deployer = fx.deployer(CountingReload::started());
        let result = deployer.deploy(&profile);

        assert!(result.success);
        assert_eq!(result.count(MessageLevel::Success), 1);
        assert!(
            result
                .messages
                .iter()
                .any(|m| m.level == MessageLevel::Warning && m.text.starts_with("failed to copy"))
        );
        assert_eq!(deployer.reloader().calls.get(), 1);
    }

    #[test]
    fn test_missing_active_dir_is_created() {
        let fx = Fixture::new();
        fs::remove_dir(&fx.active).unwrap();
        let profile = fx.profile("full", Some("cfg"), Some("css"));

        let result = fx.deployer(CountingReload::started()).deploy(&profile);
        assert!(result.success);
        assert_eq!(fs::read_to_string(fx.active.join("style.css")).unwrap(), "css");
    }

    #[test]
    fn test_deploy_a_then_b_then_a_restores_bytes() {
        let fx = Fixture::new();
        let a = fx.profile("a", Some("{\"layer\": \"top\"}"), Some("#clock { color: red; }"));
        let b = fx.profile("b", Some("{\"layer\": \"bottom\"}"), Some("* { margin: 0; }"));
        let deployer = fx.deployer(CountingReload::started());

        deployer.deploy(&a);
        let first_config = fs::read(fx.active.join("config")).unwrap();
        let first_style = fs::read(fx.active.join("style.css")).unwrap();

        deployer.deploy(&b);
        assert_eq!(
            fs::read_to_string(fx.active.join("config")).unwrap(),
            "{\"layer\": \"bottom\"}"
        );

        deployer.deploy(&a);
        assert_eq!(fs::read(fx.active.join("config")).unwrap(), first_config);
        assert_eq!(fs::read(fx.active.join("style.css")).unwrap(), first_style);
        assert_eq!(fx.snapshots().len(), 3);
        assert_eq!(deployer.reloader().calls.get(), 3);
    }

    #[test]
    fn test_deploy_path_accepts_file_inside_profile() {
        let fx = Fixture::new();
        let profile = fx.profile("pick", Some("cfg"), None);

        let deployer = fx.deployer(CountingReload::started());
        let result = deployer.deploy_path(&profile.config_path).unwrap();
        assert_eq!(result.profile, "pick");
        assert_eq!(fs::read_to_string(fx.active.join("config")).unwrap(), "cfg");

        assert!(matches!(
            deployer.deploy_path(&fx.profiles.join("nope")),
            Err(WaybarError::ProfileNotFound(_))
        ));
    }

    #[test]
    fn test_render_joins_messages() {
        let fx = Fixture::new();
        let profile = fx.profile("bare", Some("new"), None);
        let result = fx.deployer(CountingReload::started()).deploy(&profile);

        let rendered = result.render();
        assert!(rendered.contains("✅ Config deployed"));
        assert!(rendered.contains("⚠️ style.css file missing"));
        assert_eq!(rendered.lines().count(), result.messages.len());
    }
}
