//! Terminate-then-relaunch of the status bar
//!
//! Two threads cooperate per reload. The terminate task fires a single
//! "killed" signal once its attempt completes (found or not). The restart task
//! waits on that signal for at most `timeout`, then launches regardless and
//! fires a "launched" signal carrying the result. The caller joins both tasks
//! for at most `timeout`, then waits on "launched" for at most
//! `LAUNCH_WAIT_FACTOR * timeout`. Tasks that outlive those bounds are left
//! to finish on their own.

use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::error::WaybarError;
use super::process::{ProcessControl, TerminateStatus};
use crate::constants::process::LAUNCH_WAIT_FACTOR;

/// Result of the terminate task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum KillResult {
    Killed { count: usize },
    NotRunning,
    Failed { reason: String },
    /// The terminate task had not reported when the join expired
    Unknown,
}

/// Result of the restart task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum StartResult {
    Started { pid: u32 },
    Failed { reason: String },
    /// No launch signal arrived within the extended wait
    Unconfirmed,
}

/// Terminal state of a reload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReloadState {
    KilledAndStarted,
    KillSkippedAndStarted,
    StartFailed,
    /// The launch never reported back; the bar may or may not be running
    StartUnconfirmed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReloadOutcome {
    pub kill: KillResult,
    pub start: StartResult,
    /// Whether the restart task saw the "killed" signal before its timeout
    pub kill_signalled: bool,
    /// Program started in place of the bar itself (e.g. `hyprctl`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launcher: Option<String>,
    pub elapsed: Duration,
}

impl ReloadOutcome {
    pub fn state(&self) -> ReloadState {
        match (&self.kill, &self.start) {
            (_, StartResult::Failed { .. }) => ReloadState::StartFailed,
            (_, StartResult::Unconfirmed) => ReloadState::StartUnconfirmed,
            (KillResult::Killed { .. }, StartResult::Started { .. }) => {
                ReloadState::KilledAndStarted
            }
            (_, StartResult::Started { .. }) => ReloadState::KillSkippedAndStarted,
        }
    }

    /// The bar is known to be down
    pub fn is_fatal(&self) -> bool {
        self.state() == ReloadState::StartFailed
    }

    /// One-line human summary
    pub fn summary(&self, process_name: &str) -> String {
        let kill = match &self.kill {
            KillResult::Killed { count } => format!("stopped {count} running instance(s)"),
            KillResult::NotRunning => "no running instance".to_string(),
            KillResult::Failed { reason } => format!("stop failed ({reason})"),
            KillResult::Unknown => "stop did not report in time".to_string(),
        };
        match &self.start {
            StartResult::Started { pid } => match &self.launcher {
                Some(launcher) => {
                    format!("{process_name} restarted via {launcher} (launcher PID {pid}), {kill}")
                }
                None => format!("{process_name} restarted with PID {pid}, {kill}"),
            },
            StartResult::Failed { reason } => {
                format!("{process_name} failed to start: {reason}; {kill}")
            }
            StartResult::Unconfirmed => {
                format!("{process_name} launch not confirmed in time; {kill}")
            }
        }
    }
}

/// Something that can restart the status bar once per call
pub trait Reload {
    fn reload(&self) -> ReloadOutcome;
}

/// Settings shared by every reload
#[derive(Debug, Clone)]
pub struct ReloadSettings {
    pub process_name: String,
    pub launch_command: Vec<String>,
    pub timeout: Duration,
}

/// Messages each task sends when it finishes
enum TaskReport {
    Terminated(KillResult),
    Restarted { kill_signalled: bool },
}

/// One-shot reloader; `reload` consumes it
pub struct ProcessReloader<C: ProcessControl> {
    control: Arc<C>,
    settings: ReloadSettings,
}

impl<C: ProcessControl> ProcessReloader<C> {
    pub fn new(control: Arc<C>, settings: ReloadSettings) -> Self {
        Self { control, settings }
    }

    pub fn reload(self) -> ReloadOutcome {
        let started_at = Instant::now();
        let ReloadSettings {
            process_name,
            launch_command,
            timeout,
        } = self.settings;
        info!(process = %process_name, ?timeout, "Reloading");

        let (killed_tx, killed_rx) = mpsc::sync_channel::<()>(1);
        let (launched_tx, launched_rx) = mpsc::sync_channel::<Result<u32, String>>(1);
        let (report_tx, report_rx) = mpsc::channel::<TaskReport>();
        let command_label = launch_command.join(" ");
        let launcher = launch_command
            .first()
            .filter(|program| **program != process_name)
            .cloned();

        let control = Arc::clone(&self.control);
        let report = report_tx.clone();
        let name = process_name.clone();
        let terminator = thread::Builder::new()
            .name("waypy-terminate".into())
            .spawn(move || {
                let kill = match control.terminate(&name) {
                    Ok(TerminateStatus::Killed { count }) => {
                        info!(count, "Killed existing {} process(es)", name);
                        KillResult::Killed { count }
                    }
                    Ok(TerminateStatus::NotRunning) => {
                        warn!("No {} process found to kill, starting anyway", name);
                        KillResult::NotRunning
                    }
                    Err(e) => {
                        error!(error = %e, "Terminate attempt failed, starting anyway");
                        KillResult::Failed {
                            reason: e.to_string(),
                        }
                    }
                };
                let _ = killed_tx.send(());
                let _ = report.send(TaskReport::Terminated(kill));
            });

        let control = Arc::clone(&self.control);
        let report = report_tx;
        let restarter = thread::Builder::new()
            .name("waypy-restart".into())
            .spawn(move || {
                debug!(?timeout, "Waiting for terminate signal");
                let kill_signalled = killed_rx.recv_timeout(timeout).is_ok();
                if !kill_signalled {
                    warn!(?timeout, "Terminate signal not received, launching anyway");
                }

                let launched = control
                    .launch(&launch_command)
                    .map_err(|e| e.to_string());
                let _ = launched_tx.send(launched);
                let _ = report.send(TaskReport::Restarted { kill_signalled });
            });

        let mut outcome = ReloadOutcome {
            kill: KillResult::Unknown,
            start: StartResult::Unconfirmed,
            kill_signalled: false,
            launcher,
            elapsed: Duration::ZERO,
        };

        // A task that could not even be spawned reports its failure directly
        let mut pending = 2;
        if let Err(e) = terminator {
            error!(error = %e, "Failed to spawn terminate task");
            outcome.kill = KillResult::Failed {
                reason: e.to_string(),
            };
            pending -= 1;
        }
        if let Err(e) = restarter {
            error!(error = %e, "Failed to spawn restart task");
            outcome.start = StartResult::Failed {
                reason: WaybarError::ProcessStartFailed {
                    command: command_label,
                    reason: e.to_string(),
                }
                .to_string(),
            };
            outcome.elapsed = started_at.elapsed();
            return outcome;
        }

        let join_deadline = started_at.checked_add(timeout);
        while pending > 0 {
            let remaining = match join_deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => timeout,
            };
            match report_rx.recv_timeout(remaining) {
                Ok(TaskReport::Terminated(kill)) => outcome.kill = kill,
                Ok(TaskReport::Restarted { kill_signalled }) => {
                    outcome.kill_signalled = kill_signalled
                }
                Err(RecvTimeoutError::Timeout) => {
                    warn!(pending, "Reload tasks still running after join timeout");
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
            pending -= 1;
        }

        let launch_wait = timeout.saturating_mul(LAUNCH_WAIT_FACTOR);
        outcome.start = match launched_rx.recv_timeout(launch_wait) {
            Ok(Ok(pid)) => StartResult::Started { pid },
            Ok(Err(reason)) => {
                error!(reason = %reason, "Failed to start {}", process_name);
                StartResult::Failed { reason }
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(?launch_wait, "Gave up waiting for launch confirmation");
                StartResult::Unconfirmed
            }
            Err(RecvTimeoutError::Disconnected) => StartResult::Failed {
                reason: "restart task ended without reporting".to_string(),
            },
        };

        outcome.elapsed = started_at.elapsed();
        info!(state = ?outcome.state(), elapsed = ?outcome.elapsed, "Reload completed");
        outcome
    }
}

/// `Reload` that builds a fresh `ProcessReloader` for every call
pub struct Reloader<C: ProcessControl> {
    control: Arc<C>,
    settings: ReloadSettings,
}

impl<C: ProcessControl> Reloader<C> {
    pub fn new(control: C, settings: ReloadSettings) -> Self {
        Self {
            control: Arc::new(control),
            settings,
        }
    }
}

impl<C: ProcessControl> Reload for Reloader<C> {
    fn reload(&self) -> ReloadOutcome {
        ProcessReloader::new(Arc::clone(&self.control), self.settings.clone()).reload()
    }
}
