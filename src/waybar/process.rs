//! OS process boundary: terminate by exact name, spawn by argv

use std::fs;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::error::WaybarError;
use crate::constants::process::{PROC_DIR, TERMINATE_GRACE_MS, TERMINATE_POLL_MS};

/// What a terminate attempt found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum TerminateStatus {
    Killed { count: usize },
    NotRunning,
}

/// Process operations the reloader depends on
pub trait ProcessControl: Send + Sync + 'static {
    /// Terminate every process whose name is exactly `name`.
    /// No matching process is `Ok(NotRunning)`, not an error.
    fn terminate(&self, name: &str) -> Result<TerminateStatus, WaybarError>;

    /// Spawn `argv` detached from the caller and return its PID
    fn launch(&self, argv: &[String]) -> Result<u32, WaybarError>;
}

/// `ProcessControl` backed by /proc, SIGTERM and `std::process::Command`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessControl;

impl ProcessControl for SystemProcessControl {
    fn terminate(&self, name: &str) -> Result<TerminateStatus, WaybarError> {
        let pids = find_pids_by_name(Path::new(PROC_DIR), name).map_err(|e| {
            WaybarError::ProcessTerminateFailed {
                name: name.to_string(),
                reason: format!("cannot scan {PROC_DIR}: {e}"),
            }
        })?;

        if pids.is_empty() {
            return Ok(TerminateStatus::NotRunning);
        }

        let mut signalled = Vec::new();
        let mut last_error = None;
        for pid in pids {
            match signal::kill(Pid::from_raw(pid), Signal::SIGTERM) {
                Ok(()) => {
                    debug!(pid, "SIGTERM sent");
                    signalled.push(pid);
                }
                Err(Errno::ESRCH) => debug!(pid, "Process already gone"),
                Err(e) => {
                    warn!(pid, error = %e, "Failed to send SIGTERM");
                    last_error = Some(e);
                }
            }
        }

        if signalled.is_empty() {
            return match last_error {
                Some(e) => Err(WaybarError::ProcessTerminateFailed {
                    name: name.to_string(),
                    reason: e.to_string(),
                }),
                None => Ok(TerminateStatus::NotRunning),
            };
        }

        wait_for_exit(&signalled, Duration::from_millis(TERMINATE_GRACE_MS));
        Ok(TerminateStatus::Killed {
            count: signalled.len(),
        })
    }

    fn launch(&self, argv: &[String]) -> Result<u32, WaybarError> {
        let command = argv.join(" ");
        let Some((program, args)) = argv.split_first() else {
            return Err(WaybarError::ProcessStartFailed {
                command,
                reason: "empty launch command".to_string(),
            });
        };

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .process_group(0)
            .spawn()
            .map_err(|e| WaybarError::ProcessStartFailed {
                command: command.clone(),
                reason: e.to_string(),
            })?;

        let pid = child.id();
        info!(pid, command = %command, "Launched");

        // Reap the child whenever it exits
        thread::spawn(move || {
            let _ = child.wait();
        });

        Ok(pid)
    }
}

/// PIDs whose `comm` equals `name` exactly, excluding the current process
pub fn find_pids_by_name(proc_dir: &Path, name: &str) -> std::io::Result<Vec<i32>> {
    let own_pid = std::process::id() as i32;
    let mut pids = Vec::new();

    for entry in fs::read_dir(proc_dir)? {
        let Ok(entry) = entry else { continue };
        let Some(pid) = entry
            .file_name()
            .to_str()
            .and_then(|s| s.parse::<i32>().ok())
        else {
            continue;
        };
        if pid == own_pid {
            continue;
        }

        // Processes can vanish between read_dir and read
        if let Ok(comm) = fs::read_to_string(entry.path().join("comm"))
            && comm.trim_end_matches('\n') == name
        {
            pids.push(pid);
        }
    }

    pids.sort_unstable();
    Ok(pids)
}

fn wait_for_exit(pids: &[i32], grace: Duration) {
    let deadline = Instant::now() + grace;
    loop {
        let alive: Vec<i32> = pids
            .iter()
            .copied()
            .filter(|pid| Path::new(PROC_DIR).join(pid.to_string()).exists())
            .collect();
        if alive.is_empty() {
            return;
        }
        if Instant::now() >= deadline {
            warn!(?alive, "Processes still present after grace period");
            return;
        }
        thread::sleep(Duration::from_millis(TERMINATE_POLL_MS));
    }
}
