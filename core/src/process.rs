//! Process inspection and termination.
//!
//! Liveness is judged by scanning `ps ax` output line by line, so a name
//! matches anywhere in the command text; a stray filename containing the
//! name yields a false positive and callers accept that tradeoff.

use std::thread;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::command::CommandRunner;

/// Desktop session flavor, decided by which session manager process is
/// alive. Unknown is a warning condition, never fatal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DesktopSession {
    Gnome,
    Kde,
    Unknown,
}

const KILL_GRACE: Duration = Duration::from_secs(5);

pub struct ProcessInspector<'r> {
    runner: &'r dyn CommandRunner,
    grace: Duration,
}

impl<'r> ProcessInspector<'r> {
    pub fn new(runner: &'r dyn CommandRunner) -> Self {
        Self {
            runner,
            grace: KILL_GRACE,
        }
    }

    /// Shrinks the post-SIGTERM grace period (tests).
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Whether any running process matches `name` in its command text.
    pub fn is_running(&self, name: &str) -> bool {
        let out = match self.runner.run("ps", &["ax"]) {
            Ok(out) => out,
            Err(err) => {
                warn!("could not list running processes: {}", err);
                return false;
            }
        };

        let matcher = Regex::new(name).ok();
        for line in out.stdout.lines() {
            let hit = match &matcher {
                Some(re) => re.is_match(line),
                None => line.contains(name),
            };
            if hit {
                debug!("'{}' is running: {}", name, line.trim());
                return true;
            }
        }
        false
    }

    /// Terminates every process matching `name`.
    ///
    /// Sends SIGTERM per pid, sleeps out a fixed grace period, then
    /// re-checks. A survivor is reported as failure, never an error; there
    /// is no retry and no escalation to SIGKILL.
    pub fn kill(&self, name: &str) -> bool {
        let pids = match self.runner.run("pgrep", &[name]) {
            Ok(out) => out
                .stdout
                .lines()
                .filter_map(|line| line.trim().parse::<u32>().ok())
                .collect::<Vec<u32>>(),
            Err(err) => {
                warn!("could not look up pids for '{}': {}", name, err);
                return false;
            }
        };

        for pid in &pids {
            info!("sending terminate signal to pid {}", pid);
            let pid_arg = pid.to_string();
            if let Err(err) = self.runner.run("kill", &[pid_arg.as_str()]) {
                warn!("could not signal pid {}: {}", pid, err);
            }
            thread::sleep(self.grace);
        }

        if self.is_running(name) {
            warn!("process '{}' is still running", name);
            false
        } else {
            true
        }
    }

    /// GNOME wins over KDE when both session managers show up in the
    /// process list (shared machines with stacked sessions).
    pub fn detect_session(&self) -> DesktopSession {
        if self.is_running("gnome-session") {
            DesktopSession::Gnome
        } else if self.is_running("ksmserver") {
            DesktopSession::Kde
        } else {
            DesktopSession::Unknown
        }
    }
}
