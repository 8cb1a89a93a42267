//! Uninstallation orchestrator.
//!
//! Unlike installation, this is a best-effort full pass: every phase runs no
//! matter what the previous ones reported, and the phase outcomes are
//! aggregated into one overall flag for the exit status.

use std::time::Duration;

use pharos_common::success;
use tracing::{info, warn};

use crate::command::CommandRunner;
use crate::deploy::{self, InstallLayout, POPUP_FILE};
use crate::desktop::Autostart;
use crate::process::ProcessInspector;
use crate::spooler::Spooler;

/// Per-phase outcome of one uninstall pass.
#[derive(Clone, Copy, Debug, Default)]
pub struct UninstallReport {
    pub queues: bool,
    pub backend: bool,
    pub popup: bool,
    pub autostart: bool,
    pub logs: bool,
    pub uninstaller: bool,
}

impl UninstallReport {
    pub fn all_ok(&self) -> bool {
        self.queues
            && self.backend
            && self.popup
            && self.autostart
            && self.logs
            && self.uninstaller
    }
}

pub struct Uninstaller<'r> {
    runner: &'r dyn CommandRunner,
    layout: InstallLayout,
    autostart: Autostart,
    kill_grace: Option<Duration>,
}

impl<'r> Uninstaller<'r> {
    pub fn new(runner: &'r dyn CommandRunner, layout: InstallLayout, autostart: Autostart) -> Self {
        Self {
            runner,
            layout,
            autostart,
            kill_grace: None,
        }
    }

    /// Overrides the post-SIGTERM grace period (tests).
    pub fn with_kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = Some(grace);
        self
    }

    pub fn run(&self) -> UninstallReport {
        let session = self.inspector().detect_session();
        info!("detected desktop session: {:?}", session);

        let report = UninstallReport {
            queues: self.remove_queues(),
            backend: deploy::remove_file_if_present(&self.layout.backend_path()),
            popup: self.remove_popup(),
            autostart: self.autostart.remove(session),
            logs: deploy::remove_dir_if_present(&self.layout.log_dir),
            uninstaller: deploy::remove_file_if_present(&self.layout.uninstaller_path()),
        };

        if report.all_ok() {
            success!("uninstallation complete");
        } else {
            warn!("uninstallation finished with failures: {:?}", report);
        }
        report
    }

    /// Deletes every queue claimed by the pharos backend; queues with any
    /// other device URI are left untouched.
    fn remove_queues(&self) -> bool {
        let spooler = Spooler::new(self.runner).with_ppd_dir(self.layout.ppd_dir.clone());

        let listing = match spooler.queues() {
            Ok(listing) => listing,
            Err(err) => {
                warn!("could not list print queues: {}", err);
                return false;
            }
        };

        let pharos: Vec<_> = listing.iter().filter(|q| q.is_pharos()).collect();
        if pharos.is_empty() {
            info!("no pharos print queues are installed");
            return true;
        }

        let mut ok = true;
        for queue in pharos {
            if spooler.delete(&queue.name) {
                info!("deleted print queue '{}'", queue.name);
            } else {
                warn!("could not delete print queue '{}'", queue.name);
                ok = false;
            }
        }
        ok
    }

    fn inspector(&self) -> ProcessInspector<'r> {
        let mut inspector = ProcessInspector::new(self.runner);
        if let Some(grace) = self.kill_grace {
            inspector = inspector.with_grace(grace);
        }
        inspector
    }

    /// Stops the popup server, then removes its executable and config.
    fn remove_popup(&self) -> bool {
        let inspector = self.inspector();

        let mut ok = true;
        if inspector.is_running(POPUP_FILE) {
            ok &= inspector.kill(POPUP_FILE);
        }
        ok &= deploy::remove_file_if_present(&self.layout.popup_exec());
        ok &= deploy::remove_file_if_present(&self.layout.popup_config());
        ok
    }
}
