//! Installation orchestrator.
//!
//! A strict linear sequence; the first fatal step wins. The binary driving
//! this is expected to answer any [`InstallError`] with a full uninstall
//! pass before exiting nonzero, so a botched half-install never lingers.

use std::fs;
use std::path::PathBuf;

use pharos_common::config::{PharosConfig, PrinterSpec};
use pharos_common::error::InstallError;
use pharos_common::success;
use tracing::{info, warn};

use crate::command::CommandRunner;
use crate::deploy::{
    self, BACKEND_FILE, EULA_FILE, POPUP_CONFIG_FILE, POPUP_FILE, PRINTERS_CONFIG_FILE,
    UNINSTALLER_FILE, InstallLayout,
};
use crate::desktop::Autostart;
use crate::drivers::DriverCatalog;
use crate::process::{DesktopSession, ProcessInspector};
use crate::provision::Provisioner;

/// Answers the interactive questions the install sequence asks. The CLI
/// wires this to real prompts; tests script it.
pub trait Prompter {
    /// Shown the license text when the package ships one. Returning false
    /// aborts the installation.
    fn confirm_eula(&self, eula: Option<&str>) -> bool;

    /// Asked once per configured printer whose driver is not installed.
    /// Returning false aborts the installation.
    fn confirm_missing_driver(&self, printer: &str) -> bool;
}

pub struct Installer<'r> {
    runner: &'r dyn CommandRunner,
    layout: InstallLayout,
    package_dir: PathBuf,
    autostart: Autostart,
}

impl<'r> Installer<'r> {
    pub fn new(
        runner: &'r dyn CommandRunner,
        layout: InstallLayout,
        package_dir: PathBuf,
        autostart: Autostart,
    ) -> Self {
        Self {
            runner,
            layout,
            package_dir,
            autostart,
        }
    }

    pub fn run(&self, prompter: &dyn Prompter) -> Result<(), InstallError> {
        self.check_prerequisites()?;

        let eula = fs::read_to_string(self.package_dir.join(EULA_FILE)).ok();
        if !prompter.confirm_eula(eula.as_deref()) {
            return Err(InstallError::EulaDeclined);
        }

        let config = PharosConfig::load(&self.package_dir.join(PRINTERS_CONFIG_FILE))?;
        info!("{} printer(s) configured", config.printers.len());

        let printers = self.check_driver_availability(&config, prompter)?;

        deploy::deploy_backend(&self.layout, &self.package_dir)?;
        deploy::deploy_popup(&self.layout, &self.package_dir)?;
        self.register_autostart()?;
        deploy::recreate_log_dir(&self.layout)?;

        let provisioner = Provisioner::new(self.runner, self.layout.ppd_dir.clone());
        let failed = provisioner.provision_all(&printers);
        if failed > 0 {
            return Err(InstallError::Provision { failed });
        }

        deploy::deploy_uninstaller(&self.layout, &self.package_dir)?;

        success!("installation complete");
        Ok(())
    }

    /// The spooler must be running and the package directory must actually
    /// carry the payload we are about to copy around.
    fn check_prerequisites(&self) -> Result<(), InstallError> {
        let inspector = ProcessInspector::new(self.runner);
        if !inspector.is_running("cups") {
            return Err(InstallError::MissingPrerequisite(
                "CUPS is either not installed or not running".to_string(),
            ));
        }
        info!("CUPS is installed and running");

        for name in [
            BACKEND_FILE,
            POPUP_FILE,
            POPUP_CONFIG_FILE,
            PRINTERS_CONFIG_FILE,
            UNINSTALLER_FILE,
        ] {
            if !self.package_dir.join(name).is_file() {
                return Err(InstallError::MissingPrerequisite(format!(
                    "package file '{name}' not found in {}",
                    self.package_dir.display()
                )));
            }
        }
        Ok(())
    }

    /// Probes the driver catalog for every configured printer before any
    /// file lands on the system, so a missing driver surfaces while aborting
    /// is still cheap. Per missing driver the operator chooses between
    /// skipping that printer and aborting the installation; the returned
    /// list holds the printers that will actually be provisioned.
    fn check_driver_availability(
        &self,
        config: &PharosConfig,
        prompter: &dyn Prompter,
    ) -> Result<Vec<PrinterSpec>, InstallError> {
        let catalog = DriverCatalog::new(self.runner);
        let mut retained = Vec::new();

        for spec in &config.printers {
            let (Some(driver), Some(model)) = (spec.driver.as_deref(), spec.model.as_deref())
            else {
                // Incomplete sections fail at provisioning time with a
                // precise error; nothing to probe here.
                retained.push(spec.clone());
                continue;
            };

            let available = match catalog.find(model, driver) {
                Ok(found) => found.is_some(),
                Err(err) => {
                    warn!("driver lookup for '{}' failed: {}", spec.name, err);
                    false
                }
            };

            if available {
                retained.push(spec.clone());
            } else {
                warn!("no installed driver matches '{}' for printer '{}'", driver, spec.name);
                if !prompter.confirm_missing_driver(&spec.name) {
                    return Err(InstallError::DriverMissing {
                        printer: spec.name.clone(),
                    });
                }
                info!("skipping printer '{}'", spec.name);
            }
        }
        Ok(retained)
    }

    fn register_autostart(&self) -> Result<(), InstallError> {
        let inspector = ProcessInspector::new(self.runner);
        let session = inspector.detect_session();

        if session == DesktopSession::Unknown {
            warn!("could not determine the desktop session (GNOME or KDE)");
            warn!(
                "add {} to your session autostart manually",
                self.layout.popup_exec().display()
            );
            return Ok(());
        }

        info!("registering popup autostart for {:?} sessions", session);
        self.autostart
            .register(session)
            .map_err(|source| InstallError::Deploy {
                what: "session autostart".to_string(),
                source,
            })
    }
}
