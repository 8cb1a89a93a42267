//! Print-queue provisioning.
//!
//! Turns one [`PrinterSpec`] into a live spooler queue: resolve the driver
//! from the installed catalog, clear any queue squatting on the name, create
//! against the `pharos://` device URI, then best-effort duplex and enable.
//! The final verdict is an existence re-check, not the exit status of any
//! single command.

use std::path::PathBuf;

use pharos_common::config::PrinterSpec;
use pharos_common::error::ProvisionError;
use pharos_common::success;
use tracing::{error, info, warn};

use crate::command::CommandRunner;
use crate::drivers::DriverCatalog;
use crate::spooler::{CreateQueue, PHAROS_URI_SCHEME, Spooler};

pub struct Provisioner<'r> {
    spooler: Spooler<'r>,
    catalog: DriverCatalog<'r>,
}

impl<'r> Provisioner<'r> {
    pub fn new(runner: &'r dyn CommandRunner, ppd_dir: impl Into<PathBuf>) -> Self {
        Self {
            spooler: Spooler::new(runner).with_ppd_dir(ppd_dir),
            catalog: DriverCatalog::new(runner),
        }
    }

    /// Materializes the queue described by `spec`.
    ///
    /// Fails fast on an incomplete spec without touching the spooler, and
    /// never creates over a queue whose deletion could not be confirmed.
    pub fn create_queue(&self, spec: &PrinterSpec) -> Result<(), ProvisionError> {
        let missing = |field| ProvisionError::MissingField {
            printer: spec.name.clone(),
            field,
        };
        let driver = spec.driver.as_deref().ok_or_else(|| missing("driver"))?;
        let model = spec.model.as_deref().ok_or_else(|| missing("model"))?;
        let server = spec.lpd_server.as_deref().ok_or_else(|| missing("lpdserver"))?;
        let queue = spec.lpd_queue.as_deref().ok_or_else(|| missing("lpdqueue"))?;

        let entry = self
            .catalog
            .find(model, driver)
            .map_err(|source| ProvisionError::CatalogQuery {
                printer: spec.name.clone(),
                source,
            })?
            .ok_or_else(|| ProvisionError::DriverNotFound {
                printer: spec.name.clone(),
                pattern: driver.to_string(),
            })?;
        info!("using driver {} for queue '{}'", entry.path, spec.name);

        if self.spooler.exists(&spec.name) {
            info!("queue '{}' already exists, deleting first", spec.name);
            if !self.spooler.delete(&spec.name) {
                return Err(ProvisionError::DeleteFailed {
                    name: spec.name.clone(),
                });
            }
        }

        let device_uri = format!("{PHAROS_URI_SCHEME}{server}/{queue}");
        if !self.spooler.create(&CreateQueue {
            name: &spec.name,
            device_uri: &device_uri,
            driver_path: &entry.path,
            location: spec.location.as_deref(),
            description: spec.description.as_deref(),
        }) {
            warn!("queue create command for '{}' reported failure", spec.name);
        }

        if spec.duplex && !self.spooler.set_duplex(&spec.name, spec.make.as_deref()) {
            warn!("could not configure duplex for queue '{}'", spec.name);
        }

        if !self.spooler.enable(&spec.name) {
            warn!("could not enable queue '{}'", spec.name);
        }

        if self.spooler.exists(&spec.name) {
            Ok(())
        } else {
            Err(ProvisionError::NotCreated {
                name: spec.name.clone(),
            })
        }
    }

    /// Provisions every configured queue in listing order; returns how many
    /// failed. Failures don't stop the walk, the installer decides whether
    /// they are fatal.
    pub fn provision_all(&self, specs: &[PrinterSpec]) -> usize {
        let mut failed = 0;
        for spec in specs {
            match self.create_queue(spec) {
                Ok(()) => success!("print queue '{}' created", spec.name),
                Err(err) => {
                    error!("could not provision queue '{}': {}", spec.name, err);
                    failed += 1;
                }
            }
        }
        failed
    }
}
