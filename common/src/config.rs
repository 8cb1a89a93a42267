//! # Printer Configuration Model
//!
//! Parses the declarative `printers.conf` that ships alongside the installer.
//!
//! The file is INI-style: a `[Printers]` section carries a comma-separated
//! `printers` list, and every listed name has its own section describing the
//! queue:
//!
//! ```ini
//! [Printers]
//! printers = lab1, lab2
//!
//! [lab1]
//! driver = LaserJet
//! model = HP LaserJet 4000
//! lpdserver = printsrv
//! lpdqueue = q1
//! duplex = yes
//! make = HP
//! ```
//!
//! Required-field validation happens in the provisioner, not here, so an
//! incomplete section still parses into a [`PrinterSpec`] and fails later
//! without any spooler mutation.

use std::path::Path;

use config::{Config, File, FileFormat};
use serde::Deserialize;

use crate::error::ConfigError;

/// One print queue as declared in the configuration file.
///
/// `name` keeps the exact case used in the `printers` list; the config layer
/// lowercases section and key names, so section lookup goes through a
/// lowercased copy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrinterSpec {
    pub name: String,
    pub driver: Option<String>,
    pub model: Option<String>,
    pub lpd_server: Option<String>,
    pub lpd_queue: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub duplex: bool,
    pub make: Option<String>,
}

/// Raw section shape as it comes out of the INI parser.
#[derive(Debug, Deserialize)]
struct PrinterSection {
    driver: Option<String>,
    model: Option<String>,
    lpdserver: Option<String>,
    lpdqueue: Option<String>,
    location: Option<String>,
    description: Option<String>,
    duplex: Option<String>,
    make: Option<String>,
}

#[derive(Debug)]
pub struct PharosConfig {
    pub printers: Vec<PrinterSpec>,
}

impl PharosConfig {
    /// Loads and flattens the printer configuration.
    ///
    /// Listing order is preserved; the provisioner walks queues in the order
    /// they appear in the `printers` key.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let cfg = Config::builder()
            .add_source(File::from(path.to_path_buf()).format(FileFormat::Ini))
            .build()
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let listing = cfg
            .get_string("printers.printers")
            .or_else(|_| cfg.get_string("Printers.printers"))
            .map_err(|_| ConfigError::MissingPrinterList)?;

        let mut printers = Vec::new();
        for name in listing.split(',') {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }

            let section: PrinterSection = cfg
                .get(name)
                .or_else(|_| cfg.get(&name.to_lowercase()))
                .map_err(|_| ConfigError::MissingSection {
                    name: name.to_string(),
                })?;

            printers.push(PrinterSpec {
                name: name.to_string(),
                driver: section.driver,
                model: section.model,
                lpd_server: section.lpdserver,
                lpd_queue: section.lpdqueue,
                location: section.location,
                description: section.description,
                duplex: section.duplex.as_deref().is_some_and(truthy),
                make: section.make,
            });
        }

        Ok(Self { printers })
    }
}

/// INI boolean conventions; anything else is off.
fn truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "yes" | "true" | "on"
    )
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
