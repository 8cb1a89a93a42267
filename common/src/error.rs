//! Error kinds shared across the workspace.
//!
//! The original tooling in this space tends to collapse every failure into a
//! logged boolean; these enums keep the failure *kind* available to the
//! orchestrators so they can decide between fail-fast and best-effort paths.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// An external program could not deliver a usable result.
///
/// Most spooler commands are probed for their output or re-checked
/// afterwards, so a nonzero exit is interpreted by the caller; `Failed` only
/// appears where the caller explicitly demanded a zero exit.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {code:?}: {stderr}")]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read printer configuration {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        #[source]
        source: config::ConfigError,
    },

    #[error("configuration has no printers list under [Printers]")]
    MissingPrinterList,

    #[error("printer '{name}' is listed but has no configuration section")]
    MissingSection { name: String },
}

/// One failed attempt at materializing a print queue.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("required field '{field}' is missing for printer '{printer}'")]
    MissingField {
        printer: String,
        field: &'static str,
    },

    #[error("driver catalog query failed for printer '{printer}': {source}")]
    CatalogQuery {
        printer: String,
        #[source]
        source: CommandError,
    },

    #[error("no installed driver matches '{pattern}' for printer '{printer}'")]
    DriverNotFound { printer: String, pattern: String },

    #[error("queue '{name}' already exists and could not be deleted")]
    DeleteFailed { name: String },

    #[error("queue '{name}' does not exist after creation")]
    NotCreated { name: String },
}

/// A fatal installation failure; every variant is answered with a full
/// uninstall pass before the process exits nonzero.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("missing prerequisite: {0}")]
    MissingPrerequisite(String),

    #[error("license agreement was declined")]
    EulaDeclined,

    #[error("aborted: no driver available for printer '{printer}'")]
    DriverMissing { printer: String },

    #[error("deploying {what}: {source}")]
    Deploy {
        what: String,
        #[source]
        source: io::Error,
    },

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{failed} print queue(s) could not be provisioned")]
    Provision { failed: usize },
}
