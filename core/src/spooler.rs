//! Printer registry adapter.
//!
//! Wraps the spooler CLI (`lpoptions`, `lpadmin`, `cupsaccept`, `cupsenable`,
//! `lpstat`) behind narrow, bool-returning operations. All scraping of
//! spooler output lives here; callers only ever see parsed results.
//!
//! Existence semantics follow the spooler's own reporting: a probe that
//! cannot be completed is "not confirmed" and reported as absent, so callers
//! must tolerate false negatives.

use std::fs;
use std::path::{Path, PathBuf};

use pharos_common::error::CommandError;
use tracing::{debug, info, warn};

use crate::command::CommandRunner;

/// Device-URI scheme claimed by this tool. Queues carrying it are ours to
/// delete on uninstall; everything else is off limits.
pub const PHAROS_URI_SCHEME: &str = "pharos://";

const UNKNOWN_PRINTER_MARKER: &str = "Unknown printer or class";

/// One queue as reported by `lpstat -v`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueListing {
    pub name: String,
    pub device_uri: String,
}

impl QueueListing {
    pub fn is_pharos(&self) -> bool {
        self.device_uri.starts_with(PHAROS_URI_SCHEME)
    }
}

/// Arguments for one queue-create invocation.
#[derive(Clone, Copy, Debug)]
pub struct CreateQueue<'a> {
    pub name: &'a str,
    pub device_uri: &'a str,
    pub driver_path: &'a str,
    pub location: Option<&'a str>,
    pub description: Option<&'a str>,
}

pub struct Spooler<'r> {
    runner: &'r dyn CommandRunner,
    ppd_dir: PathBuf,
}

impl<'r> Spooler<'r> {
    pub fn new(runner: &'r dyn CommandRunner) -> Self {
        Self {
            runner,
            ppd_dir: PathBuf::from("/etc/cups/ppd"),
        }
    }

    /// Overrides the directory holding installed PPDs (tests point this at a
    /// temp directory).
    pub fn with_ppd_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.ppd_dir = dir.into();
        self
    }

    /// Whether a queue with this name is registered.
    ///
    /// True only when the probe completed and did not report an unknown
    /// printer; a failed probe logs a warning and reports absent.
    pub fn exists(&self, name: &str) -> bool {
        let out = match self.runner.run("lpoptions", &["-d", name]) {
            Ok(out) => out,
            Err(err) => {
                warn!("could not check whether queue '{}' exists: {}", name, err);
                return false;
            }
        };

        if out.combined().contains(UNKNOWN_PRINTER_MARKER) {
            debug!("queue '{}' does not exist", name);
            return false;
        }
        if !out.success {
            warn!("existence probe for queue '{}' exited with {:?}", name, out.code);
            return false;
        }
        true
    }

    /// Removes a queue. Success means the queue is gone afterwards, not that
    /// the remove command exited zero; re-deleting an absent queue succeeds.
    pub fn delete(&self, name: &str) -> bool {
        if let Err(err) = self.runner.run("lpadmin", &["-x", name]) {
            warn!("could not run queue removal for '{}': {}", name, err);
            return false;
        }
        !self.exists(name)
    }

    /// Accepts jobs and enables the queue. Both steps must exit zero.
    pub fn enable(&self, name: &str) -> bool {
        for program in ["cupsaccept", "cupsenable"] {
            match self.runner.run(program, &[name]) {
                Ok(out) if out.success => {}
                Ok(out) => {
                    warn!("{} for queue '{}' exited with {:?}", program, name, out.code);
                    return false;
                }
                Err(err) => {
                    warn!("{} for queue '{}' failed: {}", program, name, err);
                    return false;
                }
            }
        }
        true
    }

    /// Issues the queue-create command. The final word on success is the
    /// existence re-check done by the caller, so a failed command is only
    /// logged here.
    pub fn create(&self, req: &CreateQueue<'_>) -> bool {
        let mut args: Vec<&str> = vec![
            "-E",
            "-p",
            req.name,
            "-v",
            req.device_uri,
            "-m",
            req.driver_path,
        ];
        if let Some(location) = req.location {
            args.push("-L");
            args.push(location);
        }
        if let Some(description) = req.description {
            args.push("-D");
            args.push(description);
        }

        match self.runner.run("lpadmin", &args) {
            Ok(out) if out.success => true,
            Ok(out) => {
                warn!("queue create for '{}' exited with {:?}: {}", req.name, out.code, out.stderr);
                false
            }
            Err(err) => {
                warn!("queue create for '{}' failed: {}", req.name, err);
                false
            }
        }
    }

    /// Configures double-sided printing.
    ///
    /// Always issues the generic duplex default; for HP printers the
    /// installed PPD additionally gets its duplex directives rewritten (the
    /// HP description files ship with duplex off even on duplex-capable
    /// units).
    pub fn set_duplex(&self, name: &str, make: Option<&str>) -> bool {
        let mut ok = true;

        if make.is_some_and(|m| m.eq_ignore_ascii_case("hp")) {
            ok &= self.patch_hp_ppd(name);
        }

        match self.runner.run("lpadmin", &["-p", name, "-o", "Duplex=DuplexNoTumble"]) {
            Ok(out) if out.success => {}
            Ok(out) => {
                warn!("duplex option for queue '{}' exited with {:?}", name, out.code);
                ok = false;
            }
            Err(err) => {
                warn!("duplex option for queue '{}' failed: {}", name, err);
                ok = false;
            }
        }

        ok
    }

    /// Every registered queue with its device URI.
    pub fn queues(&self) -> Result<Vec<QueueListing>, CommandError> {
        let out = self
            .runner
            .run("lpstat", &["-v"])?
            .require_success("lpstat")?;
        Ok(out.stdout.lines().filter_map(parse_lpstat_line).collect())
    }

    fn patch_hp_ppd(&self, name: &str) -> bool {
        let path = self.ppd_dir.join(format!("{name}.ppd"));
        match patch_duplex_directives(&path) {
            Ok(true) => {
                info!("patched duplex defaults in {}", path.display());
                true
            }
            Ok(false) => {
                debug!("no duplex directives to patch in {}", path.display());
                true
            }
            Err(err) => {
                warn!("could not patch {}: {}", path.display(), err);
                false
            }
        }
    }
}

/// Rewrites the two known duplex directive lines in a PPD. Returns whether
/// anything changed.
fn patch_duplex_directives(path: &Path) -> std::io::Result<bool> {
    let content = fs::read_to_string(path)?;
    let patched = content
        .replace("*DefaultDuplex: None", "*DefaultDuplex: DuplexNoTumble")
        .replace("*DefaultOptionDuplex: False", "*DefaultOptionDuplex: True");

    if patched == content {
        return Ok(false);
    }
    fs::write(path, patched)?;
    Ok(true)
}

/// `lpstat -v` lines look like `device for lab1: pharos://printsrv/q1`.
fn parse_lpstat_line(line: &str) -> Option<QueueListing> {
    let rest = line.strip_prefix("device for ")?;
    let (name, uri) = rest.split_once(':')?;
    Some(QueueListing {
        name: name.trim().to_string(),
        device_uri: uri.trim().to_string(),
    })
}
