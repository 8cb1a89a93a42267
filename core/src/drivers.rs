//! Driver catalog lookup.
//!
//! `lpinfo --make-and-model <model> -m` lists every installed driver whose
//! make-and-model matches; each line is a driver path followed by its display
//! name. The configured driver pattern is then matched against the display
//! names and the first hit wins; catalog order is whatever the spooler
//! returned, deliberately not a ranking.

use pharos_common::error::CommandError;
use regex::Regex;
use tracing::{debug, warn};

use crate::command::CommandRunner;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DriverCatalogEntry {
    pub path: String,
    pub display_name: String,
}

/// Escapes the parenthesis characters a driver pattern may carry; they are
/// regex metacharacters in the matching step but literal text in driver
/// display names like "Foomatic (recommended)".
pub fn escape_driver_pattern(pattern: &str) -> String {
    pattern.replace('(', r"\(").replace(')', r"\)")
}

pub struct DriverCatalog<'r> {
    runner: &'r dyn CommandRunner,
}

impl<'r> DriverCatalog<'r> {
    pub fn new(runner: &'r dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Lists installed drivers matching a make-and-model string.
    ///
    /// Any query failure (spawn or nonzero exit) is an error; callers treat
    /// it as fatal for the printer being provisioned.
    pub fn query(&self, model: &str) -> Result<Vec<DriverCatalogEntry>, CommandError> {
        let out = self
            .runner
            .run("lpinfo", &["--make-and-model", model, "-m"])?
            .require_success("lpinfo")?;

        let entries: Vec<DriverCatalogEntry> =
            out.stdout.lines().filter_map(parse_catalog_line).collect();
        debug!("{} drivers returned for model '{}'", entries.len(), model);
        Ok(entries)
    }

    /// Resolves a driver for `model`: first catalog entry whose display name
    /// matches the (escaped) `pattern`.
    pub fn find(
        &self,
        model: &str,
        pattern: &str,
    ) -> Result<Option<DriverCatalogEntry>, CommandError> {
        let escaped = escape_driver_pattern(pattern);
        let matcher = match Regex::new(&escaped) {
            Ok(re) => re,
            Err(err) => {
                warn!("driver pattern '{}' is not a valid expression: {}", pattern, err);
                return Ok(None);
            }
        };

        for entry in self.query(model)? {
            if matcher.is_match(&entry.display_name) {
                debug!(
                    "driver '{}' at {} matches pattern '{}'",
                    entry.display_name, entry.path, pattern
                );
                return Ok(Some(entry));
            }
        }

        Ok(None)
    }
}

/// First whitespace-delimited token is the driver path, the remainder the
/// display name. Lines without both parts are skipped.
fn parse_catalog_line(line: &str) -> Option<DriverCatalogEntry> {
    let trimmed = line.trim();
    let (path, name) = trimmed.split_once(char::is_whitespace)?;
    let name = name.trim();
    if path.is_empty() || name.is_empty() {
        return None;
    }
    Some(DriverCatalogEntry {
        path: path.to_string(),
        display_name: name.to_string(),
    })
}
