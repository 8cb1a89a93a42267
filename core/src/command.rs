//! The single seam through which external programs are invoked.
//!
//! Everything this tool knows about the system it is installing onto comes
//! from the textual output of CLI tools (`lpadmin`, `lpinfo`, `ps`, ...).
//! Components depend on the [`CommandRunner`] abstraction rather than
//! `std::process` directly, so tests can substitute scripted output for the
//! real spooler.

use std::process::Command;

use pharos_common::error::CommandError;
use tracing::debug;

/// Captured result of one external command.
#[derive(Clone, Debug)]
pub struct CmdOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CmdOutput {
    /// Stdout and stderr glued together, for probes that scan either stream.
    pub fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }

    /// Turns a nonzero exit into a [`CommandError::Failed`].
    pub fn require_success(self, program: &str) -> Result<Self, CommandError> {
        if self.success {
            Ok(self)
        } else {
            Err(CommandError::Failed {
                program: program.to_string(),
                code: self.code,
                stderr: self.stderr,
            })
        }
    }
}

pub trait CommandRunner {
    /// Runs `program` to completion and captures its output.
    ///
    /// A nonzero exit status is NOT an error at this level; only a failure
    /// to spawn the process is.
    fn run(&self, program: &str, args: &[&str]) -> Result<CmdOutput, CommandError>;
}

/// Production runner over `std::process::Command`.
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CmdOutput, CommandError> {
        debug!("running {} {:?}", program, args);

        let out = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| CommandError::Spawn {
                program: program.to_string(),
                source,
            })?;

        Ok(CmdOutput {
            success: out.status.success(),
            code: out.status.code(),
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        })
    }
}
