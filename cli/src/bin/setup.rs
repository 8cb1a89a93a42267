use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use pharos_cli::prompts::InquirePrompter;
use pharos_cli::terminal::{logging, print, spinner};
use pharos_common::error::InstallError;
use pharos_core::command::SystemRunner;
use pharos_core::deploy::InstallLayout;
use pharos_core::desktop::Autostart;
use pharos_core::install::Installer;
use pharos_core::uninstall::Uninstaller;
use tracing::error;

const LOG_FILE: &str = "pharos-linux.log";

/// Installs Pharos remote printing: spooler backend, popup server, session
/// autostart, and the configured print queues.
#[derive(Parser)]
#[command(name = "pharos-setup", about = "Install Pharos remote printing.", version)]
struct CommandLine {}

fn main() -> ExitCode {
    let _args = CommandLine::parse();

    if !is_root::is_root() {
        eprintln!("pharos-setup must be run as root");
        return ExitCode::FAILURE;
    }

    if let Err(err) = logging::init(Path::new(LOG_FILE)) {
        eprintln!("cannot open log file {LOG_FILE}: {err}");
        return ExitCode::FAILURE;
    }

    print::banner("PHAROS SETUP");

    let runner = SystemRunner;
    let layout = InstallLayout::system();
    let package_dir = package_dir();
    let autostart = Autostart::system(layout.popup_exec());

    let installer = Installer::new(&runner, layout.clone(), package_dir, autostart);

    let handle = spinner::get_spinner();
    handle.set_message("Installing Pharos remote printing...".to_string());
    let result = installer.run(&InquirePrompter);
    handle.finish_and_clear();

    match result {
        Ok(()) => {
            print::fat_separator();
            print::centerln("Pharos remote printing is installed");
            ExitCode::SUCCESS
        }
        Err(InstallError::EulaDeclined) => {
            // Nothing has touched the system yet; no rollback needed.
            error!("installation aborted: license agreement declined");
            ExitCode::FAILURE
        }
        Err(err) => {
            error!("installation failed: {err}");
            error!("rolling the installation back");
            let autostart = Autostart::system(layout.popup_exec());
            Uninstaller::new(&runner, layout, autostart).run();
            ExitCode::FAILURE
        }
    }
}

/// The package directory carrying the payload files: where the setup binary
/// itself lives, falling back to the invocation directory.
fn package_dir() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}
