use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use pharos_cli::terminal::{logging, print};
use pharos_core::command::SystemRunner;
use pharos_core::deploy::InstallLayout;
use pharos_core::desktop::Autostart;
use pharos_core::uninstall::Uninstaller;

const LOG_FILE: &str = "/tmp/pharos-uninstall.log";

/// Removes Pharos remote printing: every pharos:// print queue, the spooler
/// backend, the popup server, and all session autostart entries.
#[derive(Parser)]
#[command(name = "uninstall-pharos", about = "Remove Pharos remote printing.", version)]
struct CommandLine {}

fn main() -> ExitCode {
    let _args = CommandLine::parse();

    if !is_root::is_root() {
        eprintln!("uninstall-pharos must be run as root");
        return ExitCode::FAILURE;
    }

    if let Err(err) = logging::init(Path::new(LOG_FILE)) {
        eprintln!("cannot open log file {LOG_FILE}: {err}");
        return ExitCode::FAILURE;
    }

    print::banner("PHAROS UNINSTALL");

    let runner = SystemRunner;
    let layout = InstallLayout::system();
    let autostart = Autostart::system(layout.popup_exec());

    let report = Uninstaller::new(&runner, layout, autostart).run();

    print::header("summary");
    print::phase_line("print queues", report.queues);
    print::phase_line("spooler backend", report.backend);
    print::phase_line("popup server", report.popup);
    print::phase_line("session autostart", report.autostart);
    print::phase_line("log directory", report.logs);
    print::phase_line("uninstaller", report.uninstaller);
    print::fat_separator();

    if report.all_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
