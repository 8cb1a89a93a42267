#![cfg(test)]
//! End-to-end uninstallation: only pharos-owned state is removed, and every
//! phase runs even when an earlier one fails.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use pharos_core::deploy::InstallLayout;
use pharos_core::desktop::Autostart;
use pharos_core::process::DesktopSession;
use pharos_core::testing::FakeRunner;
use pharos_core::uninstall::Uninstaller;

const LPSTAT_MIXED: &str = "\
device for lab1: pharos://printsrv/q1\n\
device for lab2: pharos://printsrv/q2\n\
device for office: socket://10.0.0.7:9100\n";

struct Fixture {
    _root: tempfile::TempDir,
    layout: InstallLayout,
    homes: Vec<PathBuf>,
}

/// A system that looks like a finished installation.
fn installed_fixture() -> Fixture {
    let root = tempfile::tempdir().expect("tempdir");
    let layout = InstallLayout::rooted(root.path());

    fs::create_dir_all(&layout.backend_dir).expect("backend dir");
    fs::create_dir_all(&layout.bin_dir).expect("bin dir");
    fs::create_dir_all(&layout.etc_dir).expect("etc dir");
    fs::create_dir_all(&layout.log_dir).expect("log dir");

    fs::write(layout.backend_path(), "#!backend").expect("backend");
    fs::write(layout.popup_exec(), "#!popup").expect("popup");
    fs::write(layout.popup_config(), "cfg").expect("popup conf");
    fs::write(layout.uninstaller_path(), "#!uninstaller").expect("uninstaller");
    fs::write(layout.log_dir.join("popup.log"), "old").expect("log file");

    let homes: Vec<PathBuf> = ["alice", "bob"]
        .iter()
        .map(|name| {
            let home = root.path().join("home").join(name);
            fs::create_dir_all(&home).expect("home dir");
            home
        })
        .collect();

    Fixture {
        _root: root,
        layout,
        homes,
    }
}

fn autostart(fx: &Fixture) -> Autostart {
    Autostart::new(fx.homes.clone(), fx.layout.popup_exec())
}

fn unknown(name: &str) -> String {
    format!("lpoptions: Unknown printer or class \"{name}\".")
}

#[test]
fn only_pharos_queues_are_deleted() {
    let fx = installed_fixture();
    let runner = FakeRunner::new();
    runner.on_program("ps", FakeRunner::ok("  PID TTY STAT TIME COMMAND\n"));
    runner.on_line("lpstat -v", FakeRunner::ok(LPSTAT_MIXED));
    // Once deleted, both pharos queues probe as unknown.
    runner.on_line("lpoptions -d lab1", FakeRunner::failing(&unknown("lab1")));
    runner.on_line("lpoptions -d lab2", FakeRunner::failing(&unknown("lab2")));

    let report = Uninstaller::new(&runner, fx.layout.clone(), autostart(&fx)).run();

    assert!(report.queues);
    assert_eq!(
        runner.lines_for("lpadmin"),
        vec!["lpadmin -x lab1", "lpadmin -x lab2"]
    );
}

#[test]
fn full_pass_sweeps_files_and_autostart() {
    let fx = installed_fixture();
    let links = autostart(&fx);
    links.register(DesktopSession::Gnome).expect("gnome entries");
    links.register(DesktopSession::Kde).expect("kde links");

    let runner = FakeRunner::new();
    runner.on_program("ps", FakeRunner::ok("  PID TTY STAT TIME COMMAND\n"));
    runner.on_line("lpstat -v", FakeRunner::ok(""));

    let report = Uninstaller::new(&runner, fx.layout.clone(), autostart(&fx)).run();

    assert!(report.all_ok(), "unexpected failures: {report:?}");
    assert!(!fx.layout.backend_path().exists());
    assert!(!fx.layout.popup_exec().exists());
    assert!(!fx.layout.popup_config().exists());
    assert!(!fx.layout.uninstaller_path().exists());
    assert!(!fx.layout.log_dir.exists());
    for home in &fx.homes {
        assert!(!home.join(".config/autostart/pharospopup.desktop").exists());
        assert!(
            home.join(".kde/Autostart/pharospopup")
                .symlink_metadata()
                .is_err()
        );
    }
}

#[test]
fn running_popup_is_terminated_before_removal() {
    let fx = installed_fixture();
    let runner = FakeRunner::new();
    runner.on_line("lpstat -v", FakeRunner::ok(""));
    runner.on_program("pgrep", FakeRunner::ok("1301\n"));
    // Session detection scans the process list twice, the popup check a
    // third time; only after the signal is the popup gone.
    let alive = " 1301 ?  Sl  0:02 /usr/local/bin/pharospopup\n";
    runner.on_line_seq(
        "ps ax",
        vec![
            FakeRunner::ok(alive),
            FakeRunner::ok(alive),
            FakeRunner::ok(alive),
            FakeRunner::ok("  PID TTY STAT TIME COMMAND\n"),
        ],
    );

    let report = Uninstaller::new(&runner, fx.layout.clone(), autostart(&fx))
        .with_kill_grace(Duration::from_millis(0))
        .run();

    assert!(report.popup);
    assert_eq!(runner.lines_for("kill"), vec!["kill 1301"]);
}

#[test]
fn queue_listing_failure_does_not_stop_the_sweep() {
    let fx = installed_fixture();
    let runner = FakeRunner::new();
    runner.on_program("ps", FakeRunner::ok("  PID TTY STAT TIME COMMAND\n"));
    runner.refuse_program("lpstat");

    let report = Uninstaller::new(&runner, fx.layout.clone(), autostart(&fx)).run();

    assert!(!report.queues);
    assert!(!report.all_ok());
    // Later phases still ran.
    assert!(report.backend);
    assert!(!fx.layout.backend_path().exists());
    assert!(report.logs);
    assert!(!fx.layout.log_dir.exists());
}
