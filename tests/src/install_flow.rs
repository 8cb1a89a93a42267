#![cfg(test)]
//! End-to-end installation runs against a re-rooted filesystem layout and a
//! scripted spooler.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use pharos_common::error::InstallError;
use pharos_core::deploy::InstallLayout;
use pharos_core::desktop::Autostart;
use pharos_core::install::{Installer, Prompter};
use pharos_core::testing::FakeRunner;

const CATALOG: &str = "/drv/hp4000.ppd HP LaserJet 4000 Foomatic/LaserJet\n";

const PS_DESKTOP: &str = "\
  PID TTY      STAT   TIME COMMAND\n\
  842 ?        Ssl    0:00 /usr/sbin/cupsd -l\n\
  900 ?        Ssl    0:04 /usr/libexec/gnome-session-binary\n";

const LAB1_CONF: &str = "\
[Printers]
printers = lab1

[lab1]
driver = LaserJet
model = HP LaserJet 4000
lpdserver = printsrv
lpdqueue = q1
";

struct ScriptedPrompter {
    accept_eula: bool,
    continue_without_driver: bool,
    eula_seen: RefCell<Option<String>>,
    drivers_asked: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    fn accepting() -> Self {
        Self {
            accept_eula: true,
            continue_without_driver: true,
            eula_seen: RefCell::new(None),
            drivers_asked: RefCell::new(Vec::new()),
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm_eula(&self, eula: Option<&str>) -> bool {
        *self.eula_seen.borrow_mut() = eula.map(str::to_string);
        self.accept_eula
    }

    fn confirm_missing_driver(&self, printer: &str) -> bool {
        self.drivers_asked.borrow_mut().push(printer.to_string());
        self.continue_without_driver
    }
}

struct Fixture {
    _root: tempfile::TempDir,
    layout: InstallLayout,
    package_dir: PathBuf,
    homes: Vec<PathBuf>,
}

/// A system with CUPS running, a GNOME session, and a complete package
/// directory.
fn fixture() -> Fixture {
    let root = tempfile::tempdir().expect("tempdir");
    let layout = InstallLayout::rooted(root.path());
    fs::create_dir_all(&layout.backend_dir).expect("backend dir");

    let package_dir = root.path().join("package");
    fs::create_dir_all(&package_dir).expect("package dir");
    for (name, content) in [
        ("pharos", "#!backend"),
        ("pharospopup", "#!popup"),
        ("pharos.conf", "popupserver=localhost\n"),
        ("printers.conf", LAB1_CONF),
        ("uninstall-pharos", "#!uninstaller"),
        ("eula.txt", "You agree to release your prints.\n"),
    ] {
        fs::write(package_dir.join(name), content).expect("payload");
    }

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
        package_dir,
        homes,
    }
}

fn scripted_runner() -> FakeRunner {
    let runner = FakeRunner::new();
    runner.on_program("ps", FakeRunner::ok(PS_DESKTOP));
    runner.on_program("lpinfo", FakeRunner::ok(CATALOG));
    runner.on_line_seq(
        "lpoptions -d lab1",
        vec![
            FakeRunner::failing("lpoptions: Unknown printer or class \"lab1\"."),
            FakeRunner::ok("device for lab1: pharos://printsrv/q1"),
        ],
    );
    runner
}

fn installer<'r>(fx: &Fixture, runner: &'r FakeRunner) -> Installer<'r> {
    let autostart = Autostart::new(fx.homes.clone(), fx.layout.popup_exec());
    Installer::new(runner, fx.layout.clone(), fx.package_dir.clone(), autostart)
}

fn gnome_entry(home: &Path) -> PathBuf {
    home.join(".config/autostart/pharospopup.desktop")
}

#[test]
fn full_install_deploys_everything() {
    let fx = fixture();
    let runner = scripted_runner();
    let prompter = ScriptedPrompter::accepting();

    installer(&fx, &runner).run(&prompter).expect("install succeeds");

    // The operator saw the shipped license text.
    assert_eq!(
        prompter.eula_seen.borrow().as_deref(),
        Some("You agree to release your prints.\n")
    );
    assert!(prompter.drivers_asked.borrow().is_empty());

    assert!(fx.layout.backend_path().is_file());
    assert!(fx.layout.popup_exec().is_file());
    assert!(fx.layout.popup_config().is_file());
    assert!(fx.layout.uninstaller_path().is_file());
    assert!(fx.layout.log_dir.is_dir());

    // GNOME was detected, so every home got a desktop entry.
    for home in &fx.homes {
        let entry = fs::read_to_string(gnome_entry(home)).expect("autostart entry");
        assert!(entry.contains(&format!("Exec={}", fx.layout.popup_exec().display())));
    }

    // The configured queue was created on the pharos transport.
    assert!(
        runner
            .lines_for("lpadmin")
            .contains(&"lpadmin -E -p lab1 -v pharos://printsrv/q1 -m /drv/hp4000.ppd".to_string())
    );
}

#[test]
fn declined_eula_aborts_before_deployment() {
    let fx = fixture();
    let runner = scripted_runner();
    let prompter = ScriptedPrompter {
        accept_eula: false,
        ..ScriptedPrompter::accepting()
    };

    let err = installer(&fx, &runner).run(&prompter).unwrap_err();
    assert!(matches!(err, InstallError::EulaDeclined));

    assert!(!fx.layout.backend_path().exists());
    assert!(!fx.layout.popup_exec().exists());
    assert!(runner.lines_for("lpadmin").is_empty());
}

#[test]
fn missing_cups_is_a_prerequisite_failure() {
    let fx = fixture();
    let runner = FakeRunner::new();
    runner.on_program("ps", FakeRunner::ok("  PID TTY STAT TIME COMMAND\n"));

    let err = installer(&fx, &runner)
        .run(&ScriptedPrompter::accepting())
        .unwrap_err();
    assert!(matches!(err, InstallError::MissingPrerequisite(_)));
    assert!(!fx.layout.backend_path().exists());
}

#[test]
fn missing_driver_aborts_when_declined() {
    let fx = fixture();
    let runner = scripted_runner();
    // Catalog no longer matches the configured pattern.
    runner.on_program("lpinfo", FakeRunner::ok("/drv/generic.ppd Generic PCL Laser\n"));

    let prompter = ScriptedPrompter {
        continue_without_driver: false,
        ..ScriptedPrompter::accepting()
    };

    let err = installer(&fx, &runner).run(&prompter).unwrap_err();
    assert!(matches!(err, InstallError::DriverMissing { printer } if printer == "lab1"));
    assert!(!fx.layout.backend_path().exists());
}

#[test]
fn missing_driver_skips_the_printer_when_confirmed() {
    let fx = fixture();
    let runner = scripted_runner();
    runner.on_program("lpinfo", FakeRunner::ok("/drv/generic.ppd Generic PCL Laser\n"));

    let prompter = ScriptedPrompter::accepting();
    installer(&fx, &runner).run(&prompter).expect("install succeeds");

    assert_eq!(prompter.drivers_asked.borrow().as_slice(), ["lab1"]);
    // The skipped printer was never provisioned, the rest deployed anyway.
    assert!(runner.lines_for("lpadmin").is_empty());
    assert!(fx.layout.backend_path().is_file());
    assert!(fx.layout.uninstaller_path().is_file());
}

#[test]
fn incomplete_package_is_a_prerequisite_failure() {
    let fx = fixture();
    fs::remove_file(fx.package_dir.join("pharospopup")).expect("drop payload");

    let runner = scripted_runner();
    let err = installer(&fx, &runner)
        .run(&ScriptedPrompter::accepting())
        .unwrap_err();
    assert!(matches!(err, InstallError::MissingPrerequisite(msg) if msg.contains("pharospopup")));
}
