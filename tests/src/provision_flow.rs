#![cfg(test)]
//! End-to-end provisioning: configuration file in, spooler commands out.

use std::io::Write;

use pharos_common::config::PharosConfig;
use pharos_core::provision::Provisioner;
use pharos_core::testing::FakeRunner;

const CATALOG: &str = "/drv/hp4000.ppd HP LaserJet 4000 Foomatic/LaserJet\n";

const LAB1_CONF: &str = "\
[Printers]
printers = lab1

[lab1]
driver = LaserJet
model = HP LaserJet 4000
lpdserver = printsrv
lpdqueue = q1
";

fn load_config(content: &str) -> PharosConfig {
    let mut file = tempfile::Builder::new()
        .suffix(".conf")
        .tempfile()
        .expect("temp config");
    file.write_all(content.as_bytes()).expect("write config");
    PharosConfig::load(file.path()).expect("config loads")
}

fn unknown(name: &str) -> String {
    format!("lpoptions: Unknown printer or class \"{name}\".")
}

/// A configured LaserJet against a catalog carrying its driver ends up as a
/// queue on the pharos transport, driven by the matched PPD.
#[test]
fn configured_printer_becomes_a_pharos_queue() {
    let config = load_config(LAB1_CONF);

    let runner = FakeRunner::new();
    runner.on_program("lpinfo", FakeRunner::ok(CATALOG));
    runner.on_line_seq(
        "lpoptions -d lab1",
        vec![
            FakeRunner::failing(&unknown("lab1")),
            FakeRunner::ok("device for lab1: pharos://printsrv/q1"),
        ],
    );

    let provisioner = Provisioner::new(&runner, "/tmp");
    let failed = provisioner.provision_all(&config.printers);

    assert_eq!(failed, 0);
    assert_eq!(
        runner.lines_for("lpadmin"),
        vec!["lpadmin -E -p lab1 -v pharos://printsrv/q1 -m /drv/hp4000.ppd"]
    );
    assert_eq!(
        runner.lines_for("cupsaccept"),
        vec!["cupsaccept lab1"]
    );
    assert_eq!(
        runner.lines_for("cupsenable"),
        vec!["cupsenable lab1"]
    );
}

/// Same configuration, but the catalog has nothing matching the driver
/// pattern: provisioning fails and no queue is created.
#[test]
fn unmatched_driver_leaves_no_queue_behind() {
    let config = load_config(&LAB1_CONF.replace("LaserJet\n", "Ricoh Aficio\n"));

    let runner = FakeRunner::new();
    runner.on_program("lpinfo", FakeRunner::ok(CATALOG));
    runner.on_program("lpoptions", FakeRunner::failing(&unknown("lab1")));

    let provisioner = Provisioner::new(&runner, "/tmp");
    let failed = provisioner.provision_all(&config.printers);

    assert_eq!(failed, 1);
    assert!(runner.lines_for("lpadmin").is_empty());
}

/// Provisioning the same spec twice converges on an existing queue: the
/// second pass deletes the stale queue and recreates it instead of erroring.
#[test]
fn provisioning_twice_recreates_the_queue() {
    let config = load_config(LAB1_CONF);
    let spec = &config.printers[0];

    let runner = FakeRunner::new();
    runner.on_program("lpinfo", FakeRunner::ok(CATALOG));
    runner.on_line_seq(
        "lpoptions -d lab1",
        vec![
            // First pass: absent before create, present after.
            FakeRunner::failing(&unknown("lab1")),
            FakeRunner::ok("device for lab1: pharos://printsrv/q1"),
            // Second pass: present, gone once deleted, present again.
            FakeRunner::ok("device for lab1: pharos://printsrv/q1"),
            FakeRunner::failing(&unknown("lab1")),
            FakeRunner::ok("device for lab1: pharos://printsrv/q1"),
        ],
    );

    let provisioner = Provisioner::new(&runner, "/tmp");
    provisioner.create_queue(spec).expect("first pass");
    provisioner.create_queue(spec).expect("second pass");

    assert_eq!(
        runner.lines_for("lpadmin"),
        vec![
            "lpadmin -E -p lab1 -v pharos://printsrv/q1 -m /drv/hp4000.ppd",
            "lpadmin -x lab1",
            "lpadmin -E -p lab1 -v pharos://printsrv/q1 -m /drv/hp4000.ppd",
        ]
    );
}

/// Optional location/description flow through to the create command, and a
/// duplex HP printer gets its PPD patched alongside the generic option.
#[test]
fn duplex_hp_printer_gets_both_treatments() {
    let config = load_config(
        "[Printers]\n\
         printers = lab1\n\
         [lab1]\n\
         driver = LaserJet\n\
         model = HP LaserJet 4000\n\
         lpdserver = printsrv\n\
         lpdqueue = q1\n\
         location = Library\n\
         description = Release station\n\
         duplex = yes\n\
         make = HP\n",
    );

    let ppd_dir = tempfile::tempdir().expect("ppd dir");
    std::fs::write(
        ppd_dir.path().join("lab1.ppd"),
        "*DefaultDuplex: None\n*DefaultOptionDuplex: False\n",
    )
    .expect("seed ppd");

    let runner = FakeRunner::new();
    runner.on_program("lpinfo", FakeRunner::ok(CATALOG));
    runner.on_line_seq(
        "lpoptions -d lab1",
        vec![
            FakeRunner::failing(&unknown("lab1")),
            FakeRunner::ok("device for lab1: pharos://printsrv/q1"),
        ],
    );

    let provisioner = Provisioner::new(&runner, ppd_dir.path());
    provisioner
        .create_queue(&config.printers[0])
        .expect("queue created");

    assert_eq!(
        runner.lines_for("lpadmin"),
        vec![
            "lpadmin -E -p lab1 -v pharos://printsrv/q1 -m /drv/hp4000.ppd \
             -L Library -D Release station",
            "lpadmin -p lab1 -o Duplex=DuplexNoTumble",
        ]
    );

    let ppd = std::fs::read_to_string(ppd_dir.path().join("lab1.ppd")).expect("read ppd");
    assert!(ppd.contains("*DefaultDuplex: DuplexNoTumble"));
    assert!(ppd.contains("*DefaultOptionDuplex: True"));
}
