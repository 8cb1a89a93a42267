use std::sync::OnceLock;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

pub struct SpinnerHandle {
    spinner: ProgressBar,
}

impl SpinnerHandle {
    pub fn set_message(&self, msg: String) {
        self.spinner.set_message(msg);
    }

    pub fn println(&self, msg: &str) {
        self.spinner.println(msg);
    }

    pub fn finish_and_clear(&self) {
        self.spinner.finish_and_clear();
    }

    /// Hides the spinner while `f` runs; interactive prompts go through
    /// here so the bar doesn't redraw over them.
    pub fn suspend<T>(&self, f: impl FnOnce() -> T) -> T {
        self.spinner.suspend(f)
    }
}

static SPINNER: OnceLock<SpinnerHandle> = OnceLock::new();

/// Starts (or reuses) the process-wide spinner.
pub fn get_spinner() -> &'static SpinnerHandle {
    SPINNER.get_or_init(init_spinner)
}

/// The spinner, if one has been started. Logging uses this so that binaries
/// that never spin (the uninstaller) don't get one created for them.
pub fn active_spinner() -> Option<&'static SpinnerHandle> {
    SPINNER.get()
}

fn init_spinner() -> SpinnerHandle {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.blue} {msg}")
        .unwrap()
        .tick_strings(&[
            "▁▁▁▁▁",
            "▁▂▂▂▁",
            "▁▄▂▄▁",
            "▂▄▆▄▂",
            "▄▆█▆▄",
            "▂▄▆▄▂",
            "▁▄▂▄▁",
            "▁▂▂▂▁",
        ]);

    pb.set_style(style);
    pb.enable_steady_tick(Duration::from_millis(100));

    SpinnerHandle { spinner: pb }
}

/// Routes console log lines through the active spinner, which repaints
/// itself below them; without a spinner the lines go straight to stdout.
pub struct SpinnerWriter;

impl std::io::Write for SpinnerWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let msg = String::from_utf8_lossy(buf);
        let msg = msg.trim_end();
        match active_spinner() {
            Some(spinner) => spinner.println(msg),
            None => println!("{msg}"),
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
