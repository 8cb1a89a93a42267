use inquire::Confirm;
use pharos_core::install::Prompter;

use crate::terminal::spinner;

/// Interactive prompts over inquire, spinner-aware: the progress bar is
/// hidden while a question is on screen.
pub struct InquirePrompter;

impl InquirePrompter {
    fn suspended<T>(&self, f: impl FnOnce() -> T) -> T {
        match spinner::active_spinner() {
            Some(handle) => handle.suspend(f),
            None => f(),
        }
    }
}

impl Prompter for InquirePrompter {
    fn confirm_eula(&self, eula: Option<&str>) -> bool {
        self.suspended(|| {
            if let Some(text) = eula {
                println!();
                for line in text.lines() {
                    println!("  {line}");
                }
                println!();
            }
            Confirm::new("Do you accept the license agreement?")
                .with_default(false)
                .prompt()
                .unwrap_or(false)
        })
    }

    fn confirm_missing_driver(&self, printer: &str) -> bool {
        self.suspended(|| {
            Confirm::new(&format!(
                "No driver is installed for printer '{printer}'. Continue without it?"
            ))
            .with_default(false)
            .prompt()
            .unwrap_or(false)
        })
    }
}
