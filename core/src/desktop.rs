//! Desktop-session autostart wiring.
//!
//! The popup server has to come up with every user session, so the installer
//! drops a freedesktop autostart entry (GNOME) or an Autostart symlink (KDE)
//! into every profile root: each directory under `/home`, `/root`, and the
//! `/etc/skel` skeleton so future accounts inherit it.

use std::fs;
use std::io;
use std::os::unix::fs as unix_fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::deploy::{POPUP_FILE, remove_file_if_present};
use crate::process::DesktopSession;

const GNOME_AUTOSTART_DIR: &str = ".config/autostart";
const KDE_AUTOSTART_DIR: &str = ".kde/Autostart";

fn desktop_entry(popup_exec: &Path) -> String {
    format!(
        "[Desktop Entry]\n\
         Type=Application\n\
         Name=Pharos Popup\n\
         Comment=Pharos print release notifications\n\
         Exec={}\n\
         Hidden=false\n\
         NoDisplay=false\n\
         X-GNOME-Autostart-enabled=true\n",
        popup_exec.display()
    )
}

pub struct Autostart {
    roots: Vec<PathBuf>,
    popup_exec: PathBuf,
}

impl Autostart {
    pub fn new(roots: Vec<PathBuf>, popup_exec: PathBuf) -> Self {
        Self { roots, popup_exec }
    }

    /// Autostart manager over the real profile roots.
    pub fn system(popup_exec: PathBuf) -> Self {
        Self::new(system_profile_roots(), popup_exec)
    }

    /// Registers the popup server for the detected session flavor in every
    /// profile root. Unknown sessions are the caller's problem (warn and
    /// print manual instructions); passing one here is a no-op.
    pub fn register(&self, session: DesktopSession) -> io::Result<()> {
        for root in &self.roots {
            if !root.is_dir() {
                debug!("skipping absent profile root {}", root.display());
                continue;
            }
            match session {
                DesktopSession::Gnome => self.write_gnome_entry(root)?,
                DesktopSession::Kde => self.link_kde_entry(root)?,
                DesktopSession::Unknown => {}
            }
        }
        Ok(())
    }

    /// Removes the autostart entries for the detected session flavor from
    /// every profile root. When the session cannot be determined both
    /// flavors are swept. Best effort; returns whether every removal
    /// succeeded.
    pub fn remove(&self, session: DesktopSession) -> bool {
        let mut ok = true;
        for root in &self.roots {
            match session {
                DesktopSession::Gnome => ok &= remove_file_if_present(&gnome_entry_path(root)),
                DesktopSession::Kde => ok &= remove_file_if_present(&kde_entry_path(root)),
                DesktopSession::Unknown => {
                    ok &= remove_file_if_present(&gnome_entry_path(root));
                    ok &= remove_file_if_present(&kde_entry_path(root));
                }
            }
        }
        ok
    }

    fn write_gnome_entry(&self, root: &Path) -> io::Result<()> {
        let path = gnome_entry_path(root);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, desktop_entry(&self.popup_exec))?;
        info!("autostart entry written to {}", path.display());
        Ok(())
    }

    fn link_kde_entry(&self, root: &Path) -> io::Result<()> {
        let path = kde_entry_path(root);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Replace a stale link from an earlier install.
        if path.symlink_metadata().is_ok() {
            fs::remove_file(&path)?;
        }
        unix_fs::symlink(&self.popup_exec, &path)?;
        info!("autostart link created at {}", path.display());
        Ok(())
    }
}

fn gnome_entry_path(root: &Path) -> PathBuf {
    root.join(GNOME_AUTOSTART_DIR).join(format!("{POPUP_FILE}.desktop"))
}

fn kde_entry_path(root: &Path) -> PathBuf {
    root.join(KDE_AUTOSTART_DIR).join(POPUP_FILE)
}

/// Every directory under `/home`, plus root's home and the account skeleton.
fn system_profile_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    if let Ok(entries) = fs::read_dir("/home") {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                roots.push(path);
            }
        }
    }
    roots.push(PathBuf::from("/root"));
    roots.push(PathBuf::from("/etc/skel"));
    roots
}
