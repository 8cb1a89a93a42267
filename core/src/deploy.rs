//! Payload deployment.
//!
//! The installer ships as a package directory holding the backend binary,
//! the popup server, its config, the printer list, and the prebuilt
//! uninstaller. These helpers copy those files into their system locations
//! with the right modes, and remove them again on uninstall.

use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use pharos_common::error::InstallError;
use tracing::{debug, info, warn};

pub const BACKEND_FILE: &str = "pharos";
pub const LPD_BACKEND_FILE: &str = "lpd";
pub const POPUP_FILE: &str = "pharospopup";
pub const POPUP_CONFIG_FILE: &str = "pharos.conf";
pub const PRINTERS_CONFIG_FILE: &str = "printers.conf";
pub const EULA_FILE: &str = "eula.txt";
pub const UNINSTALLER_FILE: &str = "uninstall-pharos";

/// Filesystem locations touched by install and uninstall.
///
/// Production uses [`InstallLayout::system`]; tests re-root everything under
/// a temp directory.
#[derive(Clone, Debug)]
pub struct InstallLayout {
    pub backend_dir: PathBuf,
    pub bin_dir: PathBuf,
    pub etc_dir: PathBuf,
    pub log_dir: PathBuf,
    pub ppd_dir: PathBuf,
}

impl InstallLayout {
    pub fn system() -> Self {
        Self {
            backend_dir: PathBuf::from("/usr/lib/cups/backend"),
            bin_dir: PathBuf::from("/usr/local/bin"),
            etc_dir: PathBuf::from("/usr/local/etc"),
            log_dir: PathBuf::from("/var/log/pharos"),
            ppd_dir: PathBuf::from("/etc/cups/ppd"),
        }
    }

    pub fn rooted(root: &Path) -> Self {
        Self {
            backend_dir: root.join("usr/lib/cups/backend"),
            bin_dir: root.join("usr/local/bin"),
            etc_dir: root.join("usr/local/etc"),
            log_dir: root.join("var/log/pharos"),
            ppd_dir: root.join("etc/cups/ppd"),
        }
    }

    pub fn backend_path(&self) -> PathBuf {
        self.backend_dir.join(BACKEND_FILE)
    }

    pub fn popup_exec(&self) -> PathBuf {
        self.bin_dir.join(POPUP_FILE)
    }

    pub fn popup_config(&self) -> PathBuf {
        self.etc_dir.join(POPUP_CONFIG_FILE)
    }

    pub fn uninstaller_path(&self) -> PathBuf {
        self.bin_dir.join(UNINSTALLER_FILE)
    }
}

/// Copies `src` over `dest` and sets its mode.
fn install_file(src: &Path, dest: &Path, mode: u32) -> io::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(src, dest)?;
    fs::set_permissions(dest, fs::Permissions::from_mode(mode))?;
    debug!("installed {} (mode {:o})", dest.display(), mode);
    Ok(())
}

fn deploy_error(what: &str, source: io::Error) -> InstallError {
    InstallError::Deploy {
        what: what.to_string(),
        source,
    }
}

/// Installs the `pharos` transport backend into the spooler's backend
/// directory.
///
/// A missing backend directory means the spooler itself is not set up and is
/// treated as a missing prerequisite rather than an IO failure. The stock
/// `lpd` backend gets its execute bit refreshed alongside ours; the pharos
/// transport hands jobs over to it.
pub fn deploy_backend(layout: &InstallLayout, package_dir: &Path) -> Result<(), InstallError> {
    if !layout.backend_dir.is_dir() {
        return Err(InstallError::MissingPrerequisite(format!(
            "spooler backend directory {} not found",
            layout.backend_dir.display()
        )));
    }

    install_file(
        &package_dir.join(BACKEND_FILE),
        &layout.backend_path(),
        0o755,
    )
    .map_err(|e| deploy_error("spooler backend", e))?;

    let lpd = layout.backend_dir.join(LPD_BACKEND_FILE);
    if lpd.exists() {
        fs::set_permissions(&lpd, fs::Permissions::from_mode(0o755))
            .map_err(|e| deploy_error("lpd backend permissions", e))?;
    } else {
        warn!("stock lpd backend not found at {}", lpd.display());
    }

    info!("backend installed at {}", layout.backend_path().display());
    Ok(())
}

/// Installs the popup server and its configuration file.
pub fn deploy_popup(layout: &InstallLayout, package_dir: &Path) -> Result<(), InstallError> {
    install_file(&package_dir.join(POPUP_FILE), &layout.popup_exec(), 0o755)
        .map_err(|e| deploy_error("popup server", e))?;
    install_file(
        &package_dir.join(POPUP_CONFIG_FILE),
        &layout.popup_config(),
        0o644,
    )
    .map_err(|e| deploy_error("popup configuration", e))?;

    info!("popup server installed at {}", layout.popup_exec().display());
    Ok(())
}

/// Copies the prebuilt uninstaller next to the popup server so the package
/// can be removed without the original media.
pub fn deploy_uninstaller(layout: &InstallLayout, package_dir: &Path) -> Result<(), InstallError> {
    install_file(
        &package_dir.join(UNINSTALLER_FILE),
        &layout.uninstaller_path(),
        0o755,
    )
    .map_err(|e| deploy_error("uninstaller", e))?;

    info!("uninstaller installed at {}", layout.uninstaller_path().display());
    Ok(())
}

/// Wipes and recreates the log directory.
///
/// The popup server runs inside user sessions, so the directory is left
/// world-writable.
pub fn recreate_log_dir(layout: &InstallLayout) -> Result<(), InstallError> {
    match fs::remove_dir_all(&layout.log_dir) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(deploy_error("log directory cleanup", err)),
    }
    fs::create_dir_all(&layout.log_dir).map_err(|e| deploy_error("log directory", e))?;
    fs::set_permissions(&layout.log_dir, fs::Permissions::from_mode(0o777))
        .map_err(|e| deploy_error("log directory permissions", e))?;

    info!("log directory ready at {}", layout.log_dir.display());
    Ok(())
}

/// Best-effort file removal; an already-absent file counts as removed.
pub fn remove_file_if_present(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => {
            info!("removed {}", path.display());
            true
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => true,
        Err(err) => {
            warn!("could not remove {}: {}", path.display(), err);
            false
        }
    }
}

/// Best-effort directory-tree removal; an already-absent tree counts as
/// removed.
pub fn remove_dir_if_present(path: &Path) -> bool {
    match fs::remove_dir_all(path) {
        Ok(()) => {
            info!("removed {}", path.display());
            true
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => true,
        Err(err) => {
            warn!("could not remove {}: {}", path.display(), err);
            false
        }
    }
}
