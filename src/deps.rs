//! Dependency staleness check and installation
//!
//! A project's installed dependencies are considered valid when the
//! dependency directory exists and the manifest has not changed since it was
//! populated. "Changed" is judged either by modification time (the default)
//! or by a BLAKE3 fingerprint of the lockfile and manifest stored inside the
//! dependency directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::error::{BootstrapError, Result};
use crate::hash;
use crate::process::CommandRunner;
use crate::toolchain::NodeShell;
use crate::ui::Ui;

pub const DEPENDENCY_DIR: &str = "node_modules";
pub const LOCKFILE: &str = "package-lock.json";
pub const MANIFEST: &str = "package.json";
/// Fingerprint of the manifest the dependency directory was built from
pub const FINGERPRINT_FILE: &str = ".bootstrap-fingerprint";
/// Files whose content feeds the fingerprint
const FINGERPRINTED: [&str; 2] = [LOCKFILE, MANIFEST];

/// How dependency staleness is decided
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum StalenessStrategy {
    /// Manifest mtime must not be newer than the dependency directory's
    #[default]
    Mtime,
    /// Stored manifest hash must match the current one
    Fingerprint,
}

/// The file whose changes invalidate installed dependencies: the lockfile
/// when present, else the manifest.
pub fn manifest_path(project: &Path) -> Option<PathBuf> {
    [LOCKFILE, MANIFEST]
        .iter()
        .map(|name| project.join(name))
        .find(|p| p.is_file())
}

/// Mtime validity rule: valid iff the dependency directory exists and the
/// manifest is not newer than it. A project without a manifest has nothing
/// to go stale.
pub fn valid_by_mtime(manifest: Option<SystemTime>, dependency_dir: Option<SystemTime>) -> bool {
    match (manifest, dependency_dir) {
        (_, None) => false,
        (None, Some(_)) => true,
        (Some(m), Some(d)) => m <= d,
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Whether the installed dependencies of `project` are still valid
pub fn dependencies_valid(project: &Path, strategy: StalenessStrategy) -> Result<bool> {
    let dependency_dir = project.join(DEPENDENCY_DIR);
    if !dependency_dir.is_dir() {
        return Ok(false);
    }

    match strategy {
        StalenessStrategy::Mtime => Ok(valid_by_mtime(
            manifest_path(project).as_deref().and_then(modified),
            modified(&dependency_dir),
        )),
        StalenessStrategy::Fingerprint => {
            let Some(current) = hash::fingerprint(project, &FINGERPRINTED)? else {
                return Ok(true);
            };
            let stored = fs::read_to_string(dependency_dir.join(FINGERPRINT_FILE)).ok();
            Ok(stored.is_some_and(|s| s.trim() == current))
        }
    }
}

/// Installation is needed when forced or when the dependencies are stale
pub fn needs_install(project: &Path, force: bool, strategy: StalenessStrategy) -> Result<bool> {
    if force {
        return Ok(true);
    }
    Ok(!dependencies_valid(project, strategy)?)
}

/// `npm ci` for locked projects, `npm install` otherwise
pub fn install_command(project: &Path) -> &'static str {
    if project.join(LOCKFILE).is_file() {
        "npm ci"
    } else {
        "npm install"
    }
}

/// Install dependencies of `project` when forced or stale.
///
/// Returns whether an install ran. Any install failure is fatal.
pub fn ensure_dependencies(
    project: &Path,
    force: bool,
    strategy: StalenessStrategy,
    node: &NodeShell,
    runner: &dyn CommandRunner,
    ui: Ui,
) -> Result<bool> {
    if !needs_install(project, force, strategy)? {
        ui.step(&format!(
            "dependencies up to date in {}",
            project.display()
        ));
        return Ok(false);
    }

    let command = install_command(project);
    ui.step(&format!("{command} in {}", project.display()));
    runner
        .run(&node.command(command).current_dir(project))
        .map_err(|e| BootstrapError::DependencyInstallFailed {
            path: project.display().to_string(),
            reason: e.to_string(),
        })?;

    if strategy == StalenessStrategy::Fingerprint && !ui.is_dry_run() {
        record_fingerprint(project)?;
    }
    Ok(true)
}

/// Store the manifest fingerprint in the dependency directory
pub fn record_fingerprint(project: &Path) -> Result<()> {
    let dependency_dir = project.join(DEPENDENCY_DIR);
    if !dependency_dir.is_dir() {
        return Ok(());
    }
    let Some(fingerprint) = hash::fingerprint(project, &FINGERPRINTED)? else {
        return Ok(());
    };
    let path = dependency_dir.join(FINGERPRINT_FILE);
    fs::write(&path, fingerprint).map_err(|e| BootstrapError::write_failed(&path, e))
}
