//! Repository resolution
//!
//! An existing checkout is reused as-is. A missing one is cloned from its
//! upstream into the base directory, and a clone always forces dependency
//! installation for the rest of the run.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BootstrapError, Result};
use crate::git;
use crate::settings::RepoSpec;
use crate::ui::Ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The requested path already existed
    Existing,
    /// The requested path was missing but a clone from an earlier run was found
    PreviousClone,
    /// Cloned during this run
    Cloned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub path: PathBuf,
    pub origin: Origin,
    /// Effective force-install flag for everything downstream of this checkout
    pub force_install: bool,
}

/// Resolve a checkout.
///
/// `requested` is the caller-supplied location (only the primary repository
/// has one); when it exists it is used and `force_install` passes through
/// untouched. Otherwise the repository lives at `<base_dir>/<spec.dir>`,
/// cloned if absent, and `force_install` becomes `true`.
pub fn resolve(
    requested: Option<&Path>,
    spec: &RepoSpec,
    base_dir: &Path,
    force_install: bool,
    ui: Ui,
) -> Result<Resolution> {
    if let Some(path) = requested {
        if path.exists() {
            ui.success(&format!("using existing checkout {}", path.display()));
            return Ok(Resolution {
                path: path.to_path_buf(),
                origin: Origin::Existing,
                force_install,
            });
        }
    }

    let target = base_dir.join(&spec.dir);
    if requested.is_none() && target.exists() {
        ui.success(&format!("using existing checkout {}", target.display()));
        return Ok(Resolution {
            path: target,
            origin: Origin::Existing,
            force_install,
        });
    }

    let origin = if target.exists() {
        ui.step(&format!("reusing earlier clone at {}", target.display()));
        Origin::PreviousClone
    } else {
        clone_into(&spec.url, &target, ui)?;
        Origin::Cloned
    };

    Ok(Resolution {
        path: target,
        origin,
        force_install: true,
    })
}

fn clone_into(url: &str, target: &Path, ui: Ui) -> Result<()> {
    if ui.is_dry_run() {
        ui.step(&format!("would clone {url} into {}", target.display()));
        return Ok(());
    }

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| BootstrapError::write_failed(parent, e))?;
    }

    let spinner = ui.spinner(&format!("Cloning {url}"));
    let result = git::clone(url, target);
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    result?;

    let sha = git::head_short_sha(target).unwrap_or_else(|| "unknown".to_string());
    ui.success(&format!("cloned {url} ({sha})"));
    Ok(())
}
