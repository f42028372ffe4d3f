//! The bootstrap pipeline
//!
//! Stages run strictly in order and each is a precondition for the next:
//!
//! 1. Detect the platform
//! 2. Verify or install the toolchain
//! 3. Resolve the network checkout (reuse or clone)
//! 4. Install dependencies when forced or stale
//! 5. Patch the network config for a local network
//! 6. Launch network, RPC server, validator CLI and GUI
//!
//! The effective force-install flag is decided once, at repository
//! resolution, and handed to every later stage.

use std::path::PathBuf;

use crate::deps;
use crate::error::Result;
use crate::launch::Launcher;
use crate::patch::{self, PatchOutcome};
use crate::platform::Platform;
use crate::process::CommandRunner;
use crate::process::supervisor::SupervisionRecord;
use crate::repository::{self, Origin};
use crate::settings::Settings;
use crate::toolchain;
use crate::ui::Ui;

/// What the caller asked for
#[derive(Debug, Clone)]
pub struct Request {
    pub repo_path: PathBuf,
    pub force_install: bool,
    /// `$OSTYPE`-style identifier; detected from the host when `None`
    pub os_type: Option<String>,
}

/// What a completed run produced
#[derive(Debug, Clone)]
pub struct Summary {
    pub platform: Platform,
    pub network_dir: PathBuf,
    pub origin: Origin,
    pub force_install: bool,
    pub dependencies_installed: bool,
    pub patch: PatchOutcome,
    pub record: SupervisionRecord,
}

pub fn run(
    request: &Request,
    settings: &Settings,
    runner: &dyn CommandRunner,
    ui: Ui,
) -> Result<Summary> {
    ui.stage("Detecting platform");
    let platform = Platform::detect(request.os_type.as_deref())?;
    ui.success(&format!("platform: {platform}"));

    ui.stage("Checking toolchain");
    let node = toolchain::provision(platform, &settings.toolchain, runner, ui)?;

    ui.stage("Resolving network repository");
    let network = repository::resolve(
        Some(&request.repo_path),
        &settings.repositories.network,
        &settings.base_dir,
        request.force_install,
        ui,
    )?;
    let force_install = network.force_install;

    ui.stage("Installing network dependencies");
    let dependencies_installed = deps::ensure_dependencies(
        &network.path,
        force_install,
        settings.staleness,
        &node,
        runner,
        ui,
    )?;

    ui.stage("Patching network config");
    let patch = patch::patch_file(
        &network.path.join(&settings.network.config_file),
        &patch::local_network_patch(settings.network.node_count),
        ui,
    )?;

    let previous = SupervisionRecord::load(&settings.base_dir)?.unwrap_or_default();
    if previous.spawned() > 0 {
        ui.warn(&format!(
            "{} process(es) from an earlier run are still recorded; 'bootstrap stop' stops them too",
            previous.spawned()
        ));
    }
    let mut launcher = Launcher::new(settings, &node, runner, ui, force_install, previous);
    ui.stage("Starting network");
    launcher.network(&network.path)?;
    ui.stage("Starting RPC server");
    launcher.rpc_server()?;
    ui.stage("Starting validator CLI");
    launcher.cli(&network.path)?;
    ui.stage("Starting validator GUI");
    launcher.gui()?;

    Ok(Summary {
        platform,
        network_dir: network.path,
        origin: network.origin,
        force_install,
        dependencies_installed,
        patch,
        record: launcher.record().clone(),
    })
}
