//! Subsystem launch sequence
//!
//! Network, RPC server, validator CLI and validator GUI are started in that
//! order. The network and CLI start synchronously; the RPC server and GUI are
//! left running in the background with their output in `<base>/logs/`.
//! Every launch is tracked in the supervision record, which is saved after
//! each step so a failure later in the sequence still leaves it usable.

use std::fs;
use std::path::{Path, PathBuf};

use crate::artifacts;
use crate::deps;
use crate::error::{BootstrapError, Result};
use crate::process::supervisor::{ProcessEntry, SupervisionRecord, unix_now};
use crate::process::CommandRunner;
use crate::readiness;
use crate::repository::{self, Resolution};
use crate::settings::{RepoSpec, Settings};
use crate::toolchain::NodeShell;
use crate::ui::Ui;

/// Name of the link the validator CLI expects next to its checkout
pub const VALIDATOR_LINK: &str = "validator";

pub const NETWORK: &str = "network";
pub const RPC_SERVER: &str = "rpc-server";
pub const CLI: &str = "validator-cli";
pub const GUI: &str = "validator-gui";

pub struct Launcher<'a> {
    settings: &'a Settings,
    node: &'a NodeShell,
    runner: &'a dyn CommandRunner,
    ui: Ui,
    force_install: bool,
    record: SupervisionRecord,
}

impl<'a> Launcher<'a> {
    /// `record` is what earlier runs left behind; new launches are added to it
    pub fn new(
        settings: &'a Settings,
        node: &'a NodeShell,
        runner: &'a dyn CommandRunner,
        ui: Ui,
        force_install: bool,
        record: SupervisionRecord,
    ) -> Self {
        Self {
            settings,
            node,
            runner,
            ui,
            force_install,
            record,
        }
    }

    pub fn record(&self) -> &SupervisionRecord {
        &self.record
    }

    fn track(&mut self, entry: ProcessEntry) -> Result<()> {
        self.record.track(entry);
        if self.ui.is_dry_run() {
            return Ok(());
        }
        self.record.save(&self.settings.base_dir)
    }

    fn log_file(&self, name: &str) -> PathBuf {
        self.settings.logs_dir().join(format!("{name}.log"))
    }

    /// Resolve a secondary checkout and bring its dependencies up to date
    fn prepare(&self, spec: &RepoSpec) -> Result<Resolution> {
        let resolution = repository::resolve(
            None,
            spec,
            &self.settings.base_dir,
            self.force_install,
            self.ui,
        )?;
        deps::ensure_dependencies(
            &resolution.path,
            resolution.force_install,
            self.settings.staleness,
            self.node,
            self.runner,
            self.ui,
        )?;
        Ok(resolution)
    }

    fn spawn_service(&mut self, name: &str, dir: &Path, port: u16) -> Result<()> {
        let invocation = self.node.command("npm run start").current_dir(dir);
        let log_file = self.log_file(name);
        let spawned = self.runner.spawn(&invocation, &log_file)?;

        match spawned.pid {
            Some(pid) => self.ui.success(&format!("{name} started (pid {pid}, log {})", log_file.display())),
            None => self.ui.step(&format!("{name} started")),
        }

        self.track(ProcessEntry {
            name: name.to_string(),
            pid: spawned.pid,
            command: invocation.to_string(),
            cwd: dir.to_path_buf(),
            log_file: Some(log_file),
            port: Some(port),
            stop: None,
            launched_at: unix_now(),
        })
    }

    /// Start the local network and wait for the start command to return
    pub fn network(&mut self, network_dir: &Path) -> Result<()> {
        let count = self.settings.network.node_count;
        self.ui.step(&format!("starting network with {count} nodes"));
        let invocation = self
            .node
            .command(&format!("npx shardus start {count}"))
            .current_dir(network_dir);
        self.runner.run(&invocation)?;
        self.ui.success("network started");

        let stop = self.node.command("npx shardus stop").current_dir(network_dir);
        self.track(ProcessEntry {
            name: NETWORK.to_string(),
            pid: None,
            command: invocation.to_string(),
            cwd: network_dir.to_path_buf(),
            log_file: None,
            port: Some(self.settings.ports.network_external),
            stop: Some(stop),
            launched_at: unix_now(),
        })
    }

    /// Start the RPC server in the background and wait until it listens
    pub fn rpc_server(&mut self) -> Result<()> {
        let resolution = self.prepare(&self.settings.repositories.rpc_server)?;
        let port = self.settings.ports.rpc_server;
        self.spawn_service(RPC_SERVER, &resolution.path, port)?;

        if self.ui.is_dry_run() {
            self.ui.step(&format!("would wait for {RPC_SERVER} on port {port}"));
            return Ok(());
        }

        let spinner = self.ui.spinner(&format!("Waiting for {RPC_SERVER} on port {port}"));
        let ready = readiness::wait_for_port(
            RPC_SERVER,
            &self.settings.network.host,
            port,
            &self.settings.readiness,
        );
        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }
        ready?;
        self.ui.success(&format!("{RPC_SERVER} listening on port {port}"));
        Ok(())
    }

    /// Install, link and start the validator CLI against the network checkout
    pub fn cli(&mut self, network_dir: &Path) -> Result<()> {
        let resolution = self.prepare(&self.settings.repositories.cli)?;
        let cli_dir = resolution.path;

        link_network_checkout(&cli_dir, network_dir, self.ui)?;
        self.runner
            .run(&self.node.command("npm link").current_dir(&cli_dir))?;
        artifacts::write_network_config(&cli_dir, self.settings, self.ui)?;

        let invocation = self.node.command("operator-cli start").current_dir(&cli_dir);
        self.runner.run(&invocation)?;
        self.ui.success("validator started");

        let stop = self.node.command("operator-cli stop").current_dir(&cli_dir);
        self.track(ProcessEntry {
            name: CLI.to_string(),
            pid: None,
            command: invocation.to_string(),
            cwd: cli_dir,
            log_file: None,
            port: Some(self.settings.ports.network_internal),
            stop: Some(stop),
            launched_at: unix_now(),
        })
    }

    /// Configure, build and start the GUI in the background. Not awaited.
    pub fn gui(&mut self) -> Result<()> {
        let spec = &self.settings.repositories.gui;
        let resolution = repository::resolve(
            None,
            spec,
            &self.settings.base_dir,
            self.force_install,
            self.ui,
        )?;
        let gui_dir = resolution.path;

        artifacts::write_gui_env(&gui_dir, self.settings, self.ui)?;
        deps::ensure_dependencies(
            &gui_dir,
            resolution.force_install,
            self.settings.staleness,
            self.node,
            self.runner,
            self.ui,
        )?;
        self.runner
            .run(&self.node.command("npm run build").current_dir(&gui_dir))?;

        let port = self.settings.ports.gui;
        self.spawn_service(GUI, &gui_dir, port)
    }
}

/// Link `<cli_dir>/../validator` to the network checkout and verify the link
/// resolves to a readable directory.
pub fn link_network_checkout(cli_dir: &Path, network_dir: &Path, ui: Ui) -> Result<PathBuf> {
    let parent = cli_dir.parent().unwrap_or(cli_dir);
    let link = parent.join(VALIDATOR_LINK);

    let link_error = |reason: String| BootstrapError::SymlinkFailed {
        link: link.display().to_string(),
        target: network_dir.display().to_string(),
        reason,
    };

    if ui.is_dry_run() {
        ui.step(&format!(
            "would link {} -> {}",
            link.display(),
            network_dir.display()
        ));
        return Ok(link);
    }

    let target = fs::canonicalize(network_dir).map_err(|e| link_error(e.to_string()))?;

    match fs::symlink_metadata(&link) {
        Ok(meta) if meta.file_type().is_symlink() => {
            fs::remove_file(&link).map_err(|e| link_error(e.to_string()))?;
        }
        Ok(_) => {
            // The checkout itself may live at the link location
            let existing = fs::canonicalize(&link).map_err(|e| link_error(e.to_string()))?;
            if existing != target {
                return Err(link_error("path exists and is not a symlink".to_string()));
            }
            return Ok(link);
        }
        Err(_) => {}
    }

    #[cfg(unix)]
    std::os::unix::fs::symlink(&target, &link).map_err(|e| link_error(e.to_string()))?;
    #[cfg(windows)]
    std::os::windows::fs::symlink_dir(&target, &link).map_err(|e| link_error(e.to_string()))?;

    fs::read_dir(&link).map_err(|e| link_error(e.to_string()))?;
    ui.success(&format!("linked {} -> {}", link.display(), target.display()));
    Ok(link)
}
