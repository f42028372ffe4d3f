//! Toolchain verification and installation
//!
//! Order: node version manager (must already exist), node runtime, Rust
//! compiler, OS build tools. Anything that needs installing is installed;
//! any failed install aborts the run.

use std::path::{Path, PathBuf};

use crate::error::{BootstrapError, Result};
use crate::platform::Platform;
use crate::process::{CommandRunner, Invocation};
use crate::settings::ToolchainSettings;
use crate::ui::Ui;

const RUSTUP_INSTALLER: &str = "curl --proto '=https' --tlsv1.2 -sSf https://sh.rustup.rs";

/// Runs node tooling through nvm so the selected runtime is on PATH
/// regardless of the caller's shell profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeShell {
    nvm_script: PathBuf,
    version: String,
}

impl NodeShell {
    pub fn new(nvm_script: PathBuf, version: impl Into<String>) -> Self {
        Self {
            nvm_script,
            version: version.into(),
        }
    }

    fn source(&self) -> String {
        format!(". \"{}\"", self.nvm_script.display())
    }

    /// Wrap `command_line` so it runs under the selected node version
    pub fn command(&self, command_line: &str) -> Invocation {
        Invocation::shell(format!(
            "{} && nvm use --silent {} && {}",
            self.source(),
            self.version,
            command_line
        ))
    }
}

fn install_failed(tool: &str, err: BootstrapError) -> BootstrapError {
    BootstrapError::ToolchainInstallFailed {
        tool: tool.to_string(),
        reason: err.to_string(),
    }
}

/// Locate `nvm.sh`. A missing version manager is fatal; it is never installed.
pub fn ensure_version_manager(settings: &ToolchainSettings) -> Result<PathBuf> {
    let script = settings.resolve_nvm_dir().join("nvm.sh");
    if script.is_file() {
        Ok(script)
    } else {
        Err(BootstrapError::VersionManagerMissing {
            path: script.display().to_string(),
        })
    }
}

/// Make sure the expected node major version is active, installing it with
/// nvm when `node --version` does not match.
pub fn ensure_node(
    nvm_script: &Path,
    settings: &ToolchainSettings,
    runner: &dyn CommandRunner,
    ui: Ui,
) -> Result<NodeShell> {
    let selector = settings.node_match.trim_start_matches('v');
    let shell = NodeShell::new(nvm_script.to_path_buf(), selector);

    let query = Invocation::shell(format!("{} && node --version", shell.source()));
    let current = runner
        .output(&query)
        .ok()
        .filter(|out| out.success)
        .map(|out| out.stdout.trim().to_string())
        .unwrap_or_default();

    if current.contains(&settings.node_match) {
        ui.success(&format!("node {current}"));
        return Ok(shell);
    }

    ui.step(&format!(
        "installing node {} (found: {})",
        settings.node_version,
        if current.is_empty() { "none" } else { current.as_str() }
    ));
    let install = Invocation::shell(format!(
        "{} && nvm install {} && nvm use {}",
        shell.source(),
        settings.node_version,
        settings.node_version
    ));
    runner.run(&install).map_err(|e| install_failed("node", e))?;
    ui.success(&format!("node {}", settings.node_version));
    Ok(shell)
}

/// Make sure `rustc --version` reports the expected version, installing the
/// toolchain with rustup (and rustup itself when missing).
pub fn ensure_rust(settings: &ToolchainSettings, runner: &dyn CommandRunner, ui: Ui) -> Result<()> {
    let current = runner
        .output(&Invocation::new("rustc").arg("--version"))
        .ok()
        .filter(|out| out.success)
        .map(|out| out.stdout.trim().to_string())
        .unwrap_or_default();

    if current.contains(&settings.rust_match) {
        ui.success(&current);
        return Ok(());
    }

    let has_rustup = runner
        .output(&Invocation::new("rustup").arg("--version"))
        .is_ok_and(|out| out.success);

    if has_rustup {
        ui.step(&format!("installing rust {}", settings.rust_version));
        runner
            .run(&Invocation::new("rustup").args(["install", settings.rust_version.as_str()]))
            .and_then(|()| {
                runner.run(
                    &Invocation::new("rustup").args(["default", settings.rust_version.as_str()]),
                )
            })
            .map_err(|e| install_failed("rust", e))?;
    } else {
        ui.step(&format!("installing rustup with rust {}", settings.rust_version));
        let script = format!(
            "{RUSTUP_INSTALLER} | sh -s -- -y --default-toolchain {}",
            settings.rust_version
        );
        runner
            .run(&Invocation::shell(script))
            .map_err(|e| install_failed("rust", e))?;
    }

    ui.success(&format!("rust {}", settings.rust_version));
    Ok(())
}

/// Install native build tools for the platform
pub fn ensure_build_tools(platform: Platform, runner: &dyn CommandRunner, ui: Ui) -> Result<()> {
    match platform {
        Platform::Linux => {
            ui.step("installing build-essential");
            runner
                .run(&Invocation::new("sudo").args(["apt-get", "update"]))
                .and_then(|()| {
                    runner.run(&Invocation::new("sudo").args([
                        "apt-get",
                        "install",
                        "-y",
                        "build-essential",
                    ]))
                })
                .map_err(|e| install_failed("build-essential", e))?;
        }
        Platform::MacOs => {
            let installed = runner
                .output(&Invocation::new("xcode-select").arg("-p"))
                .is_ok_and(|out| out.success);
            if !installed {
                ui.step("installing Xcode command line tools");
                runner
                    .run(&Invocation::new("xcode-select").arg("--install"))
                    .map_err(|e| install_failed("xcode command line tools", e))?;
            }
        }
    }
    ui.success(&format!("{platform} build tools"));
    Ok(())
}

/// Verify or install the full toolchain. Returns the node shell used by
/// every later npm/npx invocation.
pub fn provision(
    platform: Platform,
    settings: &ToolchainSettings,
    runner: &dyn CommandRunner,
    ui: Ui,
) -> Result<NodeShell> {
    let nvm_script = ensure_version_manager(settings)?;
    ui.success(&format!("nvm at {}", nvm_script.display()));
    let node = ensure_node(&nvm_script, settings, runner, ui)?;
    ensure_rust(settings, runner, ui)?;
    ensure_build_tools(platform, runner, ui)?;
    Ok(node)
}
