//! Generated configuration for the validator CLI and GUI
//!
//! Both files are rewritten from settings on every run; nothing from a
//! previous version is merged in.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BootstrapError, Result};
use crate::settings::Settings;
use crate::ui::Ui;

/// Network config file written into the CLI checkout
pub const NETWORK_CONFIG_FILE: &str = "network-config.json";

/// Environment file written into the GUI checkout
pub const GUI_ENV_FILE: &str = ".env";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    pub base_dir: String,
    pub p2p: P2pConfig,
    pub ip: IpConfig,
    pub reporting: ReportingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct P2pConfig {
    pub existing_archivers: Vec<ArchiverEndpoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiverEndpoint {
    pub ip: String,
    pub port: u16,
    pub public_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpConfig {
    pub external_ip: String,
    pub external_port: u16,
    pub internal_ip: String,
    pub internal_port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingConfig {
    pub report: bool,
    pub recipient: String,
    /// Seconds between reports
    pub interval: u64,
    pub console: bool,
}

impl NetworkConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        let network = &settings.network;
        let ports = &settings.ports;
        Self {
            server: ServerConfig {
                base_dir: network.data_dir.clone(),
                p2p: P2pConfig {
                    existing_archivers: vec![ArchiverEndpoint {
                        ip: network.host.clone(),
                        port: ports.archiver,
                        public_key: network.archiver_public_key.clone(),
                    }],
                },
                ip: IpConfig {
                    external_ip: network.host.clone(),
                    external_port: ports.network_external,
                    internal_ip: network.host.clone(),
                    internal_port: ports.network_internal,
                },
                reporting: ReportingConfig {
                    report: true,
                    recipient: settings.report_recipient(),
                    interval: network.report_interval_secs,
                    console: network.report_console,
                },
            },
        }
    }
}

/// Ordered key/value pairs of the GUI environment file
pub fn gui_env(settings: &Settings) -> Vec<(&'static str, String)> {
    let rpc_url = settings.rpc_url();
    vec![
        ("NEXT_PUBLIC_RPC_URL", rpc_url.clone()),
        ("PORT", settings.ports.gui.to_string()),
        ("RPC_SERVER_URL", rpc_url),
        ("NODE_ENV", "development".to_string()),
    ]
}

pub fn render_env(pairs: &[(&str, String)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{key}={value}\n"))
        .collect()
}

fn write_artifact(path: &Path, content: &str, ui: Ui) -> Result<PathBuf> {
    if ui.is_dry_run() {
        ui.step(&format!("would write {}", path.display()));
        return Ok(path.to_path_buf());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| BootstrapError::write_failed(parent, e))?;
    }
    fs::write(path, content).map_err(|e| BootstrapError::write_failed(path, e))?;
    ui.success(&format!("wrote {}", path.display()));
    Ok(path.to_path_buf())
}

/// Write the CLI network config into `cli_dir`
pub fn write_network_config(cli_dir: &Path, settings: &Settings, ui: Ui) -> Result<PathBuf> {
    let content = serde_json::to_string_pretty(&NetworkConfig::from_settings(settings))?;
    write_artifact(&cli_dir.join(NETWORK_CONFIG_FILE), &content, ui)
}

/// Write the GUI environment file into `gui_dir`
pub fn write_gui_env(gui_dir: &Path, settings: &Settings, ui: Ui) -> Result<PathBuf> {
    write_artifact(&gui_dir.join(GUI_ENV_FILE), &render_env(&gui_env(settings)), ui)
}
