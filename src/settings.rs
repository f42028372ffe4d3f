//! Bootstrap settings
//!
//! Every constant the bootstrapper relies on (upstream URLs, versions, ports,
//! archiver identity) lives here with a default. Settings are layered:
//! built-in defaults, then an optional YAML file, then command line flags.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::deps::StalenessStrategy;
use crate::error::{BootstrapError, Result};

/// Settings file looked up in the base directory when `--config` is not given
pub const SETTINGS_FILE: &str = "bootstrap.yaml";

/// Directory name under the user's data directory
const DATA_DIR: &str = "devnet-bootstrap";

/// Placeholder used when no repository path is passed on the command line.
/// It never exists, so the default invocation always clones.
pub const DEFAULT_REPO_PATH: &str = "/path/to/your/shardeum/repo";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Directory that receives clones, logs and the supervision record
    pub base_dir: PathBuf,
    pub repositories: Repositories,
    pub toolchain: ToolchainSettings,
    pub network: NetworkSettings,
    pub ports: Ports,
    pub readiness: ReadinessSettings,
    pub staleness: StalenessStrategy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Repositories {
    pub network: RepoSpec,
    pub rpc_server: RepoSpec,
    pub cli: RepoSpec,
    pub gui: RepoSpec,
}

/// Upstream URL and checkout directory name (relative to the base dir)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepoSpec {
    pub url: String,
    pub dir: String,
}

impl RepoSpec {
    fn new(url: &str, dir: &str) -> Self {
        Self {
            url: url.to_string(),
            dir: dir.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolchainSettings {
    /// nvm installation directory; falls back to `$NVM_DIR`, then `~/.nvm`
    pub nvm_dir: Option<PathBuf>,
    /// Version passed to `nvm install`
    pub node_version: String,
    /// Substring `node --version` must contain
    pub node_match: String,
    /// Version passed to `rustup install`
    pub rust_version: String,
    /// Substring `rustc --version` must contain
    pub rust_match: String,
}

impl ToolchainSettings {
    pub fn resolve_nvm_dir(&self) -> PathBuf {
        if let Some(dir) = &self.nvm_dir {
            return dir.clone();
        }
        if let Ok(dir) = std::env::var("NVM_DIR") {
            if !dir.is_empty() {
                return PathBuf::from(dir);
            }
        }
        dirs::home_dir().unwrap_or_default().join(".nvm")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkSettings {
    /// Number of local nodes started by the network command
    pub node_count: u32,
    /// Config source patched before the network starts, relative to its checkout
    pub config_file: PathBuf,
    /// Data directory written into the CLI network config
    pub data_dir: String,
    pub host: String,
    pub archiver_public_key: String,
    /// Monitor endpoint the validator reports to; defaults to the monitor
    /// port on localhost
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_recipient: Option<String>,
    pub report_interval_secs: u64,
    pub report_console: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Ports {
    pub network_external: u16,
    pub network_internal: u16,
    pub rpc_server: u16,
    pub gui: u16,
    pub archiver: u16,
    pub monitor: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReadinessSettings {
    pub timeout_secs: u64,
    pub interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            repositories: Repositories::default(),
            toolchain: ToolchainSettings::default(),
            network: NetworkSettings::default(),
            ports: Ports::default(),
            readiness: ReadinessSettings::default(),
            staleness: StalenessStrategy::default(),
        }
    }
}

impl Default for Repositories {
    fn default() -> Self {
        Self {
            network: RepoSpec::new("https://github.com/shardeum/shardeum.git", "shardeum"),
            rpc_server: RepoSpec::new(
                "https://github.com/shardeum/json-rpc-server.git",
                "json-rpc-server",
            ),
            cli: RepoSpec::new(
                "https://github.com/shardeum/validator-cli.git",
                "validator-cli",
            ),
            gui: RepoSpec::new(
                "https://github.com/shardeum/validator-gui.git",
                "validator-gui",
            ),
        }
    }
}

impl Default for ToolchainSettings {
    fn default() -> Self {
        Self {
            nvm_dir: None,
            node_version: "18.16.1".to_string(),
            node_match: "v18".to_string(),
            rust_version: "1.74.1".to_string(),
            rust_match: "1.74".to_string(),
        }
    }
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            node_count: 10,
            config_file: PathBuf::from("src/config/index.ts"),
            data_dir: "./data".to_string(),
            host: "127.0.0.1".to_string(),
            archiver_public_key: "758b1c119412298802cd28dbfa394cdfeecc4074492d60844cc192d632d84de3"
                .to_string(),
            report_recipient: None,
            report_interval_secs: 2,
            report_console: false,
        }
    }
}

impl Default for Ports {
    fn default() -> Self {
        Self {
            network_external: 9050,
            network_internal: 10045,
            rpc_server: 8080,
            gui: 8081,
            archiver: 4000,
            monitor: 3000,
        }
    }
}

impl Default for ReadinessSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            interval_ms: 500,
        }
    }
}

/// Default base directory: `<data dir>/devnet-bootstrap`
pub fn default_base_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(DATA_DIR))
        .unwrap_or_else(|| PathBuf::from(DATA_DIR))
}

impl Settings {
    /// Load settings.
    ///
    /// An explicit `config` path must exist. Without one, `bootstrap.yaml` in
    /// the base directory is used when present, else the built-in defaults.
    /// `base_dir` (from `--base-dir` / `BOOTSTRAP_BASE_DIR`) wins over the file.
    pub fn load(config: Option<&Path>, base_dir: Option<PathBuf>) -> Result<Self> {
        let mut settings = match config {
            Some(path) => Self::from_file(path)?,
            None => {
                let base = base_dir.clone().unwrap_or_else(default_base_dir);
                let candidate = base.join(SETTINGS_FILE);
                if candidate.is_file() {
                    Self::from_file(&candidate)?
                } else {
                    Self::default()
                }
            }
        };

        if let Some(base) = base_dir {
            settings.base_dir = base;
        }

        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| BootstrapError::ConfigReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_yaml(&content).map_err(|e| match e {
            BootstrapError::ConfigParseFailed { reason, .. } => BootstrapError::ConfigParseFailed {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    pub fn rpc_url(&self) -> String {
        format!("http://{}:{}", self.network.host, self.ports.rpc_server)
    }

    pub fn report_recipient(&self) -> String {
        match &self.network.report_recipient {
            Some(url) => url.clone(),
            None => format!("http://localhost:{}/api", self.ports.monitor),
        }
    }
}
