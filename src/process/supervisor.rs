//! Supervision record for launched subsystems
//!
//! The bootstrapper owns every process it launches for the lifetime of the
//! run and persists them to `<base>/processes.json`, so a later `stop` can
//! tear the environment down in reverse launch order.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::{CommandRunner, Invocation};
use crate::error::{BootstrapError, Result};
use crate::ui::Ui;

/// Supervision record file name inside the base directory
pub const RECORD_FILE: &str = "processes.json";

/// One launched subsystem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessEntry {
    pub name: String,
    /// Present for processes spawned directly in the background
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    pub command: String,
    pub cwd: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Dedicated shutdown command for subsystems that manage their own
    /// processes (the network, the validator CLI)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<Invocation>,
    pub launched_at: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupervisionRecord {
    pub processes: Vec<ProcessEntry>,
}

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

impl SupervisionRecord {
    pub fn path(base_dir: &Path) -> PathBuf {
        base_dir.join(RECORD_FILE)
    }

    /// Load the record, `None` when no run has written one
    pub fn load(base_dir: &Path) -> Result<Option<Self>> {
        let path = Self::path(base_dir);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(|e| BootstrapError::read_failed(&path, e))?;
        let record = serde_json::from_str(&content).map_err(|e| BootstrapError::ConfigParseFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Some(record))
    }

    pub fn save(&self, base_dir: &Path) -> Result<()> {
        let path = Self::path(base_dir);
        fs::create_dir_all(base_dir).map_err(|e| BootstrapError::write_failed(base_dir, e))?;
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content).map_err(|e| BootstrapError::write_failed(&path, e))
    }

    pub fn remove(base_dir: &Path) -> Result<()> {
        let path = Self::path(base_dir);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| BootstrapError::write_failed(&path, e))?;
        }
        Ok(())
    }

    /// Add an entry. Spawned processes from earlier runs are kept so they
    /// can still be stopped; a self-managed subsystem (no pid) has a single
    /// stop command, so its earlier entry is replaced.
    pub fn track(&mut self, entry: ProcessEntry) {
        if entry.pid.is_none() {
            self.processes
                .retain(|p| !(p.name == entry.name && p.pid.is_none()));
        }
        self.processes.push(entry);
    }

    /// Entries whose pid was recorded, i.e. processes this tool spawned
    pub fn spawned(&self) -> usize {
        self.processes.iter().filter(|p| p.pid.is_some()).count()
    }
}

/// Stop every recorded process in reverse launch order.
///
/// Failures are reported and skipped so one dead service does not keep the
/// others running. Returns the number of entries that could not be stopped.
pub fn stop_all(record: &SupervisionRecord, runner: &dyn CommandRunner, ui: Ui) -> usize {
    let mut failures = 0;
    for entry in record.processes.iter().rev() {
        let invocation = match (&entry.stop, entry.pid) {
            (Some(stop), _) => stop.clone(),
            // Negative pid signals the whole process group
            (None, Some(pid)) => Invocation::new("kill").args(["-TERM", "--", &format!("-{pid}")]),
            (None, None) => {
                ui.warn(&format!("{}: no pid recorded, skipping", entry.name));
                continue;
            }
        };

        match runner.run(&invocation) {
            Ok(()) => ui.success(&format!("stopped {}", entry.name)),
            Err(e) => {
                failures += 1;
                ui.warn(&format!("{}: {}", entry.name, e));
            }
        }
    }
    failures
}

/// Whether a pid still refers to a live process
pub fn is_alive(pid: u32, runner: &dyn CommandRunner) -> bool {
    runner
        .output(&Invocation::new("kill").args(["-0", &pid.to_string()]))
        .map(|out| out.success)
        .unwrap_or(false)
}
