//! Common test utilities for bootstrap integration tests

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated base directory plus a fake nvm install
pub struct TestEnv {
    #[allow(dead_code)]
    pub temp: TempDir,
    pub base_dir: PathBuf,
    pub nvm_dir: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let base_dir = temp.path().join("base");
        let nvm_dir = temp.path().join("nvm");
        std::fs::create_dir_all(&nvm_dir).expect("Failed to create nvm directory");
        std::fs::write(nvm_dir.join("nvm.sh"), "").expect("Failed to write nvm.sh");
        Self {
            temp,
            base_dir,
            nvm_dir,
        }
    }

    /// Write a settings file and return its path
    #[allow(dead_code)]
    pub fn write_settings(&self, yaml: &str) -> PathBuf {
        let path = self.temp.path().join("bootstrap.yaml");
        std::fs::write(&path, yaml).expect("Failed to write settings");
        path
    }

    /// Write the process record the way a previous run would have
    #[allow(dead_code)]
    pub fn write_record(&self, json: &str) {
        std::fs::create_dir_all(&self.base_dir).expect("Failed to create base directory");
        std::fs::write(self.base_dir.join("processes.json"), json).expect("Failed to write record");
    }

    #[allow(dead_code)]
    pub fn record_exists(&self) -> bool {
        self.base_dir.join("processes.json").exists()
    }

    /// Bootstrap command with the environment pinned to this test
    #[allow(deprecated)]
    pub fn cmd(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::cargo_bin("bootstrap").expect("Failed to find binary");
        cmd.env("BOOTSTRAP_BASE_DIR", &self.base_dir)
            .env("NVM_DIR", &self.nvm_dir)
            .env_remove("BOOTSTRAP_CONFIG")
            .env_remove("OSTYPE");
        cmd
    }
}

#[allow(dead_code)]
pub fn is_empty_or_missing(dir: &Path) -> bool {
    match std::fs::read_dir(dir) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => true,
    }
}
