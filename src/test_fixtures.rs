//! Test fixtures shared by unit tests.
//!
//! [`RecordingRunner`] stands in for the host: it records every invocation,
//! answers queries from a script and fails the commands it is told to fail.
//! The git helpers build small upstream repositories to clone from.

use std::cell::{Cell, RefCell};
use std::fs;
use std::path::Path;

use tempfile::TempDir;

use crate::error::{BootstrapError, Result};
use crate::process::{CommandOutput, CommandRunner, Invocation, Spawned};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Run,
    Output,
    Spawn,
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub kind: CallKind,
    pub invocation: Invocation,
}

#[derive(Default)]
pub struct RecordingRunner {
    calls: RefCell<Vec<RecordedCall>>,
    failing: Vec<String>,
    responses: Vec<(String, String)>,
    next_pid: Cell<u32>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self {
            next_pid: Cell::new(1000),
            ..Self::default()
        }
    }

    /// Fail any command whose command line contains `pattern`
    pub fn fail_on(mut self, pattern: &str) -> Self {
        self.failing.push(pattern.to_string());
        self
    }

    /// Answer queries whose command line contains `pattern` with `stdout`
    pub fn respond(mut self, pattern: &str, stdout: &str) -> Self {
        self.responses.push((pattern.to_string(), stdout.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|c| c.invocation.to_string())
            .collect()
    }

    pub fn was_called(&self, pattern: &str) -> bool {
        self.command_lines().iter().any(|line| line.contains(pattern))
    }

    fn record(&self, kind: CallKind, invocation: &Invocation) -> bool {
        self.calls.borrow_mut().push(RecordedCall {
            kind,
            invocation: invocation.clone(),
        });
        let line = invocation.to_string();
        self.failing.iter().any(|p| line.contains(p.as_str()))
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, invocation: &Invocation) -> Result<()> {
        if self.record(CallKind::Run, invocation) {
            return Err(BootstrapError::CommandFailed {
                command: invocation.to_string(),
                reason: "exit status: 1".to_string(),
            });
        }
        Ok(())
    }

    fn output(&self, invocation: &Invocation) -> Result<CommandOutput> {
        let failed = self.record(CallKind::Output, invocation);
        let line = invocation.to_string();
        let stdout = self
            .responses
            .iter()
            .find(|(pattern, _)| line.contains(pattern.as_str()))
            .map(|(_, out)| out.clone())
            .unwrap_or_default();
        Ok(CommandOutput {
            success: !failed,
            stdout,
            stderr: String::new(),
        })
    }

    fn spawn(&self, invocation: &Invocation, _log_file: &Path) -> Result<Spawned> {
        if self.record(CallKind::Spawn, invocation) {
            return Err(BootstrapError::CommandSpawnFailed {
                command: invocation.to_string(),
                reason: "not found".to_string(),
            });
        }
        let pid = self.next_pid.get();
        self.next_pid.set(pid + 1);
        Ok(Spawned { pid: Some(pid) })
    }
}

/// Create a git repository at `path` with one commit containing `files`
pub fn commit_files(path: &Path, files: &[(&str, &str)]) {
    let repo = git2::Repository::init(path).expect("Failed to init git repository");
    for (name, content) in files {
        let file_path = path.join(name);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&file_path, content).expect("Failed to write file");
    }

    let mut index = repo.index().expect("Failed to open index");
    index
        .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
        .expect("Failed to stage files");
    index.write().expect("Failed to write index");
    let tree_id = index.write_tree().expect("Failed to write tree");
    let tree = repo.find_tree(tree_id).expect("Failed to find tree");
    let sig = git2::Signature::now("Test", "test@test.com").expect("Failed to create signature");
    repo.commit(Some("HEAD"), &sig, &sig, "Initial commit", &tree, &[])
        .expect("Failed to commit");
}

/// Temp directory holding an upstream repository with `files`
pub fn create_upstream(files: &[(&str, &str)]) -> TempDir {
    let temp = TempDir::new().expect("Failed to create temp directory");
    commit_files(temp.path(), files);
    temp
}

/// `file://` URL for a local repository path
pub fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// Network config source carrying every value the local patch rewrites
pub const UNPATCHED_CONFIG: &str = r"export default {
  server: {
    p2p: {
      baselineNodes: process.env.baselineNodes ? parseInt(process.env.baselineNodes) : 640,
      minNodes: process.env.minNodes ? parseInt(process.env.minNodes) : 640,
    },
    ip: {
      forceBogonFilteringOn: true,
    },
    mode: 'release',
    debug: {
      startInFatalsLogMode: true,
      startInErrorLogMode: false,
    },
  },
}
";
