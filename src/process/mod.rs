//! External command execution
//!
//! Every program the bootstrapper touches (nvm, npm, rustup, apt-get, the
//! network tooling) runs through the [`CommandRunner`] trait. The system
//! runner executes for real, the dry-run runner only reports, and tests plug
//! in a recording fake.

pub mod supervisor;

use std::fmt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};

use crate::error::{BootstrapError, Result};
use crate::ui::Ui;

/// Number of trailing stderr lines quoted in a failure message
const STDERR_TAIL_LINES: usize = 20;

/// A program invocation: what to run and where
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Run a script through `bash -c`
    pub fn shell(script: impl Into<String>) -> Self {
        Self::new("bash").arg("-c").arg(script)
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " '{arg}'")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Captured result of a command that ran to completion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Handle information for a process left running in the background
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spawned {
    pub pid: Option<u32>,
}

pub trait CommandRunner {
    /// Run to completion. A non-zero exit is a `CommandFailed` error.
    fn run(&self, invocation: &Invocation) -> Result<()>;

    /// Run to completion and capture output. Only a failure to start the
    /// program is an error; a non-zero exit is reported in the output.
    fn output(&self, invocation: &Invocation) -> Result<CommandOutput>;

    /// Start in the background with stdout/stderr appended to `log_file`.
    /// The process outlives the bootstrapper.
    fn spawn(&self, invocation: &Invocation, log_file: &Path) -> Result<Spawned>;
}

/// Runs commands on the host
pub struct SystemRunner {
    ui: Ui,
}

impl SystemRunner {
    pub fn new(ui: Ui) -> Self {
        Self { ui }
    }
}

fn spawn_error(invocation: &Invocation, err: impl fmt::Display) -> BootstrapError {
    BootstrapError::CommandSpawnFailed {
        command: invocation.to_string(),
        reason: err.to_string(),
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<()> {
        self.ui.command(&invocation.to_string());
        let mut cmd = invocation.to_command();

        // Verbose mode streams child output; otherwise it is captured behind a
        // spinner and only surfaced on failure.
        if self.ui.is_verbose() {
            let status = cmd.status().map_err(|e| spawn_error(invocation, e))?;
            if !status.success() {
                return Err(BootstrapError::CommandFailed {
                    command: invocation.to_string(),
                    reason: status.to_string(),
                });
            }
            return Ok(());
        }

        let spinner = self.ui.spinner(&invocation.to_string());
        let output = cmd.stdin(Stdio::null()).output();
        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }
        let output = output.map_err(|e| spawn_error(invocation, e))?;

        if output.status.success() {
            Ok(())
        } else {
            let tail = stderr_tail(&output.stderr);
            Err(BootstrapError::CommandFailed {
                command: invocation.to_string(),
                reason: if tail.is_empty() {
                    output.status.to_string()
                } else {
                    format!("{}\n{}", output.status, tail)
                },
            })
        }
    }

    fn output(&self, invocation: &Invocation) -> Result<CommandOutput> {
        self.ui.command(&invocation.to_string());
        let output = invocation
            .to_command()
            .stdin(Stdio::null())
            .output()
            .map_err(|e| spawn_error(invocation, e))?;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn spawn(&self, invocation: &Invocation, log_file: &Path) -> Result<Spawned> {
        self.ui.command(&invocation.to_string());
        if let Some(parent) = log_file.parent() {
            fs::create_dir_all(parent).map_err(|e| BootstrapError::write_failed(parent, e))?;
        }
        let log = File::options()
            .create(true)
            .append(true)
            .open(log_file)
            .map_err(|e| BootstrapError::write_failed(log_file, e))?;
        let log_err = log
            .try_clone()
            .map_err(|e| BootstrapError::write_failed(log_file, e))?;

        let mut cmd = invocation.to_command();
        cmd.stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err));

        // Own process group, so a terminal Ctrl-C does not reach the service
        // and `stop` can signal the whole tree.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let child = cmd.spawn().map_err(|e| spawn_error(invocation, e))?;
        Ok(Spawned {
            pid: Some(child.id()),
        })
    }
}

/// Reports what would run without executing anything
pub struct DryRunRunner {
    ui: Ui,
}

impl DryRunRunner {
    pub fn new(ui: Ui) -> Self {
        Self { ui }
    }
}

impl CommandRunner for DryRunRunner {
    fn run(&self, invocation: &Invocation) -> Result<()> {
        self.ui.step(&format!("would run: {}", describe(invocation)));
        Ok(())
    }

    fn output(&self, invocation: &Invocation) -> Result<CommandOutput> {
        self.ui.step(&format!("would query: {}", describe(invocation)));
        Ok(CommandOutput {
            success: true,
            ..CommandOutput::default()
        })
    }

    fn spawn(&self, invocation: &Invocation, log_file: &Path) -> Result<Spawned> {
        self.ui.step(&format!(
            "would start in background: {} (log: {})",
            describe(invocation),
            log_file.display()
        ));
        Ok(Spawned { pid: None })
    }
}

fn describe(invocation: &Invocation) -> String {
    match &invocation.cwd {
        Some(cwd) => format!("{invocation} (in {})", cwd.display()),
        None => invocation.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_invocation_display_quotes_whitespace() {
        let inv = Invocation::shell(". nvm.sh && nvm use 18");
        assert_eq!(inv.to_string(), "bash -c '. nvm.sh && nvm use 18'");
    }

    #[test]
    fn test_invocation_builder() {
        let inv = Invocation::new("npm")
            .args(["run", "start"])
            .current_dir("/work/rpc");
        assert_eq!(inv.args, vec!["run", "start"]);
        assert_eq!(inv.cwd, Some(PathBuf::from("/work/rpc")));
    }

    #[test]
    fn test_stderr_tail_keeps_last_lines() {
        let stderr: String = (0..30).map(|i| format!("line {i}\n")).collect();
        let tail = stderr_tail(stderr.as_bytes());
        assert!(tail.starts_with("line 10"));
        assert!(tail.ends_with("line 29"));
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_reports_failure() {
        let runner = SystemRunner::new(Ui::default());
        let err = runner.run(&Invocation::new("false")).unwrap_err();
        assert!(matches!(err, BootstrapError::CommandFailed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_captures_output() {
        let runner = SystemRunner::new(Ui::default());
        let out = runner
            .output(&Invocation::new("echo").arg("v18.16.1"))
            .unwrap();
        assert!(out.success);
        assert_eq!(out.stdout.trim(), "v18.16.1");
    }

    #[test]
    fn test_system_runner_missing_program() {
        let runner = SystemRunner::new(Ui::default());
        let err = runner
            .output(&Invocation::new("definitely-not-a-real-program-xyz"))
            .unwrap_err();
        assert!(matches!(err, BootstrapError::CommandSpawnFailed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_spawn_writes_log() {
        let temp = TempDir::new().unwrap();
        let log = temp.path().join("logs").join("echo.log");
        let runner = SystemRunner::new(Ui::default());
        let spawned = runner
            .spawn(&Invocation::new("echo").arg("hello"), &log)
            .unwrap();
        assert!(spawned.pid.is_some());
        assert!(log.exists());
    }

    #[test]
    fn test_dry_run_runner_touches_nothing() {
        let temp = TempDir::new().unwrap();
        let log = temp.path().join("logs").join("rpc.log");
        let runner = DryRunRunner::new(Ui::new(false, true));
        let spawned = runner.spawn(&Invocation::new("npm"), &log).unwrap();
        assert_eq!(spawned.pid, None);
        assert!(!log.exists());
        assert!(runner.run(&Invocation::new("npm").arg("ci")).is_ok());
    }
}
