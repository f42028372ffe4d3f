//! Error types and handling for the bootstrapper
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//! Every fatal stage maps onto one variant; non-fatal skips never produce an
//! error and are reported as warnings instead.

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for bootstrap operations
#[derive(Error, Diagnostic, Debug)]
pub enum BootstrapError {
    // Toolchain errors
    #[error("Node version manager not found at {path}")]
    #[diagnostic(
        code(bootstrap::toolchain::version_manager_missing),
        help("Install nvm (https://github.com/nvm-sh/nvm) or set NVM_DIR to its location")
    )]
    VersionManagerMissing { path: String },

    #[error("Failed to install {tool}: {reason}")]
    #[diagnostic(code(bootstrap::toolchain::install_failed))]
    ToolchainInstallFailed { tool: String, reason: String },

    // Platform errors
    #[error("Unsupported operating system: {os_type}")]
    #[diagnostic(
        code(bootstrap::platform::unsupported),
        help("Supported OS identifiers: linux-gnu*, darwin*")
    )]
    UnsupportedPlatform { os_type: String },

    // Process errors
    #[error("Command `{command}` failed: {reason}")]
    #[diagnostic(code(bootstrap::process::command_failed))]
    CommandFailed { command: String, reason: String },

    #[error("Failed to start `{command}`: {reason}")]
    #[diagnostic(
        code(bootstrap::process::spawn_failed),
        help("Check that the program is installed and on PATH")
    )]
    CommandSpawnFailed { command: String, reason: String },

    #[error("{service} did not become ready on {address} within {timeout_secs}s")]
    #[diagnostic(
        code(bootstrap::process::readiness_timeout),
        help("Inspect the service log under the base directory's logs/ folder")
    )]
    ReadinessTimeout {
        service: String,
        address: String,
        timeout_secs: u64,
    },

    #[error("No supervision record found at {path}")]
    #[diagnostic(
        code(bootstrap::process::record_not_found),
        help("Run 'bootstrap' first to launch the environment")
    )]
    RecordNotFound { path: String },

    // Repository errors
    #[error("Failed to clone repository: {url}: {reason}")]
    #[diagnostic(
        code(bootstrap::git::clone_failed),
        help("Check that URL is correct and you have access to repository")
    )]
    GitCloneFailed { url: String, reason: String },

    #[error("Failed to install dependencies in {path}: {reason}")]
    #[diagnostic(code(bootstrap::deps::install_failed))]
    DependencyInstallFailed { path: String, reason: String },

    #[error("Failed to link {link} -> {target}: {reason}")]
    #[diagnostic(code(bootstrap::fs::symlink_failed))]
    SymlinkFailed {
        link: String,
        target: String,
        reason: String,
    },

    // Configuration errors
    #[error("Failed to read configuration file: {path}")]
    #[diagnostic(code(bootstrap::config::read_failed))]
    ConfigReadFailed { path: String, reason: String },

    #[error("Failed to parse configuration file: {path}: {reason}")]
    #[diagnostic(code(bootstrap::config::parse_failed))]
    ConfigParseFailed { path: String, reason: String },

    #[error("Invalid argument: {message}")]
    #[diagnostic(code(bootstrap::cli::invalid_argument))]
    InvalidArgument { message: String },

    // File system errors
    #[error("Failed to read file: {path}")]
    #[diagnostic(code(bootstrap::fs::read_failed))]
    FileReadFailed { path: String, reason: String },

    #[error("Failed to write file: {path}")]
    #[diagnostic(code(bootstrap::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },
}

impl BootstrapError {
    /// Build a `FileReadFailed` from a path and the underlying error
    pub fn read_failed(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        Self::FileReadFailed {
            path: path.display().to_string(),
            reason: err.to_string(),
        }
    }

    /// Build a `FileWriteFailed` from a path and the underlying error
    pub fn write_failed(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        Self::FileWriteFailed {
            path: path.display().to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for BootstrapError {
    fn from(err: serde_yaml::Error) -> Self {
        BootstrapError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for BootstrapError {
    fn from(err: serde_json::Error) -> Self {
        BootstrapError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, BootstrapError>;
