//! Host platform detection
//!
//! The OS identifier follows the shell `$OSTYPE` convention (`linux-gnu`,
//! `darwin23`, ...). It can be passed explicitly; otherwise it is derived
//! from the compile target.

use std::fmt;

use crate::error::{BootstrapError, Result};

/// Platforms the bootstrapper knows how to provision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
}

impl Platform {
    /// Dispatch on an OS identifier. Only `linux-gnu*` and `darwin*` are accepted.
    pub fn from_os_type(os_type: &str) -> Result<Self> {
        if os_type.starts_with("linux-gnu") {
            Ok(Platform::Linux)
        } else if os_type.starts_with("darwin") {
            Ok(Platform::MacOs)
        } else {
            Err(BootstrapError::UnsupportedPlatform {
                os_type: os_type.to_string(),
            })
        }
    }

    /// Resolve the platform from an explicit identifier or the current host
    pub fn detect(os_type: Option<&str>) -> Result<Self> {
        match os_type {
            Some(os) if !os.is_empty() => Self::from_os_type(os),
            _ => Self::from_os_type(&host_os_type()),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Linux => write!(f, "linux"),
            Platform::MacOs => write!(f, "macos"),
        }
    }
}

/// `$OSTYPE`-style identifier for the host this binary was built for
pub fn host_os_type() -> String {
    match std::env::consts::OS {
        "linux" if cfg!(target_env = "gnu") => "linux-gnu".to_string(),
        "macos" => "darwin".to_string(),
        other => other.to_string(),
    }
}
