//! Error types for the provisioning harness
//!
//! Every error maps to a stable [`ErrorKind`] so scenario files can assert
//! on failure categories without matching on message text.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the harness
#[derive(Error, Debug)]
pub enum Error {
    // === Provider Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Provisioning failed: {0}")]
    Provisioning(String),

    // === Executor Errors ===
    #[error("Node '{address}' unreachable after {secs} seconds")]
    ConnectTimeout { address: String, secs: u64 },

    #[error("Command '{command}' did not finish within {secs} seconds")]
    ExecTimeout { command: String, secs: u64 },

    // === Teardown Errors ===
    // Logged at the runner boundary, never escalated past it
    #[error("Teardown of group '{group}' failed: {reason}")]
    Teardown { group: String, reason: String },

    // === Assertion Errors ===
    #[error("Assertion failed: {0}")]
    Assertion(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a connect timeout error for a node address
    pub fn connect_timeout(address: &str, secs: u64) -> Self {
        Self::ConnectTimeout {
            address: address.to_string(),
            secs,
        }
    }

    /// Create an exec timeout error for a command
    pub fn exec_timeout(command: &str, secs: u64) -> Self {
        Self::ExecTimeout {
            command: command.to_string(),
            secs,
        }
    }

    /// Create a teardown error for a group
    pub fn teardown(group: &str, reason: &str) -> Self {
        Self::Teardown {
            group: group.to_string(),
            reason: reason.to_string(),
        }
    }

    /// The stable category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidConfiguration(_) => ErrorKind::InvalidConfiguration,
            Error::Provisioning(_) => ErrorKind::Provisioning,
            Error::ConnectTimeout { .. } => ErrorKind::ConnectTimeout,
            Error::ExecTimeout { .. } => ErrorKind::ExecTimeout,
            Error::Teardown { .. } => ErrorKind::Teardown,
            Error::Assertion(_) => ErrorKind::Assertion,
            Error::Config(_) | Error::ConfigParse(_) => ErrorKind::Config,
            _ => ErrorKind::Other,
        }
    }
}

/// Stable error categories, used by `expect_failure` assertions and by the
/// `expect_failure` field of scenario files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidConfiguration,
    Provisioning,
    ConnectTimeout,
    ExecTimeout,
    Teardown,
    Assertion,
    Config,
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidConfiguration => "invalid_configuration",
            ErrorKind::Provisioning => "provisioning",
            ErrorKind::ConnectTimeout => "connect_timeout",
            ErrorKind::ExecTimeout => "exec_timeout",
            ErrorKind::Teardown => "teardown",
            ErrorKind::Assertion => "assertion",
            ErrorKind::Config => "config",
            ErrorKind::Other => "other",
        };
        f.write_str(s)
    }
}
