//! CLI error types
//!
//! Every CLI error ends the process with a non-zero exit after an error
//! envelope is written.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::worker::WorkerError;

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

/// Errors surfaced by CLI commands
#[derive(Debug, Error)]
pub enum CliError {
    /// Coordinator configuration or cluster description rejected
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Writing output or starting the runtime failed
    #[error("I/O error: {0}")]
    Io(String),

    /// Requested node is not part of the cluster
    #[error("Node {0} is not part of the cluster")]
    UnknownNode(u64),

    /// Schema resolution failed
    #[error(transparent)]
    Resolve(#[from] WorkerError),
}

impl CliError {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "AERO_CLI_CONFIG_ERROR",
            Self::Io(_) => "AERO_CLI_IO_ERROR",
            Self::UnknownNode(_) => "AERO_CLI_UNKNOWN_NODE",
            Self::Resolve(_) => "AERO_CLI_RESOLVE_FAILED",
        }
    }

    /// Code of the underlying subsystem error, if any
    pub fn cause_code(&self) -> Option<&'static str> {
        match self {
            Self::Config(err) => Some(err.code()),
            Self::Resolve(err) => Some(err.code()),
            Self::Io(_) | Self::UnknownNode(_) => None,
        }
    }

    /// Message for the error envelope, prefixed with the cause code
    pub fn message(&self) -> String {
        match self.cause_code() {
            Some(code) => format!("{}: {}", code, self),
            None => self.to_string(),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::Io(format!("JSON error: {}", e))
    }
}
