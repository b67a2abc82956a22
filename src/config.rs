//! Coordinator Configuration
//!
//! Loaded from a JSON file, immutable after startup. Every field has a
//! default, so `{}` is a valid configuration.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::Severity;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid JSON for this structure
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// Values parsed but are not usable
    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "AERO_CONFIG_IO",
            Self::Parse(_) => "AERO_CONFIG_PARSE",
            Self::Invalid(_) => "AERO_CONFIG_INVALID",
        }
    }
}

/// Coordinator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Identity of this node, used in logs (default: 1)
    #[serde(default = "default_node_id")]
    pub node_id: u64,

    /// Deadline applied to contexts created by the front end (default: none)
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,

    /// Minimum log severity: trace, info, warn or error (default: info)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_node_id() -> u64 {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            request_timeout_ms: None,
            log_level: default_log_level(),
        }
    }
}

impl CoordinatorConfig {
    /// Load and validate configuration from a file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse and validate configuration from JSON text
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: CoordinatorConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.node_id == 0 {
            return Err(ConfigError::Invalid("node_id must be > 0".to_string()));
        }
        if self.request_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "request_timeout_ms must be > 0 when set".to_string(),
            ));
        }
        if Severity::parse(&self.log_level).is_none() {
            return Err(ConfigError::Invalid(format!(
                "Invalid log_level: '{}'",
                self.log_level
            )));
        }
        Ok(())
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Request timeout as a duration
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Parsed log severity, `Info` if the name is not recognised
    pub fn severity(&self) -> Severity {
        Severity::parse(&self.log_level).unwrap_or(Severity::Info)
    }
}
