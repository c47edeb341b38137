//! # Node Configuration
//!
//! Runtime parameters for one exchange-engine node, loaded from an optional
//! JSON file with environment overrides. Every field has a sane default so a
//! bare `node-runtime` invocation works out of the box.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Environment variable overriding the node address.
pub const ENV_NODE_ADDRESS: &str = "OCPP_NODE_ADDRESS";
/// Environment variable overriding the default request timeout (seconds).
pub const ENV_DEFAULT_TIMEOUT: &str = "OCPP_DEFAULT_TIMEOUT_SECS";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// The offending path.
        path: String,
        /// The underlying I/O failure.
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for this shape.
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        /// The offending path.
        path: String,
        /// The underlying decode failure.
        source: serde_json::Error,
    },

    /// The node address is empty.
    #[error("Node address must not be empty")]
    EmptyAddress,

    /// The default timeout is zero.
    #[error("Default request timeout must be non-zero")]
    ZeroTimeout,

    /// An environment override is not parseable.
    #[error("Environment variable {name} is not a valid value: {value}")]
    InvalidEnvOverride {
        /// The variable name.
        name: &'static str,
        /// The rejected value.
        value: String,
    },
}

/// Complete node configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodeConfig {
    /// This node's own network address.
    pub address: String,
    /// Default wall-clock deadline for outbound requests, in seconds.
    pub default_timeout_secs: u64,
    /// Per-subscriber capacity of the exchange event bus.
    pub channel_capacity: usize,
    /// Fallback log filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            address: "station".to_owned(),
            default_timeout_secs: 30,
            channel_capacity: shared_bus::DEFAULT_CHANNEL_CAPACITY,
            log_filter: "info".to_owned(),
        }
    }
}

impl NodeConfig {
    /// Load configuration: defaults, then the optional file, then
    /// environment overrides. The result is validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        info!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    /// Apply `OCPP_NODE_ADDRESS` and `OCPP_DEFAULT_TIMEOUT_SECS`.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(address) = std::env::var(ENV_NODE_ADDRESS) {
            info!(address = %address, "Node address overridden from environment");
            self.address = address;
        }
        if let Ok(raw) = std::env::var(ENV_DEFAULT_TIMEOUT) {
            self.default_timeout_secs =
                raw.parse()
                    .map_err(|_| ConfigError::InvalidEnvOverride {
                        name: ENV_DEFAULT_TIMEOUT,
                        value: raw,
                    })?;
        }
        Ok(())
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.address.trim().is_empty() {
            return Err(ConfigError::EmptyAddress);
        }
        if self.default_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    /// The default request timeout as a `Duration`.
    #[must_use]
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }
}
