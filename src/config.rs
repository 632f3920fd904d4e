//! Agent configuration.
//!
//! Loaded from `~/.config/virtagent/agent.toml`:
//!
//! ```toml
//! socket_path = "/run/virtagent.sock"
//! scripts_dir = "/usr/libexec/virtagent"
//! script_timeout_ms = 120000
//! virsh_path = "virsh"
//! ```
//!
//! A missing file is not an error; defaults apply. CLI flags override file
//! values in the binary.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default control socket path.
pub const DEFAULT_SOCKET_PATH: &str = "/run/virtagent.sock";
/// Default directory holding the agent's helper scripts.
pub const DEFAULT_SCRIPTS_DIR: &str = "/usr/libexec/virtagent";
/// Default timeout for helper scripts.
pub const DEFAULT_SCRIPT_TIMEOUT_MS: u64 = 120_000;

/// Agent configuration loaded from `~/.config/virtagent/agent.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Unix socket the agent listens on.
    #[serde(default = "default_socket_path")]
    pub socket_path: PathBuf,
    /// Directory holding helper scripts (backup, password rotation, router proxy).
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: PathBuf,
    /// Timeout applied to helper script invocations.
    #[serde(default = "default_script_timeout_ms")]
    pub script_timeout_ms: u64,
    /// Path of the virsh binary.
    #[serde(default = "default_virsh_path")]
    pub virsh_path: PathBuf,
}

fn default_socket_path() -> PathBuf {
    PathBuf::from(DEFAULT_SOCKET_PATH)
}

fn default_scripts_dir() -> PathBuf {
    PathBuf::from(DEFAULT_SCRIPTS_DIR)
}

fn default_script_timeout_ms() -> u64 {
    DEFAULT_SCRIPT_TIMEOUT_MS
}

fn default_virsh_path() -> PathBuf {
    PathBuf::from("virsh")
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            scripts_dir: default_scripts_dir(),
            script_timeout_ms: default_script_timeout_ms(),
            virsh_path: default_virsh_path(),
        }
    }
}

impl AgentConfig {
    /// Load configuration from the default path, or an explicit override.
    ///
    /// A missing file yields defaults.
    pub fn load(path: Option<&std::path::Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            tracing::debug!(
                path = %config_path.display(),
                "config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            Error::config(
                "load",
                format!("failed to read {}: {}", config_path.display(), e),
            )
        })?;

        let config: Self = toml::from_str(&contents).map_err(|e| {
            Error::config(
                "parse",
                format!("failed to parse {}: {}", config_path.display(), e),
            )
        })?;

        tracing::debug!(path = %config_path.display(), "loaded agent configuration");
        Ok(config)
    }

    /// Get the default configuration file path.
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::config("load", "no config directory found".to_string()))?;
        Ok(config_dir.join("virtagent").join("agent.toml"))
    }
}
