//! Configuration schema for Buildy
//!
//! Configuration is stored at `~/.config/buildy/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// HTTP server settings
    pub server: ServerConfig,

    /// Build execution and cache settings
    pub builds: BuildsConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,

    /// Append build events to `<builds.directory>/audit.log`
    pub audit_log: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            audit_log: true,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9000,
        }
    }
}

/// Build configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildsConfig {
    /// Base directory holding one subdirectory per build
    /// (defaults to the state directory)
    pub directory: Option<PathBuf>,

    /// Maximum number of builds tracked in memory
    pub capacity: usize,

    /// Build command run inside the cloned repository
    pub command: String,

    /// Kill builds running longer than this (0 = no limit)
    pub timeout_secs: u64,

    /// How often the sweeper polls tracked builds
    pub poll_interval_secs: u64,
}

impl Default for BuildsConfig {
    fn default() -> Self {
        Self {
            directory: None,
            capacity: 16,
            command: "make".to_string(),
            timeout_secs: 0,
            poll_interval_secs: 5,
        }
    }
}

impl BuildsConfig {
    /// Build timeout, if one is configured
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Interval between sweeper passes
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Config {
    /// Check values that serde cannot express. Returns the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.builds.capacity == 0 {
            return Err("builds.capacity must be at least 1".to_string());
        }
        if self.builds.command.trim().is_empty() {
            return Err("builds.command must not be empty".to_string());
        }
        if self.builds.poll_interval_secs == 0 {
            return Err("builds.poll_interval_secs must be at least 1".to_string());
        }
        if !matches!(self.general.log_format.as_str(), "text" | "json") {
            return Err(format!(
                "general.log_format must be \"text\" or \"json\", got {:?}",
                self.general.log_format
            ));
        }
        Ok(())
    }
}
