//! Configuration management.

use crate::error::{MooringError, Result};
use crate::types::ImageReference;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Persistent configuration for the stack launcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Container engine CLI binary probed for availability.
    pub engine_bin: String,
    /// Compose-equivalent CLI binary used to drive the stack.
    pub compose_bin: String,
    /// Compose project name; scoping makes repeated starts idempotent at the
    /// orchestrator level.
    pub project_name: String,
    /// Working directory the orchestrator is invoked from (where the compose
    /// file and service configuration live).
    pub compose_dir: PathBuf,
    /// Environment variable carrying the resolved local address, injected
    /// into the orchestrator for the managed services to advertise on.
    pub advertise_env: String,
    /// Path component of the liveness endpoint, without leading slash.
    pub health_path: String,
    /// Seconds between liveness poll attempts.
    pub health_poll_interval_secs: u64,
    /// Maximum number of liveness poll attempts per start.
    pub health_poll_attempts: u32,
    /// Required images, in pull order. Immutable during a sync pass.
    pub manifest: Vec<ImageReference>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine_bin: "docker".to_string(),
            compose_bin: "docker-compose".to_string(),
            project_name: "mooring".to_string(),
            compose_dir: PathBuf::from("."),
            advertise_env: "HOST_IP".to_string(),
            health_path: "status".to_string(),
            health_poll_interval_secs: 5,
            health_poll_attempts: 10,
            manifest: vec![
                ImageReference::parse("mongo:6"),
                ImageReference::parse("redis:alpine"),
                ImageReference::parse("rabbitmq:3-alpine"),
                ImageReference::parse("nginx:alpine"),
            ],
        }
    }
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults when
    /// the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| MooringError::IoError { path: path.to_path_buf(), source: e })?;
        serde_json::from_str(&content).map_err(|e| MooringError::InvalidConfig {
            reason: format!("Failed to parse config: {}", e),
        })
    }

    /// Save configuration to disk.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| MooringError::IoError { path: parent.to_path_buf(), source: e })?;
        }
        let content = serde_json::to_string_pretty(self).map_err(|e| MooringError::InvalidConfig {
            reason: format!("Failed to serialize config: {}", e),
        })?;
        std::fs::write(path, content)
            .map_err(|e| MooringError::IoError { path: path.to_path_buf(), source: e })
    }

    /// The liveness URL polled after stack startup.
    pub fn health_url(&self, address: Ipv4Addr) -> String {
        format!("http://{}/{}", address, self.health_path.trim_start_matches('/'))
    }

    /// Interval between liveness poll attempts.
    pub fn health_poll_interval(&self) -> Duration {
        Duration::from_secs(self.health_poll_interval_secs)
    }
}
