//! Runtime probe: is a container engine installed and is its daemon up?
//!
//! The probe runs three short-lived external processes in order (engine CLI,
//! compose CLI, daemon info query) and reduces the outcome to a single
//! `ReadinessState`. Every failure is recoverable: the caller re-probes
//! after the user remediates.

use crate::config::Config;
use crate::types::{Platform, ReadinessState};
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Seam for the probe's external process execution.
#[async_trait]
pub trait EngineCommands: Send + Sync {
    /// Returns true only when the command spawned and exited with status
    /// zero. A missing binary is a plain `false`, not an error.
    async fn succeeds(&self, bin: &str, args: &[&str]) -> bool;
}

/// Default implementation spawning real processes through tokio.
pub struct ProcessCommands;

#[async_trait]
impl EngineCommands for ProcessCommands {
    async fn succeeds(&self, bin: &str, args: &[&str]) -> bool {
        match Command::new(bin)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
        {
            Ok(status) => status.success(),
            Err(_) => false,
        }
    }
}

/// Probes the local environment for a usable container runtime.
pub struct RuntimeProbe {
    platform: Platform,
    engine_bin: String,
    compose_bin: String,
    commands: Arc<dyn EngineCommands>,
}

impl RuntimeProbe {
    /// Create a probe for the current host platform.
    pub fn new(config: &Config) -> Self {
        Self::with_commands(Platform::current(), config, Arc::new(ProcessCommands))
    }

    /// Create a probe with an explicit platform and command runner.
    pub fn with_commands(
        platform: Platform,
        config: &Config,
        commands: Arc<dyn EngineCommands>,
    ) -> Self {
        Self {
            platform,
            engine_bin: config.engine_bin.clone(),
            compose_bin: config.compose_bin.clone(),
            commands,
        }
    }

    /// Determine the readiness of the local container runtime.
    ///
    /// An unsupported platform short-circuits before any external process
    /// runs. On supported platforms the checks run in order:
    ///
    /// 1. engine CLI invocable, else `RuntimeAbsent`
    /// 2. compose CLI invocable, else `RuntimeAbsent`
    /// 3. daemon info query, non-zero means `RuntimeNotRunning`
    ///
    /// Success reports `ImagesMissing`: image presence is the
    /// synchronizer's job, so this is an intermediate state, not a final
    /// verdict.
    #[instrument(skip(self), fields(platform = %self.platform))]
    pub async fn probe(&self) -> ReadinessState {
        if !self.platform.supported() {
            debug!("platform has no engine connection entry, skipping checks");
            return ReadinessState::PlatformUnsupported;
        }

        if !self.commands.succeeds(&self.engine_bin, &["--version"]).await {
            debug!(bin = %self.engine_bin, "engine CLI not invocable");
            return ReadinessState::RuntimeAbsent;
        }

        if !self.commands.succeeds(&self.compose_bin, &["--version"]).await {
            debug!(bin = %self.compose_bin, "compose CLI not invocable");
            return ReadinessState::RuntimeAbsent;
        }

        if !self.commands.succeeds(&self.engine_bin, &["info"]).await {
            debug!("daemon info query failed");
            return ReadinessState::RuntimeNotRunning;
        }

        ReadinessState::ImagesMissing
    }
}
