//! Stack supervisor: bring the multi-service stack up and down as one unit.
//!
//! The orchestrator CLI runs as a foreground-attached child with
//! project-scoped naming, so repeated starts are idempotent at the
//! orchestrator level. Combined output streams to an observer channel
//! line-by-line; after exit a bounded health poll confirms reachability.

use crate::config::Config;
use crate::error::{MooringError, Result};
use crate::types::StackHandle;
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, instrument, warn};

/// Sender for orchestrator output lines.
pub type LogSender = UnboundedSender<String>;

/// Seam for the external orchestrator process.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// Bring the stack up, streaming combined output over `logs`, and wait
    /// for the process to exit.
    async fn up(&self, env: &[(String, String)], logs: &LogSender) -> Result<StackHandle>;

    /// Stop the project-scoped stack and wait for the subcommand to exit.
    async fn stop(&self) -> Result<()>;
}

/// Seam for the liveness endpoint.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// One reachability attempt; any non-error response is success.
    async fn check(&self) -> bool;
}

enum HealthTarget {
    Fixed(String),
    /// Resolve the local address per attempt; by the time the poll runs the
    /// supervisor has already resolved (and cached) it for env injection.
    LocalAddress { path: String },
}

/// Liveness probe over plain HTTP GET.
pub struct HttpHealthProbe {
    target: HealthTarget,
    client: reqwest::Client,
}

impl HttpHealthProbe {
    /// Probe a fixed URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self { target: HealthTarget::Fixed(url.into()), client: reqwest::Client::new() }
    }

    /// Probe `http://<local address>/<path>`.
    pub fn local(path: impl Into<String>) -> Self {
        Self { target: HealthTarget::LocalAddress { path: path.into() }, client: reqwest::Client::new() }
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn check(&self) -> bool {
        let url = match &self.target {
            HealthTarget::Fixed(url) => url.clone(),
            HealthTarget::LocalAddress { path } => match crate::context::local_ipv4() {
                Ok(address) => format!("http://{}/{}", address, path.trim_start_matches('/')),
                Err(_) => return false,
            },
        };
        match self.client.get(&url).send().await {
            Ok(response) => response.error_for_status().is_ok(),
            Err(_) => false,
        }
    }
}

/// Real orchestrator: the compose CLI invoked as a child process.
pub struct ComposeCli {
    compose_bin: String,
    project_name: String,
    workdir: std::path::PathBuf,
}

impl ComposeCli {
    pub fn new(config: &Config) -> Self {
        Self {
            compose_bin: config.compose_bin.clone(),
            project_name: config.project_name.clone(),
            workdir: config.compose_dir.clone(),
        }
    }
}

/// Forward lines from one child stream to the observer and the handle's
/// combined output. Interleaving with the sibling stream is best-effort.
async fn forward_lines<R: AsyncRead + Unpin>(
    reader: R,
    logs: LogSender,
    collected: Arc<Mutex<Vec<String>>>,
) {
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if let Ok(mut sink) = collected.lock() {
            sink.push(line.clone());
        }
        let _ = logs.send(line);
    }
}

#[async_trait]
impl Orchestrator for ComposeCli {
    #[instrument(skip(self, env, logs), fields(project = %self.project_name))]
    async fn up(&self, env: &[(String, String)], logs: &LogSender) -> Result<StackHandle> {
        let mut command = Command::new(&self.compose_bin);
        command
            .args(["-p", &self.project_name, "up", "-d"])
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in env {
            command.env(key, value);
        }

        let mut child = command.spawn().map_err(|e| MooringError::StackStartFailed {
            reason: format!("Failed to spawn {}: {}", self.compose_bin, e),
        })?;

        let pid = child.id();
        let collected = Arc::new(Mutex::new(Vec::new()));
        let mut readers = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            readers.push(tokio::spawn(forward_lines(stdout, logs.clone(), collected.clone())));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(tokio::spawn(forward_lines(stderr, logs.clone(), collected.clone())));
        }

        let status = child.wait().await.map_err(|e| MooringError::StackStartFailed {
            reason: format!("Failed to wait for {}: {}", self.compose_bin, e),
        })?;
        for reader in readers {
            let _ = reader.await;
        }

        let output_lines = collected.lock().map(|lines| lines.clone()).unwrap_or_default();
        info!(exit_code = ?status.code(), lines = output_lines.len(), "orchestrator exited");

        Ok(StackHandle { pid, exit_code: status.code(), output_lines })
    }

    #[instrument(skip(self), fields(project = %self.project_name))]
    async fn stop(&self) -> Result<()> {
        let status = Command::new(&self.compose_bin)
            .args(["-p", &self.project_name, "stop"])
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(MooringError::internal)?;

        if !status.success() {
            return Err(MooringError::Internal(format!(
                "{} stop exited with {:?}",
                self.compose_bin,
                status.code()
            )));
        }
        Ok(())
    }
}

/// Final verdict for a start attempt.
///
/// A clean process exit is required. Endpoint reachability is best-effort
/// confirmation, not a hard gate: an exhausted poll budget does not veto an
/// otherwise clean start. Deliberately not a strict AND of both inputs.
pub fn start_verdict(exited_cleanly: bool, _endpoint_reached: bool) -> bool {
    exited_cleanly
}

/// Starts and stops the stack through an [`Orchestrator`], confirming
/// startup with a bounded health poll.
pub struct StackSupervisor<O, H> {
    orchestrator: O,
    health: H,
    poll_interval: Duration,
    poll_attempts: u32,
}

impl<O: Orchestrator, H: HealthProbe> StackSupervisor<O, H> {
    pub fn new(orchestrator: O, health: H, poll_interval: Duration, poll_attempts: u32) -> Self {
        Self { orchestrator, health, poll_interval, poll_attempts }
    }

    /// Bring the stack up and wait for it to become reachable.
    ///
    /// `env` carries the resolved local address for the managed services to
    /// advertise themselves on. The returned boolean is the
    /// [`start_verdict`] of the orchestrator exit and the health poll.
    #[instrument(skip(self, env, logs))]
    pub async fn start(&self, env: Vec<(String, String)>, logs: &LogSender) -> Result<bool> {
        let handle = self.orchestrator.up(&env, logs).await?;
        let exited_cleanly = handle.exited_cleanly();

        let endpoint_reached = self.poll_health().await;
        if !endpoint_reached {
            warn!(
                attempts = self.poll_attempts,
                "health endpoint never answered within the attempt budget"
            );
        }

        Ok(start_verdict(exited_cleanly, endpoint_reached))
    }

    /// Stop the stack. Best-effort: failures are logged and swallowed,
    /// since "already stopped" is an expected, non-exceptional case.
    pub async fn stop(&self) {
        if let Err(error) = self.orchestrator.stop().await {
            warn!(%error, "stack stop failed, assuming already stopped");
        }
    }

    async fn poll_health(&self) -> bool {
        for attempt in 1..=self.poll_attempts {
            if self.health.check().await {
                info!(attempt, "health endpoint reachable");
                return true;
            }
            debug!(attempt, "health endpoint not reachable yet");
            if attempt < self.poll_attempts {
                tokio::time::sleep(self.poll_interval).await;
            }
        }
        false
    }
}
