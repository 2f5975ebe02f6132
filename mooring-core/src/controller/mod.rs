//! The lifecycle controller: a small state machine over runtime
//! availability that drives the local environment toward "stack running
//! and reachable".
//!
//! One logical controller is accessed by one caller at a time. There is no
//! internal locking beyond a state mutex and the single-flight guard:
//! overlapping `sync`/`start`/`stop` invocations fail fast with
//! `OperationInProgress` instead of racing.

use crate::config::Config;
use crate::context;
use crate::engine::{DockerImageStore, ImageStore};
use crate::error::{MooringError, Result};
use crate::events::EventSender;
use crate::probe::RuntimeProbe;
use crate::supervisor::{
    ComposeCli, HealthProbe, HttpHealthProbe, LogSender, Orchestrator, StackSupervisor,
};
use crate::sync::{ImageSynchronizer, SyncReport, SyncRequest};
use crate::types::{Platform, ReadinessState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// Controller wired to the real engine, compose CLI, and HTTP health
/// endpoint.
pub type DockerLifecycleController =
    LifecycleController<DockerImageStore, ComposeCli, HttpHealthProbe>;

impl DockerLifecycleController {
    /// Build a controller for the current host platform.
    ///
    /// On a platform without an engine connection entry the image store is
    /// absent and the controller latches `PlatformUnsupported`; probing
    /// still works so the host can render the state.
    pub fn new(config: Config) -> Result<Self> {
        let platform = Platform::current();
        let store = if platform.supported() {
            Some(DockerImageStore::connect(&platform)?)
        } else {
            None
        };
        let probe = RuntimeProbe::new(&config);
        let supervisor = StackSupervisor::new(
            ComposeCli::new(&config),
            HttpHealthProbe::local(config.health_path.clone()),
            config.health_poll_interval(),
            config.health_poll_attempts,
        );
        Ok(Self::with_parts(config, platform, probe, store, supervisor))
    }
}

/// Lifecycle controller over injectable collaborators.
pub struct LifecycleController<S, O, H> {
    config: Config,
    platform: Platform,
    runtime_probe: RuntimeProbe,
    store: Option<S>,
    supervisor: StackSupervisor<O, H>,
    state: Mutex<ReadinessState>,
    in_flight: AtomicBool,
}

/// Releases the single-flight guard when the operation finishes.
struct OpGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for OpGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl<S: ImageStore, O: Orchestrator, H: HealthProbe> LifecycleController<S, O, H> {
    /// Assemble a controller from explicit parts. `store` is `None` only
    /// for platforms lacking an engine connection entry.
    pub fn with_parts(
        config: Config,
        platform: Platform,
        runtime_probe: RuntimeProbe,
        store: Option<S>,
        supervisor: StackSupervisor<O, H>,
    ) -> Self {
        let initial = if platform.supported() {
            // Most conservative pre-probe assumption on a supported host.
            ReadinessState::RuntimeAbsent
        } else {
            ReadinessState::PlatformUnsupported
        };
        Self {
            config,
            platform,
            runtime_probe,
            store,
            supervisor,
            state: Mutex::new(initial),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Current readiness assessment.
    pub fn state(&self) -> ReadinessState {
        *self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_state(&self, next: ReadinessState) {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if *state != next {
            info!(from = %state, to = %next, "readiness state changed");
            *state = next;
        }
    }

    fn begin(&self, operation: &str) -> Result<OpGuard<'_>> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(MooringError::OperationInProgress { operation: operation.to_string() });
        }
        Ok(OpGuard { flag: &self.in_flight })
    }

    fn ensure_supported(&self) -> Result<()> {
        if !self.platform.supported() || self.state() == ReadinessState::PlatformUnsupported {
            return Err(MooringError::PlatformUnsupported { platform: self.platform.to_string() });
        }
        Ok(())
    }

    /// Re-assess runtime availability.
    ///
    /// `PlatformUnsupported`, once observed, is latched for the process
    /// lifetime: later probes return it without re-checking anything.
    pub async fn probe(&self) -> ReadinessState {
        if self.state() == ReadinessState::PlatformUnsupported {
            return ReadinessState::PlatformUnsupported;
        }
        let next = self.runtime_probe.probe().await;
        self.set_state(next);
        next
    }

    /// Synchronize the image manifest, emitting progress events.
    ///
    /// The manifest is snapshotted into an immutable request for the pass.
    /// A completed (non-cancelled) pass transitions to `Ready`.
    #[instrument(skip(self, cancel, events))]
    pub async fn sync_images(
        &self,
        force_refresh: bool,
        cancel: &CancellationToken,
        events: &EventSender,
    ) -> Result<SyncReport> {
        let _guard = self.begin("sync")?;
        self.ensure_supported()?;
        let store = self.store.as_ref().ok_or_else(|| MooringError::PlatformUnsupported {
            platform: self.platform.to_string(),
        })?;

        let request = SyncRequest { manifest: self.config.manifest.clone(), force_refresh };
        let report = ImageSynchronizer::new(store).sync(&request, cancel, events).await?;

        if !report.cancelled {
            self.set_state(ReadinessState::Ready);
        }
        Ok(report)
    }

    /// Start the stack and confirm reachability.
    ///
    /// The resolved local address is injected for the managed services to
    /// advertise on; `NoAddressFound` surfaces here because no readiness
    /// state represents a missing network.
    #[instrument(skip(self, logs))]
    pub async fn start(&self, logs: &LogSender) -> Result<bool> {
        let _guard = self.begin("start")?;
        self.ensure_supported()?;

        let address = context::local_ipv4()?;
        let env = vec![(self.config.advertise_env.clone(), address.to_string())];

        let launched = self.supervisor.start(env, logs).await?;
        if launched {
            self.set_state(ReadinessState::Running);
        }
        Ok(launched)
    }

    /// Stop the stack. Best-effort: the only possible error is the
    /// single-flight guard; orchestrator failures are swallowed and logged
    /// by the supervisor.
    pub async fn stop(&self) -> Result<()> {
        let _guard = self.begin("stop")?;
        self.supervisor.stop().await;
        if self.state() == ReadinessState::Running {
            self.set_state(ReadinessState::Ready);
        }
        Ok(())
    }
}
