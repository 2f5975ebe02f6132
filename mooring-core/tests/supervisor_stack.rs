//! Stack supervisor behavior over scripted orchestrator and health doubles.

use async_trait::async_trait;
use mooring_core::error::{MooringError, Result};
use mooring_core::supervisor::{HealthProbe, LogSender, Orchestrator, StackSupervisor};
use mooring_core::types::StackHandle;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

struct FakeOrchestrator {
    exit_code: i32,
    lines: Vec<String>,
    fail_stop: bool,
    stop_calls: Arc<AtomicU32>,
}

impl FakeOrchestrator {
    fn exiting_with(exit_code: i32) -> Self {
        Self { exit_code, lines: Vec::new(), fail_stop: false, stop_calls: Arc::default() }
    }
}

#[async_trait]
impl Orchestrator for FakeOrchestrator {
    async fn up(&self, _env: &[(String, String)], logs: &LogSender) -> Result<StackHandle> {
        for line in &self.lines {
            let _ = logs.send(line.clone());
        }
        Ok(StackHandle {
            pid: Some(4242),
            exit_code: Some(self.exit_code),
            output_lines: self.lines.clone(),
        })
    }

    async fn stop(&self) -> Result<()> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_stop {
            return Err(MooringError::Internal("orchestrator binary missing".to_string()));
        }
        Ok(())
    }
}

/// Health double that answers after a fixed number of attempts.
struct FakeProbe {
    succeed_at: u32,
    calls: AtomicU32,
}

impl FakeProbe {
    fn reachable() -> Self {
        Self { succeed_at: 1, calls: AtomicU32::new(0) }
    }

    fn never_reachable() -> Self {
        Self { succeed_at: u32::MAX, calls: AtomicU32::new(0) }
    }
}

#[async_trait]
impl HealthProbe for FakeProbe {
    async fn check(&self) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst) + 1 >= self.succeed_at
    }
}

fn supervisor(
    orchestrator: FakeOrchestrator,
    probe: FakeProbe,
) -> StackSupervisor<FakeOrchestrator, FakeProbe> {
    StackSupervisor::new(orchestrator, probe, Duration::from_millis(1), 3)
}

fn log_channel() -> (LogSender, mpsc::UnboundedReceiver<String>) {
    mpsc::unbounded_channel()
}

#[tokio::test]
async fn clean_exit_and_reachable_endpoint_is_success() {
    let supervisor = supervisor(FakeOrchestrator::exiting_with(0), FakeProbe::reachable());
    let (logs, _rx) = log_channel();
    assert!(supervisor.start(vec![], &logs).await.unwrap());
}

#[tokio::test]
async fn clean_exit_with_exhausted_poll_budget_is_still_success() {
    // Reachability confirms, it never vetoes: the budget runs out but the
    // orchestrator exited cleanly.
    let supervisor = supervisor(FakeOrchestrator::exiting_with(0), FakeProbe::never_reachable());
    let (logs, _rx) = log_channel();
    assert!(supervisor.start(vec![], &logs).await.unwrap());
}

#[tokio::test]
async fn dirty_exit_fails_even_when_endpoint_answers() {
    let supervisor = supervisor(FakeOrchestrator::exiting_with(1), FakeProbe::reachable());
    let (logs, _rx) = log_channel();
    assert!(!supervisor.start(vec![], &logs).await.unwrap());
}

#[tokio::test]
async fn dirty_exit_with_unreachable_endpoint_fails() {
    let supervisor = supervisor(FakeOrchestrator::exiting_with(1), FakeProbe::never_reachable());
    let (logs, _rx) = log_channel();
    assert!(!supervisor.start(vec![], &logs).await.unwrap());
}

#[tokio::test]
async fn poll_stops_on_first_successful_attempt() {
    let probe = FakeProbe { succeed_at: 2, calls: AtomicU32::new(0) };
    let supervisor = StackSupervisor::new(
        FakeOrchestrator::exiting_with(0),
        probe,
        Duration::from_millis(1),
        10,
    );
    let (logs, _rx) = log_channel();
    assert!(supervisor.start(vec![], &logs).await.unwrap());
}

#[tokio::test]
async fn output_lines_are_forwarded_in_order() {
    let mut orchestrator = FakeOrchestrator::exiting_with(0);
    orchestrator.lines =
        vec!["Creating network".to_string(), "Starting proxy ... done".to_string()];
    let expected = orchestrator.lines.clone();

    let supervisor = supervisor(orchestrator, FakeProbe::reachable());
    let (logs, mut rx) = log_channel();
    supervisor.start(vec![], &logs).await.unwrap();
    drop(logs);

    let mut received = Vec::new();
    while let Some(line) = rx.recv().await {
        received.push(line);
    }
    assert_eq!(received, expected);
}

#[tokio::test]
async fn stop_never_propagates_an_error() {
    let stop_calls = Arc::new(AtomicU32::new(0));
    let orchestrator = FakeOrchestrator {
        exit_code: 0,
        lines: Vec::new(),
        fail_stop: true,
        stop_calls: stop_calls.clone(),
    };
    let supervisor = supervisor(orchestrator, FakeProbe::reachable());

    // Returns unit: the failure is swallowed and logged.
    supervisor.stop().await;
    assert_eq!(stop_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn stop_is_idempotent() {
    let stop_calls = Arc::new(AtomicU32::new(0));
    let orchestrator = FakeOrchestrator {
        exit_code: 0,
        lines: Vec::new(),
        fail_stop: false,
        stop_calls: stop_calls.clone(),
    };
    let supervisor = supervisor(orchestrator, FakeProbe::reachable());

    supervisor.stop().await;
    supervisor.stop().await;
    assert_eq!(stop_calls.load(Ordering::SeqCst), 2);
}
