//! Start the stack and wait until it is reachable.

use anyhow::{bail, Result};
use colored::Colorize;
use mooring_core::{DockerLifecycleController, ReadinessState};
use tokio::sync::mpsc;

pub async fn run(controller: &DockerLifecycleController) -> Result<()> {
    let state = controller.probe().await;
    if !matches!(state, ReadinessState::ImagesMissing | ReadinessState::Ready) {
        bail!("environment not ready to start the stack: {}", state);
    }

    println!("{} Starting stack...", "→".cyan().bold());

    let (log_tx, mut log_rx) = mpsc::unbounded_channel::<String>();
    let echo = tokio::spawn(async move {
        while let Some(line) = log_rx.recv().await {
            println!("  {}", line.dimmed());
        }
    });

    let launched = controller.start(&log_tx).await?;
    drop(log_tx);
    let _ = echo.await;

    if launched {
        println!("{} Stack running and reachable", "✓".green().bold());
        Ok(())
    } else {
        bail!("stack failed to start cleanly");
    }
}
