//! Download the image manifest with a progress bar.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use mooring_core::{
    events, Config, DockerLifecycleController, ProgressState, ReadinessState, SyncEvent,
};
use tokio_util::sync::CancellationToken;

pub async fn run(
    controller: &DockerLifecycleController,
    config: &Config,
    force: bool,
) -> Result<()> {
    let state = controller.probe().await;
    if !matches!(state, ReadinessState::ImagesMissing | ReadinessState::Ready) {
        bail!("environment not ready for image synchronization: {}", state);
    }

    let suffix = if force { " (forced refresh)" } else { "" };
    println!(
        "{} Synchronizing {} image(s){}",
        "→".cyan().bold(),
        config.manifest.len(),
        suffix.dimmed()
    );

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{bar:40.cyan/blue} {pos:>3}% {msg}")
            .context("invalid progress template")?,
    );

    let (tx, mut rx) = events::channel();
    let renderer = {
        let bar = bar.clone();
        tokio::spawn(async move {
            let mut state = ProgressState::default();
            while let Some(event) = rx.recv().await {
                let is_completion = matches!(event, SyncEvent::ImageCompleted { .. });
                state = state.reduce(&event);
                if state.total > 0 {
                    // Layer fractions smooth the bar between image
                    // completions; the reported aggregate stays per-image.
                    let smoothing = if state.layer_fractions.is_empty() {
                        0.0
                    } else {
                        state.layer_fractions.values().sum::<f64>()
                            / state.layer_fractions.len() as f64
                    };
                    let position =
                        (state.completed as f64 + smoothing) / state.total as f64 * 100.0;
                    bar.set_position(position.min(100.0) as u64);
                }
                if is_completion {
                    bar.set_message(state.message.clone());
                }
            }
            state
        })
    };

    let report = controller.sync_images(force, &cancel, &tx).await;
    drop(tx);
    let _ = renderer.await;
    bar.finish_and_clear();

    let report = report.context("image synchronization failed")?;
    if report.cancelled {
        println!(
            "{} Cancelled after {}/{} image(s)",
            "⚠".yellow().bold(),
            report.completed,
            report.total
        );
    } else {
        println!("{} {} image(s) ready", "✓".green().bold(), report.completed);
    }

    Ok(())
}
