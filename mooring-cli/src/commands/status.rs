//! Show the controller's readiness assessment.

use anyhow::Result;
use colored::Colorize;
use mooring_core::{context, types::Platform, DockerLifecycleController, ReadinessState};

pub async fn run(controller: &DockerLifecycleController) -> Result<()> {
    let state = controller.probe().await;

    match state {
        ReadinessState::Ready | ReadinessState::Running => {
            println!("{} {}", "✓".green().bold(), state.to_string().green());
        }
        ReadinessState::ImagesMissing => {
            println!("{} {}", "→".cyan().bold(), state);
            println!("{}", "Run 'mooring pull' to download the required images".dimmed());
        }
        ReadinessState::RuntimeNotRunning => {
            println!("{} {}", "⚠".yellow().bold(), state.to_string().yellow());
            println!("{}", "Start the container engine and try again".dimmed());
        }
        ReadinessState::RuntimeAbsent | ReadinessState::PlatformUnsupported => {
            println!("{} {}", "✗".red().bold(), state.to_string().red());
            let url = context::engine_download_url(&Platform::current());
            println!("{} {}", "Install the container engine:".dimmed(), url);
        }
    }

    Ok(())
}
