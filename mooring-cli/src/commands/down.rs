//! Stop the stack.

use anyhow::Result;
use colored::Colorize;
use mooring_core::DockerLifecycleController;

pub async fn run(controller: &DockerLifecycleController) -> Result<()> {
    controller.stop().await?;
    println!("{} Stack stopped", "✓".green().bold());
    Ok(())
}
