use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "mooring")]
#[command(about = "Launch and supervise the local application stack", long_about = None)]
struct Cli {
    /// Path to the launcher configuration file
    #[arg(short, long, default_value = "mooring.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show whether the local environment can run the stack
    Status,

    /// Download the required images
    Pull {
        /// Re-download images even when they are already present
        #[arg(short, long)]
        force: bool,
    },

    /// Start the stack and wait for it to become reachable
    Up,

    /// Stop the stack
    Down,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    let config = mooring_core::Config::load(&cli.config)?;
    let controller = mooring_core::DockerLifecycleController::new(config.clone())?;

    match cli.command {
        Commands::Status => commands::status::run(&controller).await,
        Commands::Pull { force } => commands::pull::run(&controller, &config, force).await,
        Commands::Up => commands::up::run(&controller).await,
        Commands::Down => commands::down::run(&controller).await,
    }
}
