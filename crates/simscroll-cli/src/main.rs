use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use simscroll_core::AppConfig;

mod commands;

#[derive(Parser)]
#[command(name = "simscroll")]
#[command(author, version, about = "Scroll-wheel support for the iOS Simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file to use instead of the default location
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect the configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Drive the scroll engine with a recorded event trace
    Replay {
        /// Trace file (JSON)
        trace: PathBuf,
        /// Use the real window server and post events to the system (macOS)
        #[arg(long)]
        live: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the configuration file path
    Path,
    /// Print the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Path => commands::config::path(cli.config.as_deref()),
            ConfigAction::Show => commands::config::show(&config),
        },
        Commands::Replay { trace, live } => commands::replay::run(config, &trace, live).await,
    }
}
