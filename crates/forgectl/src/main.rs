//! forgectl - StudyForge progress tracker CLI
//!
//! Loads the configuration, opens the learner's progress store and runs one
//! command against it.

use anyhow::Result;
use clap::Parser;
use forge_common::ForgeConfig;
use forgectl::cli::Cli;
use forgectl::commands;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ForgeConfig::load()?;
    init_logging(&config.logging.level);

    commands::run(cli, config).await
}

/// RUST_LOG wins; otherwise the configured level
fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
