//! Supabase work runner
//!
//! Runs a single storage or database operation as a work component.

mod cli;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, CommandWork};
use supabase_work::{launch, WorkConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();

    // Initialize logging on stderr; stdout carries command output and prompts
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting supabase-work v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();

    let config = match &cli.work_config {
        Some(path) => WorkConfig::load_from(path)?,
        None => WorkConfig::load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load work config, using defaults: {}", e);
            WorkConfig::default()
        }),
    };

    let mut work = CommandWork::new(config, cli.command, cli.yes);
    launch(&mut work).await
}
