// AutoSpec
// Main entry point for the autospec binary

use anyhow::Context;
use clap::Parser;
use autospec_engine::cli::Cli;
use autospec_engine::config::Config;
use autospec_engine::handlers::{handle_ask, handle_repl};
use autospec_engine::telemetry::init_telemetry_with_level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration (or use custom path if provided)
    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        Config::load_or_create().context("Failed to load config")?
    };

    // --log wins over the config file; RUST_LOG wins over both
    let log_level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(log_level);

    let version = env!("CARGO_PKG_VERSION");
    let commit = env!("GIT_COMMIT_HASH");
    let timestamp = env!("BUILD_TIMESTAMP");

    tracing::info!("AutoSpec v{} ({} - {})", version, commit, timestamp);
    tracing::debug!("Workspace: {}", config.core.workspace.display());

    match cli.query {
        Some(query) => {
            tracing::info!("Processing request: {}", query);
            handle_ask(query, &config).await
        }
        None => handle_repl(&config).await,
    }
}
