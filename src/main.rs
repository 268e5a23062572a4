use anyhow::Context;
use clap::Parser;
use firstaid_rag::cli::handle_ask;
use firstaid_rag::cli::handle_chat;
use firstaid_rag::cli::handle_config;
use firstaid_rag::cli::handle_search;
use firstaid_rag::cli::Cli;
use firstaid_rag::cli::Commands;
use firstaid_rag::config::AppConfig;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize logging
    if cli.verbose {
        firstaid_rag::logging::init_logging_with_level("debug")?;
    } else {
        firstaid_rag::logging::init_logging_with_config(Some(&config))?;
    }
    info!("Configuration loaded successfully");

    // Execute the requested command
    match cli.command {
        Commands::Ask { query, json } => handle_ask(&config, &query, json).await?,
        Commands::Chat => handle_chat(&config).await?,
        Commands::Search { query, json } => handle_search(&config, &query, json).await?,
        Commands::Config => handle_config(&config)?,
    }

    Ok(())
}
