//! Logging configuration for the first-aid chatbot

use std::path::Path;

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Registry;

use crate::FirstAidError;
use crate::Result;

const LOGS_DIR: &str = "logs";
const LOG_FILE_PREFIX: &str = "firstaid-rag.log";

/// Initialize logging system with file output
pub fn init_logging() -> Result<()> {
    init_logging_with_config(None)
}

/// Initialize logging with configuration
pub fn init_logging_with_config(config: Option<&crate::config::AppConfig>) -> Result<()> {
    // Set up environment filter - use config if available, otherwise default
    let (env_filter, level) = if let Some(config) = config {
        let level = config.logging.level.clone();
        (filter_for_level(&level), level)
    } else {
        // Fallback to environment variable or default
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("warn,firstaid_rag=info"));
        (filter, "info".to_string())
    };

    install(env_filter, &level)
}

/// Initialize logging with custom log level
pub fn init_logging_with_level(level: &str) -> Result<()> {
    install(filter_for_level(level), level)
}

/// Initialize simple logging for testing
///
/// An already installed global subscriber is kept and is not an error.
pub fn init_simple_logging() -> Result<()> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    match tracing_subscriber::fmt()
        .with_target(true)
        .with_max_level(tracing::Level::INFO)
        .with_test_writer()
        .try_init()
    {
        Ok(()) => Ok(()),
        // Another thread won the race to install one
        Err(_) if tracing::dispatcher::has_been_set() => Ok(()),
        Err(e) => Err(FirstAidError::Configuration(format!(
            "Failed to initialize logging: {e}"
        ))),
    }
}

fn filter_for_level(level: &str) -> EnvFilter {
    EnvFilter::new(format!("warn,firstaid_rag={level}"))
}

fn install(env_filter: EnvFilter, level: &str) -> Result<()> {
    // Create logs directory if it doesn't exist
    let logs_dir = Path::new(LOGS_DIR);
    if !logs_dir.exists() {
        std::fs::create_dir_all(logs_dir)?;
    }

    let file_appender = tracing_appender::rolling::daily(LOGS_DIR, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Console output goes to stderr so answers on stdout stay clean
    let console_layer = fmt::layer()
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(non_blocking)
        .with_ansi(false); // No colors in file

    Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    tracing::info!("Logging initialized with level: {level} - console and file output enabled");
    tracing::debug!("Log files will be saved to: {LOGS_DIR}/{LOG_FILE_PREFIX}.YYYY-MM-DD");

    // The writer must outlive every span; the process owns it until exit
    std::mem::forget(guard);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_logging_is_reentrant() {
        assert!(init_simple_logging().is_ok());
        assert!(init_simple_logging().is_ok());
    }

    #[test]
    fn test_filter_for_level_targets_crate() {
        let filter = filter_for_level("debug");
        assert!(filter.to_string().contains("firstaid_rag=debug"));
    }
}
