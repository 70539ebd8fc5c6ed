//! Logger initialization
//!
//! Console + file output through `simplelog`; the rest of the crate logs
//! through the `log` facade.

use anyhow::Result;
use simplelog::*;
use std::fs::File;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to create the log file or a logger was already set
pub fn init_logger(log_file_path: &str) -> Result<()> {
    init_logger_with_mode(log_file_path, TerminalMode::Mixed)
}

/// Like [`init_logger`], with the console stream chosen by the caller.
///
/// CLI commands whose stdout is their result pass `TerminalMode::Stderr`.
pub fn init_logger_with_mode(log_file_path: &str, terminal_mode: TerminalMode) -> Result<()> {
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    let config = ConfigBuilder::new()
        // reqwest/hyper are chatty at info level during scraping
        .add_filter_ignore_str("hyper")
        .add_filter_ignore_str("reqwest")
        .build();

    CombinedLogger::init(vec![
        TermLogger::new(LevelFilter::Info, config.clone(), terminal_mode, ColorChoice::Auto),
        WriteLogger::new(LevelFilter::Info, config, log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs the effective configuration at startup (never the token itself)
pub fn log_startup_configuration() {
    use crate::core::config;

    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("Database: {}", config::DATABASE_PATH.as_str());
    log::info!("Log file: {}", config::LOG_FILE_PATH.as_str());
    log::info!("HTTP port: {}", *config::server::PORT);
    if config::BOT_TOKEN.is_empty() {
        log::warn!("BOT_TOKEN: not set");
    } else {
        log::info!("BOT_TOKEN: set ({} chars)", config::BOT_TOKEN.len());
    }
    match config::SEARCH_URL.as_deref() {
        Some(url) => log::info!("Remote search: {}", url),
        None => log::info!("Remote search: disabled (SEARCH_URL unset)"),
    }
    if *config::admin::ADMIN_USER_ID == 0 {
        log::warn!("ADMIN_USER_ID: not set, /update is disabled");
    }
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::NamedTempFile;

    #[test]
    fn test_init_logger_creates_log_file() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_str().unwrap();

        // A second init in the same process fails, so only the file is checked
        let _ = init_logger(path);
        assert!(temp_file.path().exists());
    }

    #[test]
    fn test_init_logger_fails_for_missing_directory() {
        let result = init_logger("/nonexistent-dir/for/sure/gostbot.log");
        assert!(result.is_err());
    }
}
