//! Configuration values for the bot and the importer.
//! Read once on first access; `.env` is loaded by `main` before that.

use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Custom Bot API server URL (local telegram-bot-api)
/// Read from BOT_API_URL environment variable
pub static BOT_API_URL: Lazy<Option<String>> = Lazy::new(|| env::var("BOT_API_URL").ok());

/// Database file path
/// Read from DATABASE_PATH environment variable
/// Default: gosts.db
/// In the container image this points into the /app/tgbot/data volume
pub static DATABASE_PATH: Lazy<String> =
    Lazy::new(|| env::var("DATABASE_PATH").unwrap_or_else(|_| "gosts.db".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: gostbot.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "gostbot.log".to_string()));

/// Remote catalogue search page
/// Read from SEARCH_URL environment variable
/// Remote search is disabled when unset
pub static SEARCH_URL: Lazy<Option<String>> =
    Lazy::new(|| env::var("SEARCH_URL").ok().filter(|s| !s.trim().is_empty()));

/// Admin configuration
pub mod admin {
    use super::*;

    /// Telegram user ID allowed to run admin commands (/update)
    /// Read from ADMIN_USER_ID environment variable, 0 disables admin commands
    pub static ADMIN_USER_ID: Lazy<i64> = Lazy::new(|| {
        env::var("ADMIN_USER_ID")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0)
    });

    /// Returns true if the given Telegram user is the configured admin
    pub fn is_admin(user_id: i64) -> bool {
        let admin = *ADMIN_USER_ID;
        admin != 0 && admin == user_id
    }
}

/// Health and metrics HTTP server configuration
pub mod server {
    use super::*;

    /// Port for /health and /metrics
    /// Read from HTTP_PORT environment variable
    /// Default: 80 (the port exposed by the container image)
    pub static PORT: Lazy<u16> = Lazy::new(|| {
        env::var("HTTP_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(80)
    });
}

/// Network configuration for the scrapers
pub mod network {
    use super::Duration;

    /// Browser-like User-Agent; some portals reject unknown clients
    pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/84.0.4147.135 Safari/537.36";

    /// Accept header sent with every request
    pub const ACCEPT: &str = "*/*";

    /// Timeout for HTML pages (in seconds)
    pub const PAGE_TIMEOUT_SECS: u64 = 30;

    /// Timeout for bulk file downloads such as the gost.ru CSV (in seconds)
    pub const FILE_TIMEOUT_SECS: u64 = 60;

    /// Timeout for Telegram Bot API requests (in seconds)
    pub const BOT_REQUEST_TIMEOUT_SECS: u64 = 60;

    /// Page timeout duration
    pub fn page_timeout() -> Duration {
        Duration::from_secs(PAGE_TIMEOUT_SECS)
    }

    /// File download timeout duration
    pub fn file_timeout() -> Duration {
        Duration::from_secs(FILE_TIMEOUT_SECS)
    }

    /// Bot API request timeout duration
    pub fn bot_timeout() -> Duration {
        Duration::from_secs(BOT_REQUEST_TIMEOUT_SECS)
    }
}

/// Search configuration
pub mod search {
    /// Maximum number of results shown per query
    pub const RESULT_LIMIT: usize = 10;

    /// Telegram hard limit for a single text message (in characters)
    pub const MESSAGE_LIMIT: usize = 4096;

    /// Maximum description length shown per result (in characters)
    pub const DESCRIPTION_PREVIEW_CHARS: usize = 300;
}

/// Rate limiting configuration
pub mod rate_limit {
    use super::Duration;

    /// Minimum delay between two searches from the same chat (in seconds)
    pub const COOLDOWN_SECONDS: u64 = 2;

    /// Interval between cleanups of expired entries (in seconds)
    pub const CLEANUP_INTERVAL_SECS: u64 = 300;

    /// Rate limit duration
    pub fn duration() -> Duration {
        Duration::from_secs(COOLDOWN_SECONDS)
    }

    /// Cleanup interval duration
    pub fn cleanup_interval() -> Duration {
        Duration::from_secs(CLEANUP_INTERVAL_SECS)
    }
}

/// Retry configuration
pub mod retry {
    use super::Duration;

    /// Maximum number of dispatcher restarts after a panic
    pub const MAX_DISPATCHER_RETRIES: u32 = 5;

    /// Delay between dispatcher restarts (in seconds)
    pub const DISPATCHER_RETRY_DELAY_SECS: u64 = 5;

    /// Dispatcher retry delay duration
    pub fn dispatcher_delay() -> Duration {
        Duration::from_secs(DISPATCHER_RETRY_DELAY_SECS)
    }

    /// Base for exponential backoff calculation
    pub const EXPONENTIAL_BACKOFF_BASE: u64 = 2;
}
