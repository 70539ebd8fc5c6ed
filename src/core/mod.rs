//! Core utilities, configuration, and common functionality

pub mod config;
pub mod error;
pub mod health_server;
pub mod logging;
pub mod metrics;
pub mod rate_limiter;
pub mod retry;

// Re-exports for convenience
pub use error::{AppError, AppResult};
pub use logging::{init_logger, init_logger_with_mode, log_startup_configuration};
