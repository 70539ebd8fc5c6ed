//! Handler types and dependencies

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::core::rate_limiter::RateLimiter;
use crate::sources::{HttpFetcher, SourceRegistry};
use crate::storage::DbPool;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub db_pool: Arc<DbPool>,
    pub rate_limiter: Arc<RateLimiter>,
    pub http: HttpFetcher,
    pub registry: Arc<SourceRegistry>,
    /// Remote search page, `None` disables the remote fallback
    pub search_url: Option<String>,
    /// Set while an /update import is running
    pub update_running: Arc<AtomicBool>,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(
        db_pool: Arc<DbPool>,
        rate_limiter: Arc<RateLimiter>,
        http: HttpFetcher,
        registry: Arc<SourceRegistry>,
        search_url: Option<String>,
    ) -> Self {
        Self {
            db_pool,
            rate_limiter,
            http,
            registry,
            search_url,
            update_running: Arc::new(AtomicBool::new(false)),
        }
    }
}
