//! gostbot - Telegram bot for looking up Russian national standards (GOST)
//!
//! This library provides the catalogue storage, the scrapers for public GOST
//! portals, the importer that fills the catalogue, and the Telegram bot itself.
//!
//! # Module Structure
//!
//! - `core`: Configuration, errors, logging, retry, metrics and the health server
//! - `storage`: SQLite catalogue and migrations
//! - `sources`: Scrapers for the public GOST portals
//! - `import`: Fetch-and-store pipeline over all sources
//! - `search`: Catalogue and remote search, result formatting
//! - `telegram`: Telegram bot integration and handlers
//! - `cli`: Command-line interface

pub mod cli;
pub mod core;
pub mod import;
pub mod search;
pub mod sources;
pub mod storage;
pub mod telegram;

// Re-export commonly used types for convenience
pub use crate::core::{config, AppError, AppResult};
pub use sources::{GostRecord, GostSource, HttpFetcher, SourceRegistry};
pub use storage::{create_pool, get_connection, DbConnection, DbPool, Gost};
