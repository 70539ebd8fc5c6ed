//! SQLite catalogue of GOST standards

pub mod db;
pub mod migrations;

// Re-exports for convenience
pub use db::{
    count_by_source, count_gosts, create_pool, find_by_name, get_connection, insert_gost_if_absent, save_gosts,
    search_gosts, DbConnection, DbPool, Gost,
};
pub use migrations::run_migrations;
