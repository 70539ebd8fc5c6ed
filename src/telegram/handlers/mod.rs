//! Telegram bot handler tree configuration
//!
//! This module provides the main dispatcher schema for the Telegram bot.
//! Reply texts are built by plain functions over [`HandlerDeps`] so they can
//! be tested without a Telegram connection.

mod commands;
mod schema;
mod types;

pub use commands::{search_reply, sources_text, stats_text, START_TEXT};
pub use schema::schema;
pub use types::{HandlerDeps, HandlerError};
