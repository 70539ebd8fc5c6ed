//! Command handler implementations (/start, /help, /search, /sources, /stats, /update)

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::Message;

use super::types::{HandlerDeps, HandlerError};
use crate::core::config;
use crate::core::error::AppResult;
use crate::core::metrics;
use crate::import;
use crate::search::{self, format_results, normalize_query};
use crate::storage::{count_by_source, count_gosts, get_connection};
use crate::telegram::bot::help_text;

pub const START_TEXT: &str = "Введите номер госта для поиска";

/// Handle /start command
pub(super) async fn handle_start_command(bot: &Bot, msg: &Message) -> Result<(), HandlerError> {
    bot.send_message(msg.chat.id, START_TEXT).await?;
    Ok(())
}

/// Handle /help command
pub(super) async fn handle_help_command(bot: &Bot, msg: &Message) -> Result<(), HandlerError> {
    bot.send_message(msg.chat.id, help_text()).await?;
    Ok(())
}

/// Handle /search and plain-text queries
pub(super) async fn handle_search(bot: &Bot, msg: &Message, deps: &HandlerDeps, text: &str) -> Result<(), HandlerError> {
    let reply = search_reply(deps, msg.chat.id, text).await;
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

/// Builds the reply to a search query.
///
/// An empty query gets the start prompt, a rate-limited chat gets the wait time.
pub async fn search_reply(deps: &HandlerDeps, chat_id: ChatId, text: &str) -> String {
    let query = match normalize_query(text) {
        Ok(query) => query,
        Err(_) => return START_TEXT.to_string(),
    };

    if let Some(wait) = deps.rate_limiter.check(chat_id).await {
        let seconds = wait.as_secs().max(1);
        return format!("Слишком частые запросы. Подождите {} сек.", seconds);
    }

    log::info!("Search from chat {}: {}", chat_id, query);
    match search::find_gosts(
        &deps.db_pool,
        &deps.http,
        deps.search_url.as_deref(),
        &query,
        config::search::RESULT_LIMIT,
    )
    .await
    {
        Ok(gosts) => {
            metrics::record_search("bot", !gosts.is_empty());
            format_results(&query, &gosts)
        }
        Err(e) => {
            log::error!("Search failed for '{}': {}", query, e);
            "Ошибка поиска, попробуйте позже".to_string()
        }
    }
}

/// Handle /sources command
pub(super) async fn handle_sources_command(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    bot.send_message(msg.chat.id, sources_text(deps)).await?;
    Ok(())
}

pub fn sources_text(deps: &HandlerDeps) -> String {
    let mut text = String::from("Источники данных:\n");
    for source in deps.registry.sources() {
        text.push_str(&format!("\n• {}: {}", source.name(), source.base_url()));
    }
    text
}

/// Handle /stats command
pub(super) async fn handle_stats_command(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let text = match stats_text(deps) {
        Ok(text) => text,
        Err(e) => {
            log::error!("Failed to collect catalogue stats: {}", e);
            "Не удалось получить статистику".to_string()
        }
    };
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

pub fn stats_text(deps: &HandlerDeps) -> AppResult<String> {
    let conn = get_connection(&deps.db_pool)?;
    let total = count_gosts(&conn)?;
    let by_source = count_by_source(&conn)?;

    let mut text = format!("В каталоге {} стандартов", total);
    if !by_source.is_empty() {
        text.push_str("\n\nПо источникам:");
        for (source, count) in by_source {
            text.push_str(&format!("\n• {}: {}", source, count));
        }
    }
    Ok(text)
}

/// Handle /update command (admin only)
///
/// The import runs in a background task; the admin gets the result when it finishes.
pub(super) async fn handle_update_command(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let user_id = msg
        .from
        .as_ref()
        .and_then(|user| i64::try_from(user.id.0).ok())
        .unwrap_or(0);

    if !config::admin::is_admin(user_id) {
        log::warn!("Rejected /update from user {} in chat {}", user_id, msg.chat.id);
        bot.send_message(msg.chat.id, "Команда доступна только администратору").await?;
        return Ok(());
    }

    let Some(running) = UpdateGuard::acquire(&deps.update_running) else {
        bot.send_message(msg.chat.id, "Обновление уже выполняется").await?;
        return Ok(());
    };

    bot.send_message(
        msg.chat.id,
        "Обновляю каталог из всех источников, это может занять несколько минут…",
    )
    .await?;

    let bot = bot.clone();
    let chat_id = msg.chat.id;
    let deps = deps.clone();
    tokio::spawn(async move {
        let result = import::update_database_from_all_sources(&deps.registry, &deps.http, &deps.db_pool).await;
        drop(running);

        let text = match result {
            Ok(count) => format!("Обновление завершено. Добавлено новых ГОСТов: {}", count),
            Err(e) => {
                log::error!("Catalogue update failed: {}", e);
                format!("Обновление не удалось: {}", e)
            }
        };
        if let Err(e) = bot.send_message(chat_id, text).await {
            log::error!("Failed to report update result to chat {}: {}", chat_id, e);
        }
    });

    Ok(())
}

/// Holds the "/update is running" flag; the flag is cleared on drop, also when
/// the import task panics.
pub(crate) struct UpdateGuard(Arc<AtomicBool>);

impl UpdateGuard {
    /// Sets the flag. `None` if another update already holds it.
    pub(crate) fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        if flag.swap(true, Ordering::SeqCst) {
            None
        } else {
            Some(Self(Arc::clone(flag)))
        }
    }
}

impl Drop for UpdateGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
