//! Bot initialization and the command list
//!
//! This module contains:
//! - Command enum definition
//! - Bot instance creation
//! - Registration of the command menu in the Telegram UI

use reqwest::ClientBuilder;
use teloxide::prelude::*;
use teloxide::types::BotCommand;
use teloxide::utils::command::BotCommands;

use crate::core::config;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Я умею:")]
pub enum Command {
    #[command(description = "начать работу")]
    Start,
    #[command(description = "показать эту справку")]
    Help,
    #[command(description = "найти ГОСТ по номеру или названию")]
    Search(String),
    #[command(description = "список источников данных")]
    Sources,
    #[command(description = "статистика каталога")]
    Stats,
    #[command(description = "обновить каталог из всех источников (только для администратора)")]
    Update,
}

/// Creates a Bot instance with custom or default API URL
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(anyhow::Error)` - No token configured or invalid `BOT_API_URL`
pub fn create_bot() -> anyhow::Result<Bot> {
    let token = config::BOT_TOKEN.as_str();
    if token.is_empty() {
        anyhow::bail!("BOT_TOKEN (or TELOXIDE_TOKEN) is not set");
    }

    let client = ClientBuilder::new().timeout(config::network::bot_timeout()).build()?;
    let bot = Bot::with_client(token, client);

    // Check if local Bot API server is configured
    let bot = match config::BOT_API_URL.as_deref() {
        Some(bot_api_url) => {
            log::info!("Using custom Bot API URL: {}", bot_api_url);
            let url = url::Url::parse(bot_api_url).map_err(|e| anyhow::anyhow!("Invalid BOT_API_URL: {}", e))?;
            bot.set_api_url(url)
        }
        None => bot,
    };

    Ok(bot)
}

/// Menu entries shown by Telegram; mirrors [`Command`].
pub fn bot_commands() -> Vec<BotCommand> {
    vec![
        BotCommand::new("start", "начать работу"),
        BotCommand::new("help", "показать справку"),
        BotCommand::new("search", "найти ГОСТ по номеру или названию"),
        BotCommand::new("sources", "список источников данных"),
        BotCommand::new("stats", "статистика каталога"),
    ]
}

/// Sets up bot commands in Telegram UI
///
/// `/update` is left out of the menu; it is admin-only.
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(bot_commands()).await?;
    Ok(())
}

/// Text of /help.
pub fn help_text() -> String {
    format!(
        "{}\n\nМожно просто отправить номер или часть названия ГОСТа, например: ГОСТ 20909.1-75",
        Command::descriptions()
    )
}
