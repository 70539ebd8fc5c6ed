//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use super::commands::{
    handle_help_command, handle_search, handle_sources_command, handle_start_command, handle_stats_command,
    handle_update_command,
};
use super::types::{HandlerDeps, HandlerError};
use crate::telegram::bot::Command;

/// Creates the main dispatcher schema for the Telegram bot.
///
/// Commands are matched first; any other text message is a search query.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_messages = deps;

    dptree::entry()
        .branch(command_handler(deps_commands))
        .branch(text_handler(deps_messages))
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                log::info!("Received command: {:?} from chat {}", cmd, msg.chat.id);

                match cmd {
                    Command::Start => handle_start_command(&bot, &msg).await?,
                    Command::Help => handle_help_command(&bot, &msg).await?,
                    Command::Search(text) => handle_search(&bot, &msg, &deps, &text).await?,
                    Command::Sources => handle_sources_command(&bot, &msg, &deps).await?,
                    Command::Stats => handle_stats_command(&bot, &msg, &deps).await?,
                    Command::Update => handle_update_command(&bot, &msg, &deps).await?,
                }
                Ok(())
            }
        },
    ))
}

fn text_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().is_some())
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                let text = msg.text().unwrap_or_default();
                if text.starts_with('/') {
                    handle_help_command(&bot, &msg).await?;
                } else {
                    handle_search(&bot, &msg, &deps, text).await?;
                }
                Ok(())
            }
        })
}
