use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use tokio::time::sleep;

use gostbot::cli::{format_source_list, render_search_results, Cli, Commands};
use gostbot::core::{config, health_server, init_logger_with_mode, log_startup_configuration, metrics, rate_limiter::RateLimiter};
use gostbot::import;
use gostbot::search;
use gostbot::sources::{HttpFetcher, SourceRegistry};
use gostbot::storage::create_pool;
use gostbot::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps};

/// Main entry point
///
/// Parses CLI arguments and dispatches to the subcommand; no subcommand runs the bot.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load environment variables from .env before any config value is read
    let _ = dotenv();

    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
        if let Some(msg) = panic_info.payload().downcast_ref::<&str>() {
            log::error!("Panic message: {}", msg);
        }
    }));

    init_logger_with_mode(&config::LOG_FILE_PATH, cli.terminal_mode())?;

    match cli.command {
        Some(Commands::Run) | None => run_bot().await,
        Some(Commands::Populate {
            source,
            list_sources,
            all: _,
        }) => run_populate(source, list_sources).await,
        Some(Commands::Search { text, limit, json }) => run_search(&text, limit, json),
    }
}

/// Run the importer
async fn run_populate(source: Option<String>, list_sources: bool) -> Result<()> {
    let registry = SourceRegistry::default_registry();

    if list_sources {
        println!("{}", format_source_list(&registry));
        return Ok(());
    }

    let pool = create_pool(&config::DATABASE_PATH).map_err(|e| anyhow::anyhow!("Failed to create database pool: {}", e))?;
    let http = HttpFetcher::new()?;

    match source {
        Some(name) => match import::update_database_from_source(&registry, &name, &http, &pool).await? {
            Some(added) => println!("Added {} new GOSTs from {}", added, name),
            None => {
                eprintln!("Unknown source: {}", name);
                eprintln!("{}", format_source_list(&registry));
                std::process::exit(1);
            }
        },
        None => {
            let added = import::update_database_from_all_sources(&registry, &http, &pool).await?;
            println!("Added {} new GOSTs from all sources", added);
        }
    }

    Ok(())
}

/// Run an offline catalogue search
fn run_search(text: &str, limit: usize, json: bool) -> Result<()> {
    let pool = create_pool(&config::DATABASE_PATH).map_err(|e| anyhow::anyhow!("Failed to create database pool: {}", e))?;
    let gosts = search::search_local(&pool, text, limit)?;
    metrics::record_search("cli", !gosts.is_empty());

    println!("{}", render_search_results(text, &gosts, json)?);

    Ok(())
}

async fn run_bot() -> Result<()> {
    log::info!("Starting bot...");
    log_startup_configuration();

    if let Err(e) = metrics::init_metrics() {
        log::warn!("Failed to initialize metrics: {}", e);
    }

    let db_pool = Arc::new(
        create_pool(&config::DATABASE_PATH).map_err(|e| anyhow::anyhow!("Failed to create database pool: {}", e))?,
    );

    // Health and metrics server
    let health_pool = Arc::clone(&db_pool);
    tokio::spawn(async move {
        if let Err(e) = health_server::start_health_server(*config::server::PORT, health_pool).await {
            log::error!("Health server stopped: {}", e);
        }
    });

    let bot = create_bot()?;

    // Retry while the Bot API is unreachable
    let bot_info = {
        let startup_max_retries = 60; // Up to 5 minutes (60 * 5s)
        let mut startup_retry = 0;
        loop {
            match bot.get_me().await {
                Ok(info) => break info,
                Err(e) => {
                    let is_retryable = matches!(
                        e,
                        teloxide::RequestError::Network(_)
                            | teloxide::RequestError::RetryAfter(_)
                            | teloxide::RequestError::Io(_)
                    );

                    startup_retry += 1;
                    if startup_retry >= startup_max_retries || !is_retryable {
                        return Err(anyhow::anyhow!(
                            "Failed to connect to Bot API after {} retries: {}",
                            startup_retry,
                            e
                        ));
                    }

                    log::warn!(
                        "Bot API not ready (attempt {}/{}): {}. Retrying in 5 seconds...",
                        startup_retry,
                        startup_max_retries,
                        e
                    );
                    sleep(Duration::from_secs(5)).await;
                }
            }
        }
    };
    log::info!("Bot username: {:?}, Bot ID: {}", bot_info.username, bot_info.id);

    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let rate_limiter = Arc::new(RateLimiter::new());
    let _cleanup = Arc::clone(&rate_limiter).spawn_cleanup_task(config::rate_limit::cleanup_interval());

    let deps = HandlerDeps::new(
        db_pool,
        rate_limiter,
        HttpFetcher::new()?,
        Arc::new(SourceRegistry::default_registry()),
        config::SEARCH_URL.clone(),
    );
    let handler = schema(deps);

    let mut retry_count = 0;
    let max_retries = config::retry::MAX_DISPATCHER_RETRIES;

    // Run the dispatcher with retry logic
    loop {
        let bot_clone = bot.clone();
        let handler_clone = handler.clone();

        // The dispatcher runs in its own task so a panic ends up in the JoinHandle
        let handle = tokio::spawn(async move {
            use teloxide::update_listeners::Polling;

            let listener = Polling::builder(bot_clone.clone()).drop_pending_updates().build();

            Dispatcher::builder(bot_clone, handler_clone)
                .dependencies(DependencyMap::new())
                .enable_ctrlc_handler()
                .build()
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the update listener"),
                )
                .await
        });

        match handle.await {
            Ok(()) => {
                log::info!("Dispatcher shutdown gracefully");
                break;
            }
            Err(join_err) => {
                if join_err.is_panic() {
                    log::error!("Dispatcher panicked: {}", join_err);

                    if retry_count < max_retries {
                        retry_count += 1;
                        log::info!(
                            "Retrying dispatcher after panic (attempt {}/{})...",
                            retry_count,
                            max_retries
                        );
                        exponential_backoff(retry_count).await;
                    } else {
                        log::error!("Max retries reached after panic. Exiting...");
                        break;
                    }
                } else {
                    log::warn!("Dispatcher task was cancelled: {}", join_err);
                    break;
                }
            }
        }

        if retry_count > 0 {
            sleep(config::retry::dispatcher_delay()).await;
        }
    }

    Ok(())
}

/// Exponential backoff delay for retries
async fn exponential_backoff(retry_count: u32) {
    let delay = Duration::from_secs(config::retry::EXPONENTIAL_BACKOFF_BASE.pow(retry_count));
    sleep(delay).await;
}
