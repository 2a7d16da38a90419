use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use teloxide::Bot;
use tracing::info;

use vaultlink::bot::{TelegramForwarder, TelegramNotifier, run_bot};
use vaultlink::config::{get_config, init_config};
use vaultlink::services::{AdminStore, ArchiveService, Shortener};
use vaultlink::storage::{Storage, StorageFactory};
use vaultlink::system::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_config();
    let config = get_config();
    let _log_guard = init_logging(&config.logging);

    if config.telegram.bot_token.is_empty() {
        anyhow::bail!("BOT_TOKEN is not set");
    }
    if config.telegram.archive_channel_id == 0 {
        anyhow::bail!("ARCHIVE_CHANNEL_ID is not set");
    }

    let storage = StorageFactory::create()
        .await
        .context("Failed to create storage")?;
    info!("Using storage backend: {}", storage.backend_name().await);

    let admins = Arc::new(
        AdminStore::load(&config.admins.file, &config.admins.initial_ids)
            .context("Failed to load admin allow-list")?,
    );
    let shortener = Arc::new(Shortener::from_config(&config.shortener));

    let bot = Bot::new(config.telegram.bot_token.clone());
    let forwarder = Arc::new(TelegramForwarder::new(
        bot.clone(),
        config.telegram.archive_channel_id,
    ));
    let notifier = Arc::new(TelegramNotifier::new(bot.clone()));

    let service = Arc::new(ArchiveService::new(
        storage, forwarder, notifier, shortener, admins,
    ));

    run_bot(bot, service).await;

    Ok(())
}
