//! Telegram front-end of the archive service
//!
//! Command parsing and replies live here; everything with semantics is in
//! `services::archive`. The teloxide client is adapted onto the service's
//! `Forwarder`/`Notifier` seams.

pub mod handlers;

use std::sync::Arc;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::MessageId;
use teloxide::utils::command::BotCommands;
use tracing::info;

use crate::errors::{Result, VaultlinkError};
use crate::services::archive::{ArchiveService, Forwarder, Notifier};

#[derive(BotCommands, Clone)]
#[command(rename_rule = "snake_case")]
pub enum Command {
    Start,
    Link,
    Batch(String),
    Admin,
    ListContent,
    ListUsers,
    AddUser(String),
    RemoveUser(String),
    Broadcast(String),
}

/// Forwards messages into the archive channel through the Bot API.
pub struct TelegramForwarder {
    bot: Bot,
    archive_chat: ChatId,
}

impl TelegramForwarder {
    pub fn new(bot: Bot, archive_channel_id: i64) -> Self {
        TelegramForwarder {
            bot,
            archive_chat: ChatId(archive_channel_id),
        }
    }
}

#[async_trait]
impl Forwarder for TelegramForwarder {
    async fn forward(&self, from_chat: i64, message_id: i64) -> Result<i64> {
        let archived = self
            .bot
            .forward_message(self.archive_chat, ChatId(from_chat), MessageId(message_id as i32))
            .await
            .map_err(|e| {
                VaultlinkError::forward(format!("Forward of message {} failed: {}", message_id, e))
            })?;
        Ok(archived.id.0 as i64)
    }
}

/// Plain-text sends (broadcast recipients and the log channel).
pub struct TelegramNotifier {
    bot: Bot,
}

impl TelegramNotifier {
    pub fn new(bot: Bot) -> Self {
        TelegramNotifier { bot }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, chat_id: i64, text: &str) -> Result<()> {
        self.bot
            .send_message(ChatId(chat_id), text)
            .await
            .map_err(|e| {
                VaultlinkError::notify(format!("Send to chat {} failed: {}", chat_id, e))
            })?;
        Ok(())
    }
}

/// Run the command dispatcher until the process is stopped.
pub async fn run_bot(bot: Bot, service: Arc<ArchiveService>) {
    let handler = Update::filter_message().branch(
        dptree::entry()
            .filter_command::<Command>()
            .endpoint(handlers::handle_command),
    );

    info!("Starting bot dispatcher");
    service.log_event("Bot started!").await;

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![service])
        .build()
        .dispatch()
        .await;
}
