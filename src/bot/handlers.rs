//! Operator command handlers
//!
//! Every failure is converted into a short human-readable reply plus a
//! best-effort log-channel notification; no command may take down the
//! dispatcher.

use std::sync::Arc;

use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tracing::warn;

use super::Command;
use crate::errors::VaultlinkError;
use crate::services::archive::ArchiveService;
use crate::storage::ContentKind;

const GREETING: &str = "Hello! I'm a file-sharing bot. Use /link to share content or /batch for multiple files (admins only).";

const ADMIN_PANEL: &str = "Admin Panel:\n\
    /list_content - List all stored content\n\
    /list_users - List allowed users\n\
    /add_user <user_id> - Add allowed user\n\
    /remove_user <user_id> - Remove allowed user\n\
    /broadcast <message> - Broadcast to all users";

pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    service: Arc<ArchiveService>,
) -> ResponseResult<()> {
    let Some(operator_id) = msg.from.as_ref().map(|u| u.id.0 as i64) else {
        // Channel posts and the like carry no sender; nothing to authorize
        return Ok(());
    };

    match cmd {
        Command::Start => {
            bot.send_message(msg.chat.id, GREETING).await?;
        }
        Command::Link => handle_link(&bot, &msg, operator_id, &service).await?,
        Command::Batch(args) => handle_batch(&bot, &msg, operator_id, &service, &args).await?,
        Command::Admin => {
            if service.is_admin(operator_id) {
                bot.send_message(msg.chat.id, ADMIN_PANEL).await?;
            } else {
                bot.send_message(msg.chat.id, "Admins only!").await?;
            }
        }
        Command::ListContent => handle_list_content(&bot, &msg, operator_id, &service).await?,
        Command::ListUsers => {
            match service.list_admins(operator_id) {
                Ok(ids) => {
                    let joined = ids
                        .iter()
                        .map(|id| id.to_string())
                        .collect::<Vec<_>>()
                        .join(", ");
                    bot.send_message(msg.chat.id, format!("Allowed Users: {}", joined))
                        .await?;
                }
                Err(_) => {
                    bot.send_message(msg.chat.id, "Admins only!").await?;
                }
            }
        }
        Command::AddUser(args) => handle_add_user(&bot, &msg, operator_id, &service, &args).await?,
        Command::RemoveUser(args) => {
            handle_remove_user(&bot, &msg, operator_id, &service, &args).await?
        }
        Command::Broadcast(text) => {
            handle_broadcast(&bot, &msg, operator_id, &service, &text).await?
        }
    }

    Ok(())
}

async fn handle_link(
    bot: &Bot,
    msg: &Message,
    operator_id: i64,
    service: &ArchiveService,
) -> ResponseResult<()> {
    // Archive the replied-to message when present, the command message
    // itself otherwise (a file sent with "/link" as its caption).
    let target_id = msg
        .reply_to_message()
        .map(|reply| reply.id.0)
        .unwrap_or(msg.id.0) as i64;

    match service
        .archive_single(operator_id, msg.chat.id.0, target_id)
        .await
    {
        Ok(share_url) => {
            reply_with_link(
                bot,
                msg.chat.id,
                format!("Content saved! Shareable link: {}", share_url),
                &share_url,
            )
            .await?;
        }
        Err(VaultlinkError::Unauthorized(_)) => {
            bot.send_message(msg.chat.id, "Sorry, only admins can use /link!")
                .await?;
            service
                .log_event(&format!("Non-admin {} tried to use /link.", operator_id))
                .await;
        }
        Err(e) => {
            warn!("/link failed for {}: {}", operator_id, e);
            bot.send_message(msg.chat.id, "Error saving content!").await?;
            service
                .log_event(&format!("Error in /link for {}: {}", operator_id, e))
                .await;
        }
    }

    Ok(())
}

async fn handle_batch(
    bot: &Bot,
    msg: &Message,
    operator_id: i64,
    service: &ArchiveService,
    args: &str,
) -> ResponseResult<()> {
    let parts: Vec<&str> = args.split_whitespace().collect();
    let ids: Option<(i64, i64)> = match parts.as_slice() {
        [first, last] => first.parse().ok().zip(last.parse().ok()),
        _ => None,
    };

    let Some((first_id, last_id)) = ids else {
        bot.send_message(msg.chat.id, "Usage: /batch <first_message_id> <last_message_id>")
            .await?;
        return Ok(());
    };

    match service
        .archive_batch(operator_id, msg.chat.id.0, first_id, last_id)
        .await
    {
        Ok(share_url) => {
            reply_with_link(
                bot,
                msg.chat.id,
                format!("Batch saved! Shareable link: {}", share_url),
                &share_url,
            )
            .await?;
        }
        Err(VaultlinkError::Unauthorized(_)) => {
            bot.send_message(msg.chat.id, "Sorry, only admins can use /batch!")
                .await?;
            service
                .log_event(&format!("Non-admin {} tried to use /batch.", operator_id))
                .await;
        }
        Err(VaultlinkError::Validation(_)) => {
            bot.send_message(msg.chat.id, "First ID must be less than last ID!")
                .await?;
        }
        Err(e) => {
            warn!("/batch failed for {}: {}", operator_id, e);
            bot.send_message(msg.chat.id, "Error saving batch!").await?;
            service
                .log_event(&format!("Error in /batch for {}: {}", operator_id, e))
                .await;
        }
    }

    Ok(())
}

async fn handle_list_content(
    bot: &Bot,
    msg: &Message,
    operator_id: i64,
    service: &ArchiveService,
) -> ResponseResult<()> {
    match service.list_content(operator_id).await {
        Ok(summaries) if summaries.is_empty() => {
            bot.send_message(msg.chat.id, "No content stored!").await?;
        }
        Ok(summaries) => {
            let mut response = String::from("Stored Content:\n");
            for summary in summaries {
                match summary.kind {
                    ContentKind::Batch { first_id, last_id } => {
                        response.push_str(&format!(
                            "Batch: {}\nMessages: {}-{}\nUploader: {}\nUploaded: {}\nLink: {}\n\n",
                            summary.code,
                            first_id,
                            last_id,
                            summary.uploader_id,
                            summary.created_at.to_rfc3339(),
                            summary.share_url
                        ));
                    }
                    ContentKind::Single { message_id } => {
                        response.push_str(&format!(
                            "Content: {}\nMessage ID: {}\nUploader: {}\nUploaded: {}\nLink: {}\n\n",
                            summary.code,
                            message_id,
                            summary.uploader_id,
                            summary.created_at.to_rfc3339(),
                            summary.share_url
                        ));
                    }
                }
            }
            bot.send_message(msg.chat.id, response).await?;
        }
        Err(VaultlinkError::Unauthorized(_)) => {
            bot.send_message(msg.chat.id, "Admins only!").await?;
        }
        Err(e) => {
            warn!("/list_content failed for {}: {}", operator_id, e);
            bot.send_message(msg.chat.id, "Error listing content!").await?;
            service
                .log_event(&format!("Error in /list_content for {}: {}", operator_id, e))
                .await;
        }
    }

    Ok(())
}

async fn handle_add_user(
    bot: &Bot,
    msg: &Message,
    operator_id: i64,
    service: &ArchiveService,
    args: &str,
) -> ResponseResult<()> {
    let Ok(user_id) = args.trim().parse::<i64>() else {
        bot.send_message(msg.chat.id, "Usage: /add_user <user_id>")
            .await?;
        return Ok(());
    };

    match service.add_admin(operator_id, user_id) {
        Ok(true) => {
            bot.send_message(msg.chat.id, format!("User {} added as admin!", user_id))
                .await?;
            service
                .log_event(&format!(
                    "User {} added as admin by {}",
                    user_id, operator_id
                ))
                .await;
        }
        Ok(false) => {
            bot.send_message(msg.chat.id, "User already an admin!").await?;
        }
        Err(VaultlinkError::Unauthorized(_)) => {
            bot.send_message(msg.chat.id, "Admins only!").await?;
        }
        Err(e) => {
            warn!("/add_user failed for {}: {}", operator_id, e);
            bot.send_message(msg.chat.id, "Error updating admin list!")
                .await?;
            service
                .log_event(&format!("Error adding user: {}", e))
                .await;
        }
    }

    Ok(())
}

async fn handle_remove_user(
    bot: &Bot,
    msg: &Message,
    operator_id: i64,
    service: &ArchiveService,
    args: &str,
) -> ResponseResult<()> {
    let Ok(user_id) = args.trim().parse::<i64>() else {
        bot.send_message(msg.chat.id, "Usage: /remove_user <user_id>")
            .await?;
        return Ok(());
    };

    match service.remove_admin(operator_id, user_id) {
        Ok(true) => {
            bot.send_message(
                msg.chat.id,
                format!("User {} removed from admins!", user_id),
            )
            .await?;
            service
                .log_event(&format!(
                    "User {} removed from admins by {}",
                    user_id, operator_id
                ))
                .await;
        }
        Ok(false) => {
            bot.send_message(msg.chat.id, "User not an admin!").await?;
        }
        Err(VaultlinkError::Unauthorized(_)) => {
            bot.send_message(msg.chat.id, "Admins only!").await?;
        }
        Err(e) => {
            warn!("/remove_user failed for {}: {}", operator_id, e);
            bot.send_message(msg.chat.id, "Error updating admin list!")
                .await?;
            service
                .log_event(&format!("Error removing user: {}", e))
                .await;
        }
    }

    Ok(())
}

async fn handle_broadcast(
    bot: &Bot,
    msg: &Message,
    operator_id: i64,
    service: &ArchiveService,
    text: &str,
) -> ResponseResult<()> {
    let text = text.trim();
    if text.is_empty() {
        bot.send_message(msg.chat.id, "Usage: /broadcast <message>")
            .await?;
        return Ok(());
    }

    match service.broadcast(operator_id, text).await {
        Ok(_) => {
            bot.send_message(msg.chat.id, "Broadcast sent!").await?;
            service
                .log_event(&format!("Broadcast sent by {}: {}", operator_id, text))
                .await;
        }
        Err(VaultlinkError::Unauthorized(_)) => {
            bot.send_message(msg.chat.id, "Admins only!").await?;
        }
        Err(e) => {
            warn!("/broadcast failed for {}: {}", operator_id, e);
            bot.send_message(msg.chat.id, "Error broadcasting!").await?;
            service
                .log_event(&format!("Error broadcasting: {}", e))
                .await;
        }
    }

    Ok(())
}

/// Reply with an inline "Open Link" button when the URL parses.
async fn reply_with_link(
    bot: &Bot,
    chat_id: ChatId,
    text: String,
    share_url: &str,
) -> ResponseResult<()> {
    let request = bot.send_message(chat_id, text);

    match url::Url::parse(share_url) {
        Ok(parsed) => {
            let markup =
                InlineKeyboardMarkup::new([[InlineKeyboardButton::url("Open Link", parsed)]]);
            request.reply_markup(markup).await?;
        }
        Err(_) => {
            request.await?;
        }
    }

    Ok(())
}
