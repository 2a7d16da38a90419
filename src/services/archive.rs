//! Archive service
//!
//! Business logic behind the operator commands: forward content into the
//! archive channel, mint a shortlink record, hand back a shareable URL.
//! The Telegram client sits behind the `Forwarder`/`Notifier` seams so the
//! semantics stay testable without a live bot.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::get_config;
use crate::errors::{Result, VaultlinkError};
use crate::services::admins::AdminStore;
use crate::services::shortener::Shortener;
use crate::storage::{ContentKind, ContentRecord, Storage};
use crate::utils::generate_random_code;

/// Bound on mint attempts when the generated code collides.
const MAX_MINT_ATTEMPTS: usize = 5;

/// Forwards one message into the archive channel.
#[async_trait]
pub trait Forwarder: Send + Sync {
    /// Returns the archived copy's message id.
    async fn forward(&self, from_chat: i64, message_id: i64) -> Result<i64>;
}

/// Sends a plain text message to a chat (user or channel).
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, chat_id: i64, text: &str) -> Result<()>;
}

/// One record as shown by `/list_content`, with a freshly shortened link.
#[derive(Debug, Clone)]
pub struct ContentSummary {
    pub code: String,
    pub kind: ContentKind,
    pub uploader_id: i64,
    pub created_at: DateTime<Utc>,
    pub share_url: String,
}

pub struct ArchiveService {
    storage: Arc<dyn Storage>,
    forwarder: Arc<dyn Forwarder>,
    notifier: Arc<dyn Notifier>,
    shortener: Arc<Shortener>,
    admins: Arc<AdminStore>,
}

impl ArchiveService {
    pub fn new(
        storage: Arc<dyn Storage>,
        forwarder: Arc<dyn Forwarder>,
        notifier: Arc<dyn Notifier>,
        shortener: Arc<Shortener>,
        admins: Arc<AdminStore>,
    ) -> Self {
        ArchiveService {
            storage,
            forwarder,
            notifier,
            shortener,
            admins,
        }
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admins.contains(user_id)
    }

    fn ensure_admin(&self, operator_id: i64) -> Result<()> {
        if self.admins.contains(operator_id) {
            Ok(())
        } else {
            Err(VaultlinkError::unauthorized(format!(
                "User {} is not an admin",
                operator_id
            )))
        }
    }

    fn canonical_url(&self, code: &str) -> String {
        let domain = &get_config().links.public_domain;
        format!("{}/{}", domain.trim_end_matches('/'), code)
    }

    /// Best-effort notification to the operations log channel; failures are
    /// swallowed after a warning.
    pub async fn log_event(&self, text: &str) {
        let log_channel = get_config().telegram.log_channel_id;
        if log_channel == 0 {
            return;
        }
        if let Err(e) = self.notifier.send(log_channel, text).await {
            warn!("Log channel notification failed: {}", e);
        }
    }

    /// Generate a code and insert the record, retrying on collisions.
    async fn mint_record<F>(&self, make_record: F) -> Result<ContentRecord>
    where
        F: Fn(String) -> ContentRecord + Send,
    {
        let code_length = get_config().links.code_length;

        let mut last_err =
            VaultlinkError::database_operation("No mint attempt was made");
        for attempt in 1..=MAX_MINT_ATTEMPTS {
            let record = make_record(generate_random_code(code_length));
            match self.storage.insert(record.clone()).await {
                Ok(()) => return Ok(record),
                Err(e @ VaultlinkError::DuplicateCode(_)) => {
                    warn!(
                        "Short code collision on attempt {}/{}, regenerating",
                        attempt, MAX_MINT_ATTEMPTS
                    );
                    last_err = e;
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_err)
    }

    /// Archive one message and return the shareable URL.
    pub async fn archive_single(
        &self,
        operator_id: i64,
        source_chat: i64,
        message_id: i64,
    ) -> Result<String> {
        self.ensure_admin(operator_id)?;

        let archived_id = self.forwarder.forward(source_chat, message_id).await?;

        let record = self
            .mint_record(|code| ContentRecord::single(code, archived_id, operator_id))
            .await?;

        let share_url = self.shortener.shorten(&self.canonical_url(&record.code)).await;

        info!(
            "Archived message {} as '{}' for uploader {}",
            archived_id, record.code, operator_id
        );
        self.log_event(&format!(
            "Content uploaded by {}: {}",
            operator_id, record.code
        ))
        .await;

        Ok(share_url)
    }

    /// Archive an inclusive message-id range under a single code.
    ///
    /// Individual forward failures are skipped; the stored bounds are the
    /// requested ones regardless of how many forwards succeeded.
    pub async fn archive_batch(
        &self,
        operator_id: i64,
        source_chat: i64,
        first_id: i64,
        last_id: i64,
    ) -> Result<String> {
        self.ensure_admin(operator_id)?;

        if first_id >= last_id {
            return Err(VaultlinkError::validation(format!(
                "First ID must be less than last ID (got {} >= {})",
                first_id, last_id
            )));
        }

        let mut forwarded = 0usize;
        for message_id in first_id..=last_id {
            match self.forwarder.forward(source_chat, message_id).await {
                Ok(_) => forwarded += 1,
                Err(e) => {
                    warn!("Skipping message {} in batch: {}", message_id, e);
                }
            }
        }

        let record = self
            .mint_record(|code| ContentRecord::batch(code, first_id, last_id, operator_id))
            .await?;

        let share_url = self.shortener.shorten(&self.canonical_url(&record.code)).await;

        info!(
            "Archived batch {}-{} as '{}' ({} of {} forwarded)",
            first_id,
            last_id,
            record.code,
            forwarded,
            (last_id - first_id + 1) as usize
        );
        self.log_event(&format!(
            "Batch uploaded by {}: {} (Messages {}-{})",
            operator_id, record.code, first_id, last_id
        ))
        .await;

        Ok(share_url)
    }

    /// Every record, each with a link re-shortened at listing time.
    pub async fn list_content(&self, operator_id: i64) -> Result<Vec<ContentSummary>> {
        self.ensure_admin(operator_id)?;

        let records = self.storage.load_all().await?;

        let mut summaries = Vec::with_capacity(records.len());
        for record in records {
            let share_url = self.shortener.shorten(&self.canonical_url(&record.code)).await;
            summaries.push(ContentSummary {
                code: record.code,
                kind: record.kind,
                uploader_id: record.uploader_id,
                created_at: record.created_at,
                share_url,
            });
        }
        Ok(summaries)
    }

    /// Fan `text` out to every distinct uploader; per-recipient failures are
    /// skipped. Returns the number of successful sends.
    pub async fn broadcast(&self, operator_id: i64, text: &str) -> Result<usize> {
        self.ensure_admin(operator_id)?;

        let targets = self.storage.uploader_ids().await?;

        let mut sent = 0usize;
        for user_id in targets {
            match self.notifier.send(user_id, text).await {
                Ok(()) => sent += 1,
                Err(e) => {
                    warn!("Broadcast to {} failed: {}", user_id, e);
                }
            }
        }
        Ok(sent)
    }

    pub fn list_admins(&self, operator_id: i64) -> Result<Vec<i64>> {
        self.ensure_admin(operator_id)?;
        Ok(self.admins.list())
    }

    /// Returns false when the id was already an admin.
    pub fn add_admin(&self, operator_id: i64, user_id: i64) -> Result<bool> {
        self.ensure_admin(operator_id)?;
        self.admins.add(user_id)
    }

    /// Returns false when the id was not an admin.
    pub fn remove_admin(&self, operator_id: i64, user_id: i64) -> Result<bool> {
        self.ensure_admin(operator_id)?;
        self.admins.remove(user_id)
    }
}
