use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a short code points at: one archived message, or an inclusive
/// range of archived message ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Single { message_id: i64 },
    Batch { first_id: i64, last_id: i64 },
}

#[derive(Debug, Clone)]
pub struct ContentRecord {
    pub code: String,
    pub kind: ContentKind,
    pub uploader_id: i64,
    pub created_at: DateTime<Utc>,
}

impl ContentRecord {
    pub fn single(code: impl Into<String>, message_id: i64, uploader_id: i64) -> Self {
        ContentRecord {
            code: code.into(),
            kind: ContentKind::Single { message_id },
            uploader_id,
            created_at: Utc::now(),
        }
    }

    pub fn batch(code: impl Into<String>, first_id: i64, last_id: i64, uploader_id: i64) -> Self {
        ContentRecord {
            code: code.into(),
            kind: ContentKind::Batch { first_id, last_id },
            uploader_id,
            created_at: Utc::now(),
        }
    }

    pub fn is_batch(&self) -> bool {
        matches!(self.kind, ContentKind::Batch { .. })
    }

    /// Telegram deep-link into the archive channel.
    ///
    /// Private-channel links use the channel id without its `-100` marker
    /// prefix; batches use the `first-last` range syntax.
    pub fn deep_link(&self, archive_channel_id: i64) -> String {
        let internal = channel_internal_id(archive_channel_id);
        match self.kind {
            ContentKind::Single { message_id } => {
                format!("https://t.me/c/{}/{}", internal, message_id)
            }
            ContentKind::Batch { first_id, last_id } => {
                format!("https://t.me/c/{}/{}-{}", internal, first_id, last_id)
            }
        }
    }
}

fn channel_internal_id(channel_id: i64) -> String {
    let raw = channel_id.to_string();
    raw.strip_prefix("-100").unwrap_or(&raw).to_string()
}

/// On-disk shape used by the file backend (serialized as one JSON array).
///
/// Field names match the columns of the database backend so the two
/// layouts stay interchangeable.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SerializableContentRecord {
    pub short_code: String,
    #[serde(default)]
    pub message_id: Option<i64>,
    #[serde(default)]
    pub batch_first_id: Option<i64>,
    #[serde(default)]
    pub batch_last_id: Option<i64>,
    #[serde(default)]
    pub is_batch: bool,
    pub uploader_id: i64,
    pub created_at: String,
}

impl SerializableContentRecord {
    /// Returns `None` for rows whose kind fields are inconsistent.
    pub fn into_record(self) -> Option<ContentRecord> {
        let kind = if self.is_batch {
            ContentKind::Batch {
                first_id: self.batch_first_id?,
                last_id: self.batch_last_id?,
            }
        } else {
            ContentKind::Single {
                message_id: self.message_id?,
            }
        };

        let created_at = chrono::DateTime::parse_from_rfc3339(&self.created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Some(ContentRecord {
            code: self.short_code,
            kind,
            uploader_id: self.uploader_id,
            created_at,
        })
    }
}

impl From<&ContentRecord> for SerializableContentRecord {
    fn from(record: &ContentRecord) -> Self {
        let (message_id, batch_first_id, batch_last_id, is_batch) = match record.kind {
            ContentKind::Single { message_id } => (Some(message_id), None, None, false),
            ContentKind::Batch { first_id, last_id } => {
                (None, Some(first_id), Some(last_id), true)
            }
        };

        SerializableContentRecord {
            short_code: record.code.clone(),
            message_id,
            batch_first_id,
            batch_last_id,
            is_batch,
            uploader_id: record.uploader_id,
            created_at: record.created_at.to_rfc3339(),
        }
    }
}
