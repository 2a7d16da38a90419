//! Shortlink store
//!
//! One `Storage` trait shared by the bot (writes) and the resolver
//! (reads), with backends selected by configuration at startup.

use std::sync::Arc;

use async_trait::async_trait;

pub mod backends;
pub mod models;

pub use models::{ContentKind, ContentRecord, SerializableContentRecord};

use crate::config::get_config;
use crate::errors::{Result, VaultlinkError};

/// Persistence contract for content records.
///
/// Records are insert-only: no update, no delete. `insert` fails with
/// `DuplicateCode` when the code is already taken, so callers can mint a
/// fresh code and retry.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get(&self, code: &str) -> Result<Option<ContentRecord>>;
    async fn insert(&self, record: ContentRecord) -> Result<()>;
    async fn load_all(&self) -> Result<Vec<ContentRecord>>;
    /// Distinct uploader ids across all records, for broadcast fan-out
    async fn uploader_ids(&self) -> Result<Vec<i64>>;
    async fn backend_name(&self) -> String;
}

pub struct StorageFactory;

impl StorageFactory {
    pub async fn create() -> Result<Arc<dyn Storage>> {
        let config = get_config();

        let boxed: Box<dyn Storage> = match config.storage.backend.as_str() {
            "file" => Box::new(backends::file::FileStorage::new(
                &config.storage.records_file,
            )?),
            "sqlite" | "postgres" | "mysql" | "mariadb" => Box::new(
                backends::sea_orm::SeaOrmStorage::new(&config.storage.database_url).await?,
            ),
            other => {
                return Err(VaultlinkError::database_config(format!(
                    "Unknown storage backend: {}. Supported: file, sqlite, postgres, mysql",
                    other
                )));
            }
        };

        Ok(Arc::from(boxed))
    }
}
