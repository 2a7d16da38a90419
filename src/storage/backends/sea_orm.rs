//! SeaORM database backend
//!
//! Supports SQLite, MySQL/MariaDB, and PostgreSQL through one connection
//! layer; the concrete engine is inferred from the database URL.

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait, QueryOrder,
    QuerySelect,
};
use tracing::{info, warn};

use migration::entities::content;
use migration::{Migrator, MigratorTrait};

use super::super::{ContentKind, ContentRecord, Storage};
use crate::errors::{Result, VaultlinkError};

/// Infer the database engine from the connection URL
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite://")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(VaultlinkError::database_config(format!(
            "Cannot infer database engine from URL: {}. Supported schemes: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

/// Connect to SQLite with auto-create and WAL, so resolver reads can
/// overlap bot writes
pub async fn connect_sqlite(database_url: &str) -> Result<DatabaseConnection> {
    use sea_orm::SqlxSqliteConnector;
    use sea_orm::sqlx::SqlitePool;
    use sea_orm::sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};
    use std::str::FromStr;

    let opt = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| {
            VaultlinkError::database_config(format!("Failed to parse SQLite URL: {}", e))
        })?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(5));

    let pool = SqlitePool::connect_with(opt).await.map_err(|e| {
        VaultlinkError::database_connection(format!("Failed to connect to SQLite: {}", e))
    })?;

    Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
}

/// Connect to MySQL/PostgreSQL
pub async fn connect_generic(database_url: &str, backend_name: &str) -> Result<DatabaseConnection> {
    let mut opt = ConnectOptions::new(database_url.to_owned());
    opt.max_connections(10)
        .connect_timeout(std::time::Duration::from_secs(8))
        .acquire_timeout(std::time::Duration::from_secs(8))
        .idle_timeout(std::time::Duration::from_secs(300))
        .sqlx_logging(false);

    Database::connect(opt).await.map_err(|e| {
        VaultlinkError::database_connection(format!(
            "Failed to connect to {} database: {}",
            backend_name.to_uppercase(),
            e
        ))
    })
}

pub async fn run_migrations(db: &DatabaseConnection) -> Result<()> {
    Migrator::up(db, None)
        .await
        .map_err(|e| VaultlinkError::database_operation(format!("Migration failed: {}", e)))?;

    info!("Database migrations completed");
    Ok(())
}

#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: String,
}

impl SeaOrmStorage {
    pub async fn new(database_url: &str) -> Result<Self> {
        if database_url.is_empty() {
            return Err(VaultlinkError::database_config("DATABASE_URL is not set"));
        }

        let backend_name = infer_backend_from_url(database_url)?;

        let db = if backend_name == "sqlite" {
            connect_sqlite(database_url).await?
        } else {
            connect_generic(database_url, &backend_name).await?
        };

        let storage = SeaOrmStorage { db, backend_name };

        run_migrations(&storage.db).await?;

        info!(
            "{} storage initialized",
            storage.backend_name.to_uppercase()
        );
        Ok(storage)
    }
}

/// Row → record; `None` for rows whose kind columns are inconsistent
pub fn model_to_record(model: content::Model) -> Option<ContentRecord> {
    let kind = if model.is_batch {
        ContentKind::Batch {
            first_id: model.batch_first_id?,
            last_id: model.batch_last_id?,
        }
    } else {
        ContentKind::Single {
            message_id: model.message_id?,
        }
    };

    Some(ContentRecord {
        code: model.short_code,
        kind,
        uploader_id: model.uploader_id,
        created_at: model.created_at,
    })
}

pub fn record_to_active_model(record: &ContentRecord) -> content::ActiveModel {
    use sea_orm::ActiveValue::Set;

    let (message_id, batch_first_id, batch_last_id, is_batch) = match record.kind {
        ContentKind::Single { message_id } => (Some(message_id), None, None, false),
        ContentKind::Batch { first_id, last_id } => (None, Some(first_id), Some(last_id), true),
    };

    content::ActiveModel {
        short_code: Set(record.code.clone()),
        message_id: Set(message_id),
        batch_first_id: Set(batch_first_id),
        batch_last_id: Set(batch_last_id),
        is_batch: Set(is_batch),
        uploader_id: Set(record.uploader_id),
        created_at: Set(record.created_at),
    }
}

#[async_trait]
impl Storage for SeaOrmStorage {
    async fn get(&self, code: &str) -> Result<Option<ContentRecord>> {
        let model = content::Entity::find_by_id(code.to_string())
            .one(&self.db)
            .await
            .map_err(|e| {
                VaultlinkError::database_operation(format!("Lookup of '{}' failed: {}", code, e))
            })?;

        Ok(model.and_then(|m| {
            let code = m.short_code.clone();
            let record = model_to_record(m);
            if record.is_none() {
                warn!("Inconsistent content row for code '{}'", code);
            }
            record
        }))
    }

    async fn insert(&self, record: ContentRecord) -> Result<()> {
        let active_model = record_to_active_model(&record);

        // Plain insert: the primary key constraint is the duplicate check,
        // surfaced as DuplicateCode by the DbErr conversion.
        content::Entity::insert(active_model).exec(&self.db).await?;

        info!("Content record inserted: {}", record.code);
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<ContentRecord>> {
        let models = content::Entity::find()
            .order_by_asc(content::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| {
                VaultlinkError::database_operation(format!("Failed to list records: {}", e))
            })?;

        Ok(models.into_iter().filter_map(model_to_record).collect())
    }

    async fn uploader_ids(&self) -> Result<Vec<i64>> {
        let ids: Vec<i64> = content::Entity::find()
            .select_only()
            .column(content::Column::UploaderId)
            .distinct()
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| {
                VaultlinkError::database_operation(format!("Failed to list uploaders: {}", e))
            })?;

        Ok(ids)
    }

    async fn backend_name(&self) -> String {
        self.backend_name.clone()
    }
}
