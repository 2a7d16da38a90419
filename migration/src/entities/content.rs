//! Archived content entity
//!
//! One row per minted shortlink. Single items carry `message_id`;
//! batches carry the inclusive `batch_first_id`/`batch_last_id` bounds.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "content")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub short_code: String,
    pub message_id: Option<i64>,
    pub batch_first_id: Option<i64>,
    pub batch_last_id: Option<i64>,
    pub is_batch: bool,
    pub uploader_id: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
