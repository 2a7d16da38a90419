use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Content::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Content::ShortCode)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Content::MessageId).big_integer().null())
                    .col(ColumnDef::new(Content::BatchFirstId).big_integer().null())
                    .col(ColumnDef::new(Content::BatchLastId).big_integer().null())
                    .col(
                        ColumnDef::new(Content::IsBatch)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Content::UploaderId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Content::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // broadcast fan-out reads distinct uploader ids
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_content_uploader_id")
                    .table(Content::Table)
                    .col(Content::UploaderId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_content_uploader_id").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Content::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Content {
    #[sea_orm(iden = "content")]
    Table,
    ShortCode,
    MessageId,
    BatchFirstId,
    BatchLastId,
    IsBatch,
    UploaderId,
    CreatedAt,
}
