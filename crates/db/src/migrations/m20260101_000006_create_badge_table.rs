//! Create badge table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Badge::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Badge::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Badge::PersonId).string_len(32).not_null())
                    .col(ColumnDef::new(Badge::BadgeName).string_len(50).not_null())
                    .col(
                        ColumnDef::new(Badge::AwardedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Badge::AwardedBy).string_len(50))
                    .to_owned(),
            )
            .await?;

        // Idempotent awarding leans on this constraint
        manager
            .create_index(
                Index::create()
                    .name("idx_badge_person_name")
                    .table(Badge::Table)
                    .col(Badge::PersonId)
                    .col(Badge::BadgeName)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Badge::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Badge {
    Table,
    Id,
    PersonId,
    BadgeName,
    AwardedAt,
    AwardedBy,
}
