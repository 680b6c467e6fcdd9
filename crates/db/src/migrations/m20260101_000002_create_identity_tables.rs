//! Create reporter, moderator and administrator tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Reporter::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Reporter::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Reporter::Username).string_len(50).not_null())
                    .col(ColumnDef::new(Reporter::Email).string_len(255).not_null())
                    .col(ColumnDef::new(Reporter::Contact).string_len(20).not_null())
                    .col(ColumnDef::new(Reporter::PasswordHash).string_len(255).not_null())
                    .col(ColumnDef::new(Reporter::FirstName).string_len(50).not_null())
                    .col(ColumnDef::new(Reporter::MiddleName).string_len(50))
                    .col(ColumnDef::new(Reporter::LastName).string_len(50).not_null())
                    .col(ColumnDef::new(Reporter::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(Reporter::SuspensionEndAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Reporter::TrustScore).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Reporter::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reporter_username")
                    .table(Reporter::Table)
                    .col(Reporter::Username)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reporter_email")
                    .table(Reporter::Table)
                    .col(Reporter::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Moderator::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Moderator::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Moderator::Username).string_len(50).not_null())
                    .col(ColumnDef::new(Moderator::Email).string_len(255).not_null())
                    .col(ColumnDef::new(Moderator::Contact).string_len(20).not_null())
                    .col(ColumnDef::new(Moderator::PasswordHash).string_len(255).not_null())
                    .col(ColumnDef::new(Moderator::FirstName).string_len(50).not_null())
                    .col(ColumnDef::new(Moderator::MiddleName).string_len(50))
                    .col(ColumnDef::new(Moderator::LastName).string_len(50).not_null())
                    .col(ColumnDef::new(Moderator::AreaCode).string_len(255).not_null())
                    .col(ColumnDef::new(Moderator::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(Moderator::SuspensionEndAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Moderator::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_moderator_username")
                    .table(Moderator::Table)
                    .col(Moderator::Username)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_moderator_email")
                    .table(Moderator::Table)
                    .col(Moderator::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_moderator_area_code")
                    .table(Moderator::Table)
                    .col(Moderator::AreaCode)
                    .to_owned(),
            )
            .await?;

        manager
            .create_foreign_key(
                ForeignKey::create()
                    .name("fk_moderator_area_code")
                    .from(Moderator::Table, Moderator::AreaCode)
                    .to(Area::Table, Area::Code)
                    .on_delete(ForeignKeyAction::Restrict)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Administrator::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Administrator::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Administrator::Username).string_len(50).not_null())
                    .col(ColumnDef::new(Administrator::Email).string_len(255).not_null())
                    .col(ColumnDef::new(Administrator::Contact).string_len(20).not_null())
                    .col(
                        ColumnDef::new(Administrator::PasswordHash)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Administrator::FirstName).string_len(50).not_null())
                    .col(ColumnDef::new(Administrator::MiddleName).string_len(50))
                    .col(ColumnDef::new(Administrator::LastName).string_len(50).not_null())
                    .col(
                        ColumnDef::new(Administrator::IsSuperuser)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Administrator::Permissions).string_len(255))
                    .col(
                        ColumnDef::new(Administrator::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Administrator::SuspensionEndAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Administrator::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_administrator_username")
                    .table(Administrator::Table)
                    .col(Administrator::Username)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_administrator_email")
                    .table(Administrator::Table)
                    .col(Administrator::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Administrator::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Moderator::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Reporter::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Reporter {
    Table,
    Id,
    Username,
    Email,
    Contact,
    PasswordHash,
    FirstName,
    MiddleName,
    LastName,
    IsActive,
    SuspensionEndAt,
    TrustScore,
    CreatedAt,
}

#[derive(Iden)]
enum Moderator {
    Table,
    Id,
    Username,
    Email,
    Contact,
    PasswordHash,
    FirstName,
    MiddleName,
    LastName,
    AreaCode,
    IsActive,
    SuspensionEndAt,
    CreatedAt,
}

#[derive(Iden)]
enum Administrator {
    Table,
    Id,
    Username,
    Email,
    Contact,
    PasswordHash,
    FirstName,
    MiddleName,
    LastName,
    IsSuperuser,
    Permissions,
    IsActive,
    SuspensionEndAt,
    CreatedAt,
}

#[derive(Iden)]
enum Area {
    Table,
    Code,
}
