//! Create archive tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(IncidentArchive::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(IncidentArchive::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(IncidentArchive::OriginalIncidentId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IncidentArchive::ReporterId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(IncidentArchive::Title).string_len(255).not_null())
                    .col(
                        ColumnDef::new(IncidentArchive::CategoryCode)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(ColumnDef::new(IncidentArchive::OtherHazard).string_len(100))
                    .col(ColumnDef::new(IncidentArchive::Severity).string_len(20).not_null())
                    .col(
                        ColumnDef::new(IncidentArchive::OccurredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IncidentArchive::AreaCode)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(IncidentArchive::Description).text().not_null())
                    .col(ColumnDef::new(IncidentArchive::Image).binary())
                    .col(ColumnDef::new(IncidentArchive::Latitude).double())
                    .col(ColumnDef::new(IncidentArchive::Longitude).double())
                    .col(ColumnDef::new(IncidentArchive::LocationAddress).string_len(500))
                    .col(
                        ColumnDef::new(IncidentArchive::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IncidentArchive::DeletedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PersonArchive::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PersonArchive::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PersonArchive::PersonId).string_len(32).not_null())
                    .col(ColumnDef::new(PersonArchive::Username).string_len(100).not_null())
                    .col(ColumnDef::new(PersonArchive::Email).string_len(255).not_null())
                    .col(ColumnDef::new(PersonArchive::Contact).string_len(20))
                    .col(
                        ColumnDef::new(PersonArchive::PasswordHash)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PersonArchive::Role).string_len(20).not_null())
                    .col(
                        ColumnDef::new(PersonArchive::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(PersonArchive::SuspensionEndAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(PersonArchive::DeletedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PersonArchive::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(IncidentArchive::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum IncidentArchive {
    Table,
    Id,
    OriginalIncidentId,
    ReporterId,
    Title,
    CategoryCode,
    OtherHazard,
    Severity,
    OccurredAt,
    AreaCode,
    Description,
    Image,
    Latitude,
    Longitude,
    LocationAddress,
    CreatedAt,
    DeletedAt,
}

#[derive(Iden)]
enum PersonArchive {
    Table,
    Id,
    PersonId,
    Username,
    Email,
    Contact,
    PasswordHash,
    Role,
    IsActive,
    SuspensionEndAt,
    DeletedAt,
}
