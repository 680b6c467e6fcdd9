//! Create rejected incident table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RejectedIncident::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RejectedIncident::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RejectedIncident::OriginalIncidentId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RejectedIncident::ReporterId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(RejectedIncident::Title).string_len(255).not_null())
                    .col(
                        ColumnDef::new(RejectedIncident::CategoryCode)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(ColumnDef::new(RejectedIncident::OtherHazard).string_len(100))
                    .col(ColumnDef::new(RejectedIncident::Severity).string_len(20).not_null())
                    .col(
                        ColumnDef::new(RejectedIncident::OccurredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RejectedIncident::AreaCode)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(RejectedIncident::Description).text().not_null())
                    .col(ColumnDef::new(RejectedIncident::Image).binary())
                    .col(ColumnDef::new(RejectedIncident::Latitude).double())
                    .col(ColumnDef::new(RejectedIncident::Longitude).double())
                    .col(ColumnDef::new(RejectedIncident::LocationAddress).string_len(500))
                    .col(
                        ColumnDef::new(RejectedIncident::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RejectedIncident::RejectorId).string_len(32))
                    .col(
                        ColumnDef::new(RejectedIncident::RejectedAt)
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
                    .name("idx_rejected_incident_original_id")
                    .table(RejectedIncident::Table)
                    .col(RejectedIncident::OriginalIncidentId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RejectedIncident::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum RejectedIncident {
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
    RejectorId,
    RejectedAt,
}
