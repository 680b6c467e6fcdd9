//! Create incident and validation tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Incident::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Incident::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Incident::ReporterId).string_len(32).not_null())
                    .col(ColumnDef::new(Incident::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Incident::CategoryCode).string_len(50).not_null())
                    .col(ColumnDef::new(Incident::OtherHazard).string_len(100))
                    .col(ColumnDef::new(Incident::Severity).string_len(20).not_null())
                    .col(
                        ColumnDef::new(Incident::OccurredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Incident::AreaCode).string_len(255).not_null())
                    .col(ColumnDef::new(Incident::Description).text().not_null())
                    .col(ColumnDef::new(Incident::Image).binary())
                    .col(ColumnDef::new(Incident::Latitude).double())
                    .col(ColumnDef::new(Incident::Longitude).double())
                    .col(ColumnDef::new(Incident::LocationAddress).string_len(500))
                    .col(
                        ColumnDef::new(Incident::IsResolved)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Incident::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_foreign_key(
                ForeignKey::create()
                    .name("fk_incident_reporter_id")
                    .from(Incident::Table, Incident::ReporterId)
                    .to(Reporter::Table, Reporter::Id)
                    .on_delete(ForeignKeyAction::Cascade)
                    .to_owned(),
            )
            .await?;

        manager
            .create_foreign_key(
                ForeignKey::create()
                    .name("fk_incident_area_code")
                    .from(Incident::Table, Incident::AreaCode)
                    .to(Area::Table, Area::Code)
                    .on_delete(ForeignKeyAction::Restrict)
                    .to_owned(),
            )
            .await?;

        manager
            .create_foreign_key(
                ForeignKey::create()
                    .name("fk_incident_category_code")
                    .from(Incident::Table, Incident::CategoryCode)
                    .to(HazardCategory::Table, HazardCategory::Code)
                    .on_delete(ForeignKeyAction::Restrict)
                    .to_owned(),
            )
            .await?;

        // Validated-incident counting and per-area moderation both scan these
        manager
            .create_index(
                Index::create()
                    .name("idx_incident_reporter_id")
                    .table(Incident::Table)
                    .col(Incident::ReporterId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_incident_area_code")
                    .table(Incident::Table)
                    .col(Incident::AreaCode)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Validation::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Validation::Id)
                            .string_len(50)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Validation::IncidentId).integer().not_null())
                    .col(
                        ColumnDef::new(Validation::Status)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Validation::DecidedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Validation::ValidatorId).string_len(32))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_validation_incident_id")
                    .table(Validation::Table)
                    .col(Validation::IncidentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_foreign_key(
                ForeignKey::create()
                    .name("fk_validation_incident_id")
                    .from(Validation::Table, Validation::IncidentId)
                    .to(Incident::Table, Incident::Id)
                    .on_delete(ForeignKeyAction::Cascade)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Validation::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Incident::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Incident {
    Table,
    Id,
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
    IsResolved,
    CreatedAt,
}

#[derive(Iden)]
enum Validation {
    Table,
    Id,
    IncidentId,
    Status,
    DecidedAt,
    ValidatorId,
}

#[derive(Iden)]
enum Reporter {
    Table,
    Id,
}

#[derive(Iden)]
enum Area {
    Table,
    Code,
}

#[derive(Iden)]
enum HazardCategory {
    Table,
    Code,
}
