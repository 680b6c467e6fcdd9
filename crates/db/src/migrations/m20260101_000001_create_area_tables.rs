//! Create area and hazard category tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Area::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Area::Code).string_len(255).not_null().primary_key())
                    .col(ColumnDef::new(Area::Name).string_len(200).not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(HazardCategory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HazardCategory::Code)
                            .string_len(50)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(HazardCategory::Label).string_len(100))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(HazardCategory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Area::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Area {
    Table,
    Code,
    Name,
}

#[derive(Iden)]
enum HazardCategory {
    Table,
    Code,
    Label,
}
