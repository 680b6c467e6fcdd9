//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20260101_000001_create_area_tables;
mod m20260101_000002_create_identity_tables;
mod m20260101_000003_create_incident_tables;
mod m20260101_000004_create_rejected_incident_table;
mod m20260101_000005_create_archive_tables;
mod m20260101_000006_create_badge_table;
mod m20260101_000007_create_comment_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000001_create_area_tables::Migration),
            Box::new(m20260101_000002_create_identity_tables::Migration),
            Box::new(m20260101_000003_create_incident_tables::Migration),
            Box::new(m20260101_000004_create_rejected_incident_table::Migration),
            Box::new(m20260101_000005_create_archive_tables::Migration),
            Box::new(m20260101_000006_create_badge_table::Migration),
            Box::new(m20260101_000007_create_comment_table::Migration),
        ]
    }
}
