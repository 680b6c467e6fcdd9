//! Incident archive entity.

use super::incident::Severity;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Terminal copy of a permanently deleted report. Append-only.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "incident_archive")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub original_incident_id: i32,

    pub reporter_id: String,

    pub title: String,

    pub category_code: String,

    #[sea_orm(nullable)]
    pub other_hazard: Option<String>,

    pub severity: Severity,

    pub occurred_at: DateTimeWithTimeZone,

    pub area_code: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    #[sea_orm(nullable)]
    pub image: Option<Vec<u8>>,

    #[sea_orm(nullable)]
    pub latitude: Option<f64>,

    #[sea_orm(nullable)]
    pub longitude: Option<f64>,

    #[sea_orm(nullable)]
    pub location_address: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub deleted_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
