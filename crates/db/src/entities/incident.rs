//! Incident entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Report severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[derive(Default)]
pub enum Severity {
    #[sea_orm(string_value = "low")]
    #[default]
    Low,
    #[sea_orm(string_value = "moderate")]
    Moderate,
    #[sea_orm(string_value = "high")]
    High,
}

/// Incident report model.
///
/// A report with no validation row, or one whose validation row has
/// `status = false` and no decision timestamp, is pending review.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "incident")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Reporter who submitted this incident.
    pub reporter_id: String,

    pub title: String,

    pub category_code: String,

    /// Free-form hazard label, meaningful only when the category is "other".
    #[sea_orm(nullable)]
    pub other_hazard: Option<String>,

    pub severity: Severity,

    /// When the hazard was observed (reporter-supplied).
    pub occurred_at: DateTimeWithTimeZone,

    pub area_code: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Raw image bytes, transported as base64 over the API.
    #[sea_orm(nullable)]
    pub image: Option<Vec<u8>>,

    #[sea_orm(nullable)]
    pub latitude: Option<f64>,

    #[sea_orm(nullable)]
    pub longitude: Option<f64>,

    #[sea_orm(nullable)]
    pub location_address: Option<String>,

    #[sea_orm(default_value = false)]
    pub is_resolved: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::reporter::Entity",
        from = "Column::ReporterId",
        to = "super::reporter::Column::Id"
    )]
    Reporter,

    #[sea_orm(
        belongs_to = "super::area::Entity",
        from = "Column::AreaCode",
        to = "super::area::Column::Code"
    )]
    Area,

    #[sea_orm(
        belongs_to = "super::hazard_category::Entity",
        from = "Column::CategoryCode",
        to = "super::hazard_category::Column::Code"
    )]
    Category,

    #[sea_orm(has_one = "super::validation::Entity")]
    Validation,

    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,
}

impl Related<super::reporter::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reporter.def()
    }
}

impl Related<super::area::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Area.def()
    }
}

impl Related<super::hazard_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::validation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Validation.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
