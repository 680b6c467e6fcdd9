//! Hazard category entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category code for free-form hazards; reports under it carry their own label.
pub const OTHER_CATEGORY_CODE: &str = "other";

/// Hazard category, auto-registered the first time a report uses a new code.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "hazard_category")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub code: String,

    #[sea_orm(nullable)]
    pub label: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::incident::Entity")]
    Incidents,
}

impl Related<super::incident::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Incidents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
