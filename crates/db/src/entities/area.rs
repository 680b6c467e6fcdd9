//! Area entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Code used when a report arrives without a recognizable area.
pub const DEFAULT_AREA_CODE: &str = "DEFAULT";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "area")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub code: String,

    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::moderator::Entity")]
    Moderators,

    #[sea_orm(has_many = "super::incident::Entity")]
    Incidents,
}

impl Related<super::moderator::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Moderators.def()
    }
}

impl Related<super::incident::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Incidents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
