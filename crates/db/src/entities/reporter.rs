//! Reporter entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reporter")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Unique across reporters, moderators and administrators.
    #[sea_orm(unique)]
    pub username: String,

    /// Unique across reporters, moderators and administrators.
    #[sea_orm(unique)]
    pub email: String,

    pub contact: String,

    #[serde(skip_serializing)]
    pub password_hash: String,

    pub first_name: String,

    #[sea_orm(nullable)]
    pub middle_name: Option<String>,

    pub last_name: String,

    /// False while suspended; flips back once the suspension window lapses.
    #[sea_orm(default_value = true)]
    pub is_active: bool,

    #[sea_orm(nullable)]
    pub suspension_end_at: Option<DateTimeWithTimeZone>,

    #[sea_orm(default_value = 0)]
    pub trust_score: i32,

    pub created_at: DateTimeWithTimeZone,
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
