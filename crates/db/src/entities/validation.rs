//! Validation entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Validation verdict for an incident. At most one row per incident.
///
/// `status = true` means validated; `status = false` with a decision
/// timestamp means a moderator marked it down; `status = false` without one
/// means still pending.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "validation")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub incident_id: i32,

    pub status: bool,

    #[sea_orm(nullable)]
    pub decided_at: Option<DateTimeWithTimeZone>,

    /// Administrator or moderator who made the call.
    #[sea_orm(nullable)]
    pub validator_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::incident::Entity",
        from = "Column::IncidentId",
        to = "super::incident::Column::Id"
    )]
    Incident,
}

impl Related<super::incident::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Incident.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
