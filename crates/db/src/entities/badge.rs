//! Badge entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Awarded badge. Unique per `(person_id, badge_name)`; badges are never
/// revoked by the automatic engine, only by an explicit moderator action.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "badge")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub person_id: String,

    pub badge_name: String,

    pub awarded_at: DateTimeWithTimeZone,

    /// Username of the awarding actor, or "System" for automatic awards.
    #[sea_orm(nullable)]
    pub awarded_by: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
