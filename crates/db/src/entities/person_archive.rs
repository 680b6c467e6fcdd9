//! Person archive entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Copy of a deleted account, kept for audit. Append-only.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "person_archive")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Id the account carried while it was live.
    pub person_id: String,

    pub username: String,

    pub email: String,

    #[sea_orm(nullable)]
    pub contact: Option<String>,

    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Role name at deletion time ("Reporter", "Moderator" or "Admin").
    pub role: String,

    pub is_active: bool,

    #[sea_orm(nullable)]
    pub suspension_end_at: Option<DateTimeWithTimeZone>,

    pub deleted_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
