//! Administrator entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "administrator")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub username: String,

    #[sea_orm(unique)]
    pub email: String,

    pub contact: String,

    #[serde(skip_serializing)]
    pub password_hash: String,

    pub first_name: String,

    #[sea_orm(nullable)]
    pub middle_name: Option<String>,

    pub last_name: String,

    /// Superusers bypass the permission list entirely.
    #[sea_orm(default_value = false)]
    pub is_superuser: bool,

    /// Comma-delimited capability names, e.g. `"ManageUsers,ManageIncidents"`.
    /// Ignored when `is_superuser` is set.
    #[sea_orm(nullable)]
    pub permissions: Option<String>,

    #[sea_orm(default_value = true)]
    pub is_active: bool,

    #[sea_orm(nullable)]
    pub suspension_end_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
