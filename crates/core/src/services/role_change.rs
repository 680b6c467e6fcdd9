//! Role migration service.
//!
//! Moving an account between identity classes is a delete-and-insert across
//! two tables, done in one transaction. The moved account keeps its mutable
//! attributes unless an override says otherwise, and gets a fresh id in the
//! destination table.

use chrono::{DateTime, FixedOffset, Utc};
use safepoint_common::{AppError, AppResult};
use safepoint_db::entities::area::DEFAULT_AREA_CODE;
use safepoint_db::entities::{administrator, moderator, reporter};
use safepoint_db::repositories::{
    AreaRepository, IdentityRepository, NewPerson, PersonClass, PersonRecord,
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use super::auth::hash_password;
use super::authorization::{AuthorizationService, Permission, RequesterClaim, Role};
use crate::generate_id;

/// The attributes that survive a migration unless overridden.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationBaseline {
    pub username: String,
    pub email: String,
    pub contact: String,
    pub password_hash: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub is_active: bool,
    pub suspension_end_at: Option<DateTime<FixedOffset>>,
}

impl MigrationBaseline {
    /// Capture the mutable attributes of a source record.
    #[must_use]
    pub fn from_record(record: &PersonRecord) -> Self {
        match record {
            PersonRecord::Reporter(m) => Self {
                username: m.username.clone(),
                email: m.email.clone(),
                contact: m.contact.clone(),
                password_hash: m.password_hash.clone(),
                first_name: m.first_name.clone(),
                middle_name: m.middle_name.clone(),
                last_name: m.last_name.clone(),
                is_active: m.is_active,
                suspension_end_at: m.suspension_end_at,
            },
            PersonRecord::Moderator(m) => Self {
                username: m.username.clone(),
                email: m.email.clone(),
                contact: m.contact.clone(),
                password_hash: m.password_hash.clone(),
                first_name: m.first_name.clone(),
                middle_name: m.middle_name.clone(),
                last_name: m.last_name.clone(),
                is_active: m.is_active,
                suspension_end_at: m.suspension_end_at,
            },
            PersonRecord::Administrator(m) => Self {
                username: m.username.clone(),
                email: m.email.clone(),
                contact: m.contact.clone(),
                password_hash: m.password_hash.clone(),
                first_name: m.first_name.clone(),
                middle_name: m.middle_name.clone(),
                last_name: m.last_name.clone(),
                is_active: m.is_active,
                suspension_end_at: m.suspension_end_at,
            },
        }
    }
}

/// Per-attribute overrides for a migration. Explicit values win over the
/// source attributes; blanks keep them.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct RoleChangeOverrides {
    #[validate(length(max = 50))]
    pub username: Option<String>,

    #[validate(length(max = 255))]
    pub email: Option<String>,

    #[validate(length(max = 20))]
    pub contact: Option<String>,

    /// Plain text; re-hashed before it lands in the destination row.
    #[validate(length(min = 8, max = 128))]
    pub password: Option<String>,

    #[validate(length(max = 50))]
    pub first_name: Option<String>,

    #[validate(length(max = 50))]
    pub middle_name: Option<String>,

    #[validate(length(max = 50))]
    pub last_name: Option<String>,

    /// Moderator destinations only.
    #[validate(length(max = 255))]
    pub area_code: Option<String>,

    /// Administrator destinations only.
    pub permissions: Option<String>,
}

/// Apply the non-password overrides onto a baseline.
#[must_use]
pub fn merge_overrides(
    mut baseline: MigrationBaseline,
    overrides: &RoleChangeOverrides,
) -> MigrationBaseline {
    let pick = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());

    if let Some(v) = pick(&overrides.username) {
        baseline.username = v;
    }
    if let Some(v) = pick(&overrides.email) {
        baseline.email = v;
    }
    if let Some(v) = pick(&overrides.contact) {
        baseline.contact = v;
    }
    if let Some(v) = pick(&overrides.first_name) {
        baseline.first_name = v;
    }
    if let Some(v) = pick(&overrides.middle_name) {
        baseline.middle_name = Some(v);
    }
    if let Some(v) = pick(&overrides.last_name) {
        baseline.last_name = v;
    }
    baseline
}

/// Input for a role migration.
#[derive(Debug, Deserialize, Validate)]
pub struct ChangeRoleInput {
    #[validate(length(min = 1, max = 50))]
    pub target_id: String,

    pub current_role: String,

    pub target_role: String,

    #[serde(default)]
    #[validate(nested)]
    pub overrides: RoleChangeOverrides,
}

const fn class_of(role: Role) -> PersonClass {
    match role {
        Role::Reporter => PersonClass::Reporter,
        Role::Moderator => PersonClass::Moderator,
        Role::Admin => PersonClass::Administrator,
    }
}

/// Role migration service for business logic.
#[derive(Clone)]
pub struct RoleChangeService {
    identity_repo: IdentityRepository,
    area_repo: AreaRepository,
    authz: AuthorizationService,
}

impl RoleChangeService {
    /// Create a new role migration service.
    #[must_use]
    pub const fn new(
        identity_repo: IdentityRepository,
        area_repo: AreaRepository,
        authz: AuthorizationService,
    ) -> Self {
        Self {
            identity_repo,
            area_repo,
            authz,
        }
    }

    /// Move an account from its current identity class to another.
    ///
    /// Promotion to administrator takes a superuser; to moderator,
    /// `ManageModerators`; to reporter, `ManageUsers`. Administrators cannot
    /// migrate their own account.
    pub async fn change_role(
        &self,
        claim: &RequesterClaim,
        input: ChangeRoleInput,
    ) -> AppResult<PersonRecord> {
        input.validate()?;

        let current_role: Role = input.current_role.parse()?;
        let target_role: Role = input.target_role.parse()?;
        if current_role == target_role {
            return Err(AppError::BadRequest(
                "account already holds that role".into(),
            ));
        }

        let actor = match target_role {
            Role::Admin => {
                let actor = self.authz.require_admin(claim).await?;
                if !actor.is_superuser {
                    return Err(AppError::Forbidden("superuser access required".into()));
                }
                actor
            }
            Role::Moderator => {
                self.authz
                    .require_admin_with(claim, Permission::ManageModerators)
                    .await?
            }
            Role::Reporter => {
                self.authz
                    .require_admin_with(claim, Permission::ManageUsers)
                    .await?
            }
        };
        if current_role == Role::Admin && actor.id == input.target_id {
            return Err(AppError::Forbidden(
                "administrators cannot migrate themselves".into(),
            ));
        }

        let source_class = class_of(current_role);
        let source = self
            .identity_repo
            .find_in_class(source_class, &input.target_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("{current_role} {}", input.target_id))
            })?;

        let mut merged = merge_overrides(MigrationBaseline::from_record(&source), &input.overrides);
        if let Some(password) = input
            .overrides
            .password
            .as_deref()
            .filter(|p| !p.trim().is_empty())
        {
            merged.password_hash = hash_password(password)?;
        }

        if self
            .identity_repo
            .username_taken(&merged.username, Some(&input.target_id))
            .await?
        {
            return Err(AppError::Conflict(format!(
                "username {} is taken",
                merged.username
            )));
        }
        if self
            .identity_repo
            .email_taken(&merged.email, Some(&input.target_id))
            .await?
        {
            return Err(AppError::Conflict(format!("email {} is taken", merged.email)));
        }

        let target = self.build_target(target_role, merged, &input.overrides).await?;

        self.identity_repo
            .migrate(source_class, &input.target_id, target)
            .await
    }

    async fn build_target(
        &self,
        target_role: Role,
        merged: MigrationBaseline,
        overrides: &RoleChangeOverrides,
    ) -> AppResult<NewPerson> {
        let now = Utc::now();
        Ok(match target_role {
            Role::Reporter => NewPerson::Reporter(reporter::ActiveModel {
                id: Set(generate_id()),
                username: Set(merged.username),
                email: Set(merged.email),
                contact: Set(merged.contact),
                password_hash: Set(merged.password_hash),
                first_name: Set(merged.first_name),
                middle_name: Set(merged.middle_name),
                last_name: Set(merged.last_name),
                is_active: Set(merged.is_active),
                suspension_end_at: Set(merged.suspension_end_at),
                trust_score: Set(0),
                created_at: Set(now.into()),
                ..Default::default()
            }),
            Role::Moderator => {
                let code = overrides
                    .area_code
                    .as_deref()
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .unwrap_or(DEFAULT_AREA_CODE);
                let area = self.area_repo.ensure(code, code).await?;

                NewPerson::Moderator(moderator::ActiveModel {
                    id: Set(generate_id()),
                    username: Set(merged.username),
                    email: Set(merged.email),
                    contact: Set(merged.contact),
                    password_hash: Set(merged.password_hash),
                    first_name: Set(merged.first_name),
                    middle_name: Set(merged.middle_name),
                    last_name: Set(merged.last_name),
                    area_code: Set(area.code),
                    is_active: Set(merged.is_active),
                    suspension_end_at: Set(merged.suspension_end_at),
                    created_at: Set(now.into()),
                    ..Default::default()
                })
            }
            Role::Admin => NewPerson::Administrator(administrator::ActiveModel {
                id: Set(generate_id()),
                username: Set(merged.username),
                email: Set(merged.email),
                contact: Set(merged.contact),
                password_hash: Set(merged.password_hash),
                first_name: Set(merged.first_name),
                middle_name: Set(merged.middle_name),
                last_name: Set(merged.last_name),
                // Migration never mints a superuser.
                is_superuser: Set(false),
                permissions: Set(overrides
                    .permissions
                    .clone()
                    .filter(|p| !p.trim().is_empty())),
                is_active: Set(merged.is_active),
                suspension_end_at: Set(merged.suspension_end_at),
                created_at: Set(now.into()),
                ..Default::default()
            }),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn baseline() -> MigrationBaseline {
        MigrationBaseline {
            username: "carlo".to_string(),
            email: "carlo@example.com".to_string(),
            contact: "09181112233".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            first_name: "Carlo".to_string(),
            middle_name: None,
            last_name: "Reyes".to_string(),
            is_active: true,
            suspension_end_at: None,
        }
    }

    #[test]
    fn test_merge_overrides_explicit_wins() {
        let overrides = RoleChangeOverrides {
            email: Some("new@example.com".to_string()),
            first_name: Some("Carlos".to_string()),
            ..Default::default()
        };

        let merged = merge_overrides(baseline(), &overrides);

        assert_eq!(merged.email, "new@example.com");
        assert_eq!(merged.first_name, "Carlos");
        assert_eq!(merged.username, "carlo");
        assert_eq!(merged.last_name, "Reyes");
    }

    #[test]
    fn test_merge_overrides_blank_keeps_baseline() {
        let overrides = RoleChangeOverrides {
            username: Some("   ".to_string()),
            email: Some(String::new()),
            ..Default::default()
        };

        let merged = merge_overrides(baseline(), &overrides);

        assert_eq!(merged.username, "carlo");
        assert_eq!(merged.email, "carlo@example.com");
    }

    #[test]
    fn test_merge_overrides_never_touches_password_hash() {
        let overrides = RoleChangeOverrides {
            password: Some("brand-new-secret".to_string()),
            ..Default::default()
        };

        let merged = merge_overrides(baseline(), &overrides);

        assert_eq!(merged.password_hash, "$argon2id$stub");
    }
}
