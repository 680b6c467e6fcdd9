//! Identity service.
//!
//! Account CRUD for the three identity classes. Usernames and emails are
//! unique across the union of all three tables, so every create and rename
//! goes through the cross-class check first.

use chrono::{DateTime, Utc};
use safepoint_common::{AppError, AppResult, IdGenerator};
use safepoint_db::entities::{administrator, area, moderator, person_archive, reporter};
use safepoint_db::repositories::{
    AdministratorRepository, AreaRepository, IdentityRepository, ModeratorRepository,
    ReporterRepository,
};
use sea_orm::{IntoActiveModel, Set};
use serde::Deserialize;
use validator::Validate;

use super::auth::hash_password;
use super::authorization::{
    AuthorizationService, Permission, Principal, RequesterClaim, SuspensionState,
    reconcile_suspension,
};

/// Treat empty and whitespace-only patch values as "keep current".
#[must_use]
pub fn normalize_patch(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Input for self-service reporter registration.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterReporterInput {
    #[validate(length(min = 1, max = 50))]
    pub username: String,

    #[validate(email, length(max = 255))]
    pub email: String,

    #[validate(length(min = 7, max = 20))]
    pub contact: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(length(min = 1, max = 50))]
    pub first_name: String,

    #[validate(length(max = 50))]
    pub middle_name: Option<String>,

    #[validate(length(min = 1, max = 50))]
    pub last_name: String,
}

/// Input for creating a moderator.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateModeratorInput {
    #[validate(length(min = 1, max = 50))]
    pub username: String,

    #[validate(email, length(max = 255))]
    pub email: String,

    #[validate(length(min = 7, max = 20))]
    pub contact: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(length(min = 1, max = 50))]
    pub first_name: String,

    #[validate(length(max = 50))]
    pub middle_name: Option<String>,

    #[validate(length(min = 1, max = 50))]
    pub last_name: String,

    #[validate(length(min = 1, max = 255))]
    pub area_code: String,
}

/// Input for creating an administrator.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAdminInput {
    #[validate(length(min = 1, max = 50))]
    pub username: String,

    #[validate(email, length(max = 255))]
    pub email: String,

    #[validate(length(min = 7, max = 20))]
    pub contact: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(length(min = 1, max = 50))]
    pub first_name: String,

    #[validate(length(max = 50))]
    pub middle_name: Option<String>,

    #[validate(length(min = 1, max = 50))]
    pub last_name: String,

    /// Comma-delimited capability names.
    pub permissions: Option<String>,
}

/// Patch input shared by the three account classes.
///
/// `None` and empty strings leave the current value in place. Setting
/// `is_active` to true clears any suspension end time.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdatePersonInput {
    #[validate(length(max = 50))]
    pub username: Option<String>,

    #[validate(length(max = 255))]
    pub email: Option<String>,

    #[validate(length(max = 20))]
    pub contact: Option<String>,

    #[validate(length(max = 128))]
    pub password: Option<String>,

    #[validate(length(max = 50))]
    pub first_name: Option<String>,

    #[validate(length(max = 50))]
    pub middle_name: Option<String>,

    #[validate(length(max = 50))]
    pub last_name: Option<String>,

    /// Moderators only: reassign to another area.
    #[validate(length(max = 255))]
    pub area_code: Option<String>,

    /// Administrators only: replace the permission list.
    pub permissions: Option<String>,

    pub is_active: Option<bool>,

    pub suspension_end_at: Option<DateTime<Utc>>,
}

/// Identity service for business logic.
#[derive(Clone)]
pub struct IdentityService {
    identity_repo: IdentityRepository,
    reporter_repo: ReporterRepository,
    moderator_repo: ModeratorRepository,
    admin_repo: AdministratorRepository,
    area_repo: AreaRepository,
    authz: AuthorizationService,
    id_gen: IdGenerator,
}

impl IdentityService {
    /// Create a new identity service.
    #[must_use]
    pub fn new(
        identity_repo: IdentityRepository,
        reporter_repo: ReporterRepository,
        moderator_repo: ModeratorRepository,
        admin_repo: AdministratorRepository,
        area_repo: AreaRepository,
        authz: AuthorizationService,
    ) -> Self {
        Self {
            identity_repo,
            reporter_repo,
            moderator_repo,
            admin_repo,
            area_repo,
            authz,
            id_gen: IdGenerator::new(),
        }
    }

    async fn assert_unique(
        &self,
        username: &str,
        email: &str,
        exclude_id: Option<&str>,
    ) -> AppResult<()> {
        if self.identity_repo.username_taken(username, exclude_id).await? {
            return Err(AppError::Conflict(format!("username {username} is taken")));
        }
        if self.identity_repo.email_taken(email, exclude_id).await? {
            return Err(AppError::Conflict(format!("email {email} is taken")));
        }
        Ok(())
    }

    /// Self-service reporter registration. No authentication required.
    pub async fn register_reporter(
        &self,
        input: RegisterReporterInput,
    ) -> AppResult<reporter::Model> {
        input.validate()?;
        self.assert_unique(&input.username, &input.email, None).await?;

        let model = reporter::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(input.username),
            email: Set(input.email),
            contact: Set(input.contact),
            password_hash: Set(hash_password(&input.password)?),
            first_name: Set(input.first_name),
            middle_name: Set(normalize_patch(input.middle_name)),
            last_name: Set(input.last_name),
            is_active: Set(true),
            suspension_end_at: Set(None),
            trust_score: Set(0),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        self.reporter_repo.create(model).await
    }

    /// Privileged reporter creation by an administrator or moderator.
    pub async fn create_reporter(
        &self,
        claim: &RequesterClaim,
        input: RegisterReporterInput,
    ) -> AppResult<reporter::Model> {
        match self.authz.resolve(claim).await? {
            Principal::Admin(admin)
                if super::authorization::has_permission(&admin, Permission::ManageUsers) => {}
            Principal::Moderator(_) => {}
            Principal::Admin(_) => {
                return Err(AppError::Forbidden("missing permission ManageUsers".into()));
            }
            Principal::Reporter(_) => {
                return Err(AppError::Forbidden("staff access required".into()));
            }
        }

        self.register_reporter(input).await
    }

    /// Create a moderator. Requires the `ManageModerators` capability.
    ///
    /// The target area is provisioned on the fly if it does not exist yet.
    pub async fn create_moderator(
        &self,
        claim: &RequesterClaim,
        input: CreateModeratorInput,
    ) -> AppResult<moderator::Model> {
        self.authz
            .require_admin_with(claim, Permission::ManageModerators)
            .await?;

        input.validate()?;
        self.assert_unique(&input.username, &input.email, None).await?;

        let area = self.area_repo.ensure(&input.area_code, &input.area_code).await?;

        let model = moderator::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(input.username),
            email: Set(input.email),
            contact: Set(input.contact),
            password_hash: Set(hash_password(&input.password)?),
            first_name: Set(input.first_name),
            middle_name: Set(normalize_patch(input.middle_name)),
            last_name: Set(input.last_name),
            area_code: Set(area.code),
            is_active: Set(true),
            suspension_end_at: Set(None),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        self.moderator_repo.create(model).await
    }

    /// Create an administrator. Only superusers may mint administrators.
    pub async fn create_admin(
        &self,
        claim: &RequesterClaim,
        input: CreateAdminInput,
    ) -> AppResult<administrator::Model> {
        let actor = self.authz.require_admin(claim).await?;
        if !actor.is_superuser {
            return Err(AppError::Forbidden("superuser access required".into()));
        }

        input.validate()?;
        self.assert_unique(&input.username, &input.email, None).await?;

        let model = administrator::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(input.username),
            email: Set(input.email),
            contact: Set(input.contact),
            password_hash: Set(hash_password(&input.password)?),
            first_name: Set(input.first_name),
            middle_name: Set(normalize_patch(input.middle_name)),
            last_name: Set(input.last_name),
            // New administrators are never superusers; that flag is seeded
            // out of band.
            is_superuser: Set(false),
            permissions: Set(normalize_patch(input.permissions)),
            is_active: Set(true),
            suspension_end_at: Set(None),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        self.admin_repo.create(model).await
    }

    /// Patch a reporter. Allowed for the reporter themself, any moderator,
    /// or an administrator with `ManageUsers`.
    pub async fn update_reporter(
        &self,
        claim: &RequesterClaim,
        id: &str,
        input: UpdatePersonInput,
    ) -> AppResult<reporter::Model> {
        match self.authz.resolve(claim).await? {
            Principal::Reporter(actor) if actor.id == id => {}
            Principal::Reporter(_) => {
                return Err(AppError::Forbidden("not your account".into()));
            }
            Principal::Moderator(_) => {}
            Principal::Admin(admin) => {
                if !super::authorization::has_permission(&admin, Permission::ManageUsers) {
                    return Err(AppError::Forbidden("missing permission ManageUsers".into()));
                }
            }
        }

        input.validate()?;
        let current = self.reporter_repo.get_by_id(id).await?;

        let username = normalize_patch(input.username);
        let email = normalize_patch(input.email);
        if username.is_some() || email.is_some() {
            self.assert_unique(
                username.as_deref().unwrap_or(&current.username),
                email.as_deref().unwrap_or(&current.email),
                Some(id),
            )
            .await?;
        }

        let mut active = current.into_active_model();
        if let Some(v) = username {
            active.username = Set(v);
        }
        if let Some(v) = email {
            active.email = Set(v);
        }
        if let Some(v) = normalize_patch(input.contact) {
            active.contact = Set(v);
        }
        if let Some(v) = normalize_patch(input.password) {
            active.password_hash = Set(hash_password(&v)?);
        }
        if let Some(v) = normalize_patch(input.first_name) {
            active.first_name = Set(v);
        }
        if let Some(v) = normalize_patch(input.middle_name) {
            active.middle_name = Set(Some(v));
        }
        if let Some(v) = normalize_patch(input.last_name) {
            active.last_name = Set(v);
        }
        if let Some(flag) = input.is_active {
            active.is_active = Set(flag);
            if flag {
                active.suspension_end_at = Set(None);
            }
        }
        if let Some(end) = input.suspension_end_at {
            active.is_active = Set(false);
            active.suspension_end_at = Set(Some(end.into()));
        }

        self.reporter_repo.update(active).await
    }

    /// Patch a moderator. Requires `ManageModerators`.
    pub async fn update_moderator(
        &self,
        claim: &RequesterClaim,
        id: &str,
        input: UpdatePersonInput,
    ) -> AppResult<moderator::Model> {
        self.authz
            .require_admin_with(claim, Permission::ManageModerators)
            .await?;

        input.validate()?;
        let current = self.moderator_repo.get_by_id(id).await?;

        let username = normalize_patch(input.username);
        let email = normalize_patch(input.email);
        if username.is_some() || email.is_some() {
            self.assert_unique(
                username.as_deref().unwrap_or(&current.username),
                email.as_deref().unwrap_or(&current.email),
                Some(id),
            )
            .await?;
        }

        let mut active = current.into_active_model();
        if let Some(v) = username {
            active.username = Set(v);
        }
        if let Some(v) = email {
            active.email = Set(v);
        }
        if let Some(v) = normalize_patch(input.contact) {
            active.contact = Set(v);
        }
        if let Some(v) = normalize_patch(input.password) {
            active.password_hash = Set(hash_password(&v)?);
        }
        if let Some(v) = normalize_patch(input.first_name) {
            active.first_name = Set(v);
        }
        if let Some(v) = normalize_patch(input.middle_name) {
            active.middle_name = Set(Some(v));
        }
        if let Some(v) = normalize_patch(input.last_name) {
            active.last_name = Set(v);
        }
        if let Some(code) = normalize_patch(input.area_code) {
            let area = self.area_repo.ensure(&code, &code).await?;
            active.area_code = Set(area.code);
        }
        if let Some(flag) = input.is_active {
            active.is_active = Set(flag);
            if flag {
                active.suspension_end_at = Set(None);
            }
        }
        if let Some(end) = input.suspension_end_at {
            active.is_active = Set(false);
            active.suspension_end_at = Set(Some(end.into()));
        }

        self.moderator_repo.update(active).await
    }

    /// Patch an administrator. Requires `ManageAdmins`.
    pub async fn update_admin(
        &self,
        claim: &RequesterClaim,
        id: &str,
        input: UpdatePersonInput,
    ) -> AppResult<administrator::Model> {
        self.authz
            .require_admin_with(claim, Permission::ManageAdmins)
            .await?;

        input.validate()?;
        let current = self.admin_repo.get_by_id(id).await?;

        let username = normalize_patch(input.username);
        let email = normalize_patch(input.email);
        if username.is_some() || email.is_some() {
            self.assert_unique(
                username.as_deref().unwrap_or(&current.username),
                email.as_deref().unwrap_or(&current.email),
                Some(id),
            )
            .await?;
        }

        let mut active = current.into_active_model();
        if let Some(v) = username {
            active.username = Set(v);
        }
        if let Some(v) = email {
            active.email = Set(v);
        }
        if let Some(v) = normalize_patch(input.contact) {
            active.contact = Set(v);
        }
        if let Some(v) = normalize_patch(input.password) {
            active.password_hash = Set(hash_password(&v)?);
        }
        if let Some(v) = normalize_patch(input.first_name) {
            active.first_name = Set(v);
        }
        if let Some(v) = normalize_patch(input.middle_name) {
            active.middle_name = Set(Some(v));
        }
        if let Some(v) = normalize_patch(input.last_name) {
            active.last_name = Set(v);
        }
        if let Some(perms) = input.permissions {
            active.permissions = Set(normalize_patch(Some(perms)));
        }
        if let Some(flag) = input.is_active {
            active.is_active = Set(flag);
            if flag {
                active.suspension_end_at = Set(None);
            }
        }
        if let Some(end) = input.suspension_end_at {
            active.is_active = Set(false);
            active.suspension_end_at = Set(Some(end.into()));
        }

        self.admin_repo.update(active).await
    }

    /// Delete a reporter, archiving the account first.
    pub async fn delete_reporter(&self, claim: &RequesterClaim, id: &str) -> AppResult<()> {
        match self.authz.resolve(claim).await? {
            Principal::Moderator(_) => {}
            Principal::Admin(admin) => {
                if !super::authorization::has_permission(&admin, Permission::ManageUsers) {
                    return Err(AppError::Forbidden("missing permission ManageUsers".into()));
                }
            }
            Principal::Reporter(_) => {
                return Err(AppError::Forbidden("staff access required".into()));
            }
        }

        let reporter = self.reporter_repo.get_by_id(id).await?;

        let archive = person_archive::ActiveModel {
            person_id: Set(reporter.id.clone()),
            username: Set(reporter.username.clone()),
            email: Set(reporter.email.clone()),
            contact: Set(Some(reporter.contact.clone())),
            password_hash: Set(reporter.password_hash.clone()),
            role: Set("Reporter".to_string()),
            is_active: Set(reporter.is_active),
            suspension_end_at: Set(reporter.suspension_end_at),
            deleted_at: Set(Utc::now().into()),
            ..Default::default()
        };

        self.reporter_repo.delete_with_archive(reporter, archive).await
    }

    /// Delete a moderator. Requires `ManageModerators`.
    pub async fn delete_moderator(&self, claim: &RequesterClaim, id: &str) -> AppResult<()> {
        self.authz
            .require_admin_with(claim, Permission::ManageModerators)
            .await?;

        let moderator = self.moderator_repo.get_by_id(id).await?;

        let archive = person_archive::ActiveModel {
            person_id: Set(moderator.id.clone()),
            username: Set(moderator.username.clone()),
            email: Set(moderator.email.clone()),
            contact: Set(Some(moderator.contact.clone())),
            password_hash: Set(moderator.password_hash.clone()),
            role: Set("Moderator".to_string()),
            is_active: Set(moderator.is_active),
            suspension_end_at: Set(moderator.suspension_end_at),
            deleted_at: Set(Utc::now().into()),
            ..Default::default()
        };

        self.moderator_repo
            .delete_with_archive(moderator, archive)
            .await
    }

    /// Delete an administrator. Requires `ManageAdmins`, and administrators
    /// can never delete themselves.
    pub async fn delete_admin(&self, claim: &RequesterClaim, id: &str) -> AppResult<()> {
        let actor = self
            .authz
            .require_admin_with(claim, Permission::ManageAdmins)
            .await?;
        if actor.id == id {
            return Err(AppError::Forbidden(
                "administrators cannot delete themselves".into(),
            ));
        }

        let admin = self.admin_repo.get_by_id(id).await?;

        let archive = person_archive::ActiveModel {
            person_id: Set(admin.id.clone()),
            username: Set(admin.username.clone()),
            email: Set(admin.email.clone()),
            contact: Set(Some(admin.contact.clone())),
            password_hash: Set(admin.password_hash.clone()),
            role: Set("Admin".to_string()),
            is_active: Set(admin.is_active),
            suspension_end_at: Set(admin.suspension_end_at),
            deleted_at: Set(Utc::now().into()),
            ..Default::default()
        };

        self.admin_repo.delete_with_archive(admin, archive).await
    }

    /// Get a reporter by id.
    pub async fn get_reporter(&self, id: &str) -> AppResult<reporter::Model> {
        self.reporter_repo.get_by_id(id).await
    }

    /// List reporters, repairing any lapsed suspensions on the way out.
    pub async fn list_reporters(&self, claim: &RequesterClaim) -> AppResult<Vec<reporter::Model>> {
        match self.authz.resolve(claim).await? {
            Principal::Moderator(_) | Principal::Admin(_) => {}
            Principal::Reporter(_) => {
                return Err(AppError::Forbidden("staff access required".into()));
            }
        }

        let now = Utc::now();
        let mut out = Vec::new();
        for record in self.reporter_repo.find_all().await? {
            let state = SuspensionState {
                is_active: record.is_active,
                suspension_end_at: record.suspension_end_at,
            };
            if let Some(repaired) = reconcile_suspension(&state, now) {
                let mut active = record.into_active_model();
                active.is_active = Set(repaired.is_active);
                active.suspension_end_at = Set(repaired.suspension_end_at);
                out.push(self.reporter_repo.update(active).await?);
            } else {
                out.push(record);
            }
        }
        Ok(out)
    }

    /// List moderators, repairing any lapsed suspensions on the way out.
    pub async fn list_moderators(
        &self,
        claim: &RequesterClaim,
    ) -> AppResult<Vec<moderator::Model>> {
        self.authz.require_admin(claim).await?;

        let now = Utc::now();
        let mut out = Vec::new();
        for record in self.moderator_repo.find_all().await? {
            let state = SuspensionState {
                is_active: record.is_active,
                suspension_end_at: record.suspension_end_at,
            };
            if let Some(repaired) = reconcile_suspension(&state, now) {
                let mut active = record.into_active_model();
                active.is_active = Set(repaired.is_active);
                active.suspension_end_at = Set(repaired.suspension_end_at);
                out.push(self.moderator_repo.update(active).await?);
            } else {
                out.push(record);
            }
        }
        Ok(out)
    }

    /// List administrators, repairing any lapsed suspensions on the way out.
    pub async fn list_admins(
        &self,
        claim: &RequesterClaim,
    ) -> AppResult<Vec<administrator::Model>> {
        self.authz.require_admin(claim).await?;

        let now = Utc::now();
        let mut out = Vec::new();
        for record in self.admin_repo.find_all().await? {
            let state = SuspensionState {
                is_active: record.is_active,
                suspension_end_at: record.suspension_end_at,
            };
            if let Some(repaired) = reconcile_suspension(&state, now) {
                let mut active = record.into_active_model();
                active.is_active = Set(repaired.is_active);
                active.suspension_end_at = Set(repaired.suspension_end_at);
                out.push(self.admin_repo.update(active).await?);
            } else {
                out.push(record);
            }
        }
        Ok(out)
    }

    /// List all areas (convenience for account forms).
    pub async fn list_areas(&self) -> AppResult<Vec<area::Model>> {
        self.area_repo.find_all().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_patch_drops_blank_values() {
        assert_eq!(normalize_patch(None), None);
        assert_eq!(normalize_patch(Some(String::new())), None);
        assert_eq!(normalize_patch(Some("   ".to_string())), None);
        assert_eq!(
            normalize_patch(Some("keep".to_string())),
            Some("keep".to_string())
        );
    }

    #[test]
    fn test_register_input_rejects_bad_email() {
        let input = RegisterReporterInput {
            username: "alice".to_string(),
            email: "not-an-email".to_string(),
            contact: "09171234567".to_string(),
            password: "long-enough".to_string(),
            first_name: "Alice".to_string(),
            middle_name: None,
            last_name: "Santos".to_string(),
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_register_input_rejects_short_password() {
        let input = RegisterReporterInput {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            contact: "09171234567".to_string(),
            password: "short".to_string(),
            first_name: "Alice".to_string(),
            middle_name: None,
            last_name: "Santos".to_string(),
        };
        assert!(input.validate().is_err());
    }
}
