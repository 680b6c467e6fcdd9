//! Authentication service.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use safepoint_common::{AppError, AppResult};
use safepoint_db::repositories::{
    AdministratorRepository, IdentityRepository, ModeratorRepository, PersonRecord,
    ReporterRepository,
};
use sea_orm::{IntoActiveModel, Set};
use serde::Deserialize;
use validator::Validate;

use super::authorization::{
    AuthorizationService, Principal, RequesterClaim, Role, SuspensionState, reconcile_suspension,
};

/// Hash a password using Argon2.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Input for logging in.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(length(min = 1, max = 50))]
    pub username: String,

    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Input for changing one's own password.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePasswordInput {
    #[validate(length(min = 1, max = 128))]
    pub current_password: String,

    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

/// Input for resetting a forgotten password by email.
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordInput {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

/// A successful login, ready to serialize into the session response.
#[derive(Debug, Clone)]
pub struct LoginSession {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub email: String,
    /// Set for moderators only.
    pub area_code: Option<String>,
    /// Set for administrators only.
    pub is_superuser: bool,
    pub permissions: Option<String>,
}

/// Authentication service for business logic.
#[derive(Clone)]
pub struct AuthService {
    identity_repo: IdentityRepository,
    reporter_repo: ReporterRepository,
    moderator_repo: ModeratorRepository,
    admin_repo: AdministratorRepository,
    authz: AuthorizationService,
}

impl AuthService {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(
        identity_repo: IdentityRepository,
        reporter_repo: ReporterRepository,
        moderator_repo: ModeratorRepository,
        admin_repo: AdministratorRepository,
        authz: AuthorizationService,
    ) -> Self {
        Self {
            identity_repo,
            reporter_repo,
            moderator_repo,
            admin_repo,
            authz,
        }
    }

    /// Log a person in by username and password.
    ///
    /// The username is looked up across reporters, then administrators, then
    /// moderators. A lapsed suspension is repaired before the activity gate;
    /// a live suspension refuses the login with its end time.
    pub async fn login(&self, input: LoginInput) -> AppResult<LoginSession> {
        input.validate()?;

        let record = self
            .identity_repo
            .find_by_username(&input.username)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let record = self.reconcile_record(record).await?;

        let (is_active, suspension_end_at) = match &record {
            PersonRecord::Reporter(m) => (m.is_active, m.suspension_end_at),
            PersonRecord::Moderator(m) => (m.is_active, m.suspension_end_at),
            PersonRecord::Administrator(m) => (m.is_active, m.suspension_end_at),
        };
        if !is_active {
            return Err(match suspension_end_at {
                Some(end) => AppError::Suspended(end.to_rfc3339()),
                None => AppError::Unauthorized,
            });
        }

        let hash = match &record {
            PersonRecord::Reporter(m) => &m.password_hash,
            PersonRecord::Moderator(m) => &m.password_hash,
            PersonRecord::Administrator(m) => &m.password_hash,
        };
        if !verify_password(&input.password, hash)? {
            return Err(AppError::Unauthorized);
        }

        Ok(match record {
            PersonRecord::Reporter(m) => LoginSession {
                id: m.id,
                username: m.username,
                role: Role::Reporter,
                email: m.email,
                area_code: None,
                is_superuser: false,
                permissions: None,
            },
            PersonRecord::Moderator(m) => LoginSession {
                id: m.id,
                username: m.username,
                role: Role::Moderator,
                email: m.email,
                area_code: Some(m.area_code),
                is_superuser: false,
                permissions: None,
            },
            PersonRecord::Administrator(m) => LoginSession {
                id: m.id,
                username: m.username,
                role: Role::Admin,
                email: m.email,
                area_code: None,
                is_superuser: m.is_superuser,
                permissions: m.permissions,
            },
        })
    }

    /// Change the requester's own password, verifying the current one first.
    pub async fn update_password(
        &self,
        claim: &RequesterClaim,
        input: UpdatePasswordInput,
    ) -> AppResult<()> {
        input.validate()?;

        let principal = self.authz.resolve(claim).await?;

        let hash = match &principal {
            Principal::Reporter(m) => &m.password_hash,
            Principal::Moderator(m) => &m.password_hash,
            Principal::Admin(m) => &m.password_hash,
        };
        if !verify_password(&input.current_password, hash)? {
            return Err(AppError::BadRequest("current password is wrong".into()));
        }

        let new_hash = hash_password(&input.new_password)?;
        match principal {
            Principal::Reporter(m) => {
                let mut active = m.into_active_model();
                active.password_hash = Set(new_hash);
                self.reporter_repo.update(active).await?;
            }
            Principal::Moderator(m) => {
                let mut active = m.into_active_model();
                active.password_hash = Set(new_hash);
                self.moderator_repo.update(active).await?;
            }
            Principal::Admin(m) => {
                let mut active = m.into_active_model();
                active.password_hash = Set(new_hash);
                self.admin_repo.update(active).await?;
            }
        }

        Ok(())
    }

    /// Reset the password of whichever account owns the email.
    pub async fn reset_password(&self, input: ResetPasswordInput) -> AppResult<()> {
        input.validate()?;

        let record = self
            .identity_repo
            .find_by_email(&input.email)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("account for {}", input.email)))?;

        let new_hash = hash_password(&input.new_password)?;
        match record {
            PersonRecord::Reporter(m) => {
                let mut active = m.into_active_model();
                active.password_hash = Set(new_hash);
                self.reporter_repo.update(active).await?;
            }
            PersonRecord::Moderator(m) => {
                let mut active = m.into_active_model();
                active.password_hash = Set(new_hash);
                self.moderator_repo.update(active).await?;
            }
            PersonRecord::Administrator(m) => {
                let mut active = m.into_active_model();
                active.password_hash = Set(new_hash);
                self.admin_repo.update(active).await?;
            }
        }

        Ok(())
    }

    /// Whether any account owns this email. Used before offering a reset.
    pub async fn email_exists(&self, email: &str) -> AppResult<bool> {
        Ok(self.identity_repo.find_by_email(email).await?.is_some())
    }

    /// Repair a lapsed suspension on the looked-up record, persisting the
    /// change in the owning table.
    async fn reconcile_record(&self, record: PersonRecord) -> AppResult<PersonRecord> {
        let now = Utc::now();
        match record {
            PersonRecord::Reporter(m) => {
                let state = SuspensionState {
                    is_active: m.is_active,
                    suspension_end_at: m.suspension_end_at,
                };
                if let Some(repaired) = reconcile_suspension(&state, now) {
                    let mut active = m.into_active_model();
                    active.is_active = Set(repaired.is_active);
                    active.suspension_end_at = Set(repaired.suspension_end_at);
                    Ok(PersonRecord::Reporter(self.reporter_repo.update(active).await?))
                } else {
                    Ok(PersonRecord::Reporter(m))
                }
            }
            PersonRecord::Moderator(m) => {
                let state = SuspensionState {
                    is_active: m.is_active,
                    suspension_end_at: m.suspension_end_at,
                };
                if let Some(repaired) = reconcile_suspension(&state, now) {
                    let mut active = m.into_active_model();
                    active.is_active = Set(repaired.is_active);
                    active.suspension_end_at = Set(repaired.suspension_end_at);
                    Ok(PersonRecord::Moderator(
                        self.moderator_repo.update(active).await?,
                    ))
                } else {
                    Ok(PersonRecord::Moderator(m))
                }
            }
            PersonRecord::Administrator(m) => {
                let state = SuspensionState {
                    is_active: m.is_active,
                    suspension_end_at: m.suspension_end_at,
                };
                if let Some(repaired) = reconcile_suspension(&state, now) {
                    let mut active = m.into_active_model();
                    active.is_active = Set(repaired.is_active);
                    active.suspension_end_at = Set(repaired.suspension_end_at);
                    Ok(PersonRecord::Administrator(
                        self.admin_repo.update(active).await?,
                    ))
                } else {
                    Ok(PersonRecord::Administrator(m))
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("correct horse").unwrap();

        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(verify_password("anything", "not-a-hash").is_err());
    }

    #[test]
    fn test_login_input_validation() {
        let input = LoginInput {
            username: String::new(),
            password: "secret".to_string(),
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_update_password_requires_minimum_length() {
        let input = UpdatePasswordInput {
            current_password: "old-secret".to_string(),
            new_password: "short".to_string(),
        };
        assert!(input.validate().is_err());
    }
}
