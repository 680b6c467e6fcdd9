//! Authorization service.
//!
//! Requests assert an identity (`{id, role}`); nothing is trusted until the
//! claim is exchanged for a live row of the claimed class. Capability checks
//! for administrators run against a comma-delimited permission list, with
//! superusers bypassing the list entirely.

use chrono::{DateTime, FixedOffset, Utc};
use safepoint_common::{AppError, AppResult};
use safepoint_db::entities::{administrator, moderator, reporter};
use safepoint_db::repositories::{
    AdministratorRepository, ModeratorRepository, ReporterRepository,
};
use sea_orm::{IntoActiveModel, Set};
use std::fmt;
use std::str::FromStr;

/// The three identity classes a request can claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Reporter,
    Moderator,
    Admin,
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reporter" | "user" => Ok(Self::Reporter),
            "moderator" => Ok(Self::Moderator),
            "admin" | "administrator" => Ok(Self::Admin),
            other => Err(AppError::BadRequest(format!("unknown role: {other}"))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reporter => write!(f, "Reporter"),
            Self::Moderator => write!(f, "Moderator"),
            Self::Admin => write!(f, "Admin"),
        }
    }
}

/// Administrator capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ManageUsers,
    ManageModerators,
    ManageAdmins,
    ManageIncidents,
}

impl Permission {
    /// Wire name, as stored in the permission list column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ManageUsers => "ManageUsers",
            Self::ManageModerators => "ManageModerators",
            Self::ManageAdmins => "ManageAdmins",
            Self::ManageIncidents => "ManageIncidents",
        }
    }
}

/// Parse a comma-delimited permission list.
///
/// Entries are trimmed and matched case-sensitively; unknown names are
/// dropped, and duplicates collapse to one.
#[must_use]
pub fn parse_permissions(raw: &str) -> Vec<Permission> {
    let mut parsed = Vec::new();
    for entry in raw.split(',') {
        let perm = match entry.trim() {
            "ManageUsers" => Permission::ManageUsers,
            "ManageModerators" => Permission::ManageModerators,
            "ManageAdmins" => Permission::ManageAdmins,
            "ManageIncidents" => Permission::ManageIncidents,
            _ => continue,
        };
        if !parsed.contains(&perm) {
            parsed.push(perm);
        }
    }
    parsed
}

/// True iff the administrator is a superuser or carries the permission.
#[must_use]
pub fn has_permission(admin: &administrator::Model, perm: Permission) -> bool {
    if admin.is_superuser {
        return true;
    }
    admin
        .permissions
        .as_deref()
        .is_some_and(|raw| parse_permissions(raw).contains(&perm))
}

/// An unverified identity assertion taken from request headers.
#[derive(Debug, Clone)]
pub struct RequesterClaim {
    /// Asserted account id.
    pub id: String,
    /// Asserted identity class.
    pub role: Role,
}

/// A claim successfully exchanged for a live record.
#[derive(Debug, Clone)]
pub enum Principal {
    Reporter(reporter::Model),
    Moderator(moderator::Model),
    Admin(administrator::Model),
}

impl Principal {
    /// Account id of the resolved record.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Reporter(m) => &m.id,
            Self::Moderator(m) => &m.id,
            Self::Admin(m) => &m.id,
        }
    }

    /// Username of the resolved record.
    #[must_use]
    pub fn username(&self) -> &str {
        match self {
            Self::Reporter(m) => &m.username,
            Self::Moderator(m) => &m.username,
            Self::Admin(m) => &m.username,
        }
    }
}

/// Activation state shared by all three identity classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuspensionState {
    pub is_active: bool,
    pub suspension_end_at: Option<DateTime<FixedOffset>>,
}

/// Reactivate an account whose suspension window has lapsed.
///
/// Returns the corrected state when a change is needed, `None` when the
/// stored state is already right. Suspensions without an end time are
/// indefinite.
#[must_use]
pub fn reconcile_suspension(
    state: &SuspensionState,
    now: DateTime<Utc>,
) -> Option<SuspensionState> {
    if state.is_active {
        return None;
    }
    let end = state.suspension_end_at?;
    if end <= now {
        Some(SuspensionState {
            is_active: true,
            suspension_end_at: None,
        })
    } else {
        None
    }
}

/// Resolves identity claims and enforces capability checks.
#[derive(Clone)]
pub struct AuthorizationService {
    reporter_repo: ReporterRepository,
    moderator_repo: ModeratorRepository,
    admin_repo: AdministratorRepository,
}

impl AuthorizationService {
    /// Create a new authorization service.
    #[must_use]
    pub const fn new(
        reporter_repo: ReporterRepository,
        moderator_repo: ModeratorRepository,
        admin_repo: AdministratorRepository,
    ) -> Self {
        Self {
            reporter_repo,
            moderator_repo,
            admin_repo,
        }
    }

    /// Exchange a claim for a live, active record of the claimed class.
    ///
    /// A lapsed suspension is repaired and persisted on the way through. A
    /// claim that does not resolve, or resolves to a still-suspended
    /// account, is `Unauthorized`; there is no silent downgrade to a lesser
    /// role.
    pub async fn resolve(&self, claim: &RequesterClaim) -> AppResult<Principal> {
        let now = Utc::now();

        match claim.role {
            Role::Reporter => {
                let mut record = self
                    .reporter_repo
                    .find_by_id(&claim.id)
                    .await?
                    .ok_or(AppError::Unauthorized)?;

                let state = SuspensionState {
                    is_active: record.is_active,
                    suspension_end_at: record.suspension_end_at,
                };
                if let Some(repaired) = reconcile_suspension(&state, now) {
                    let mut active = record.clone().into_active_model();
                    active.is_active = Set(repaired.is_active);
                    active.suspension_end_at = Set(repaired.suspension_end_at);
                    record = self.reporter_repo.update(active).await?;
                }

                if !record.is_active {
                    return Err(AppError::Unauthorized);
                }
                Ok(Principal::Reporter(record))
            }
            Role::Moderator => {
                let mut record = self
                    .moderator_repo
                    .find_by_id(&claim.id)
                    .await?
                    .ok_or(AppError::Unauthorized)?;

                let state = SuspensionState {
                    is_active: record.is_active,
                    suspension_end_at: record.suspension_end_at,
                };
                if let Some(repaired) = reconcile_suspension(&state, now) {
                    let mut active = record.clone().into_active_model();
                    active.is_active = Set(repaired.is_active);
                    active.suspension_end_at = Set(repaired.suspension_end_at);
                    record = self.moderator_repo.update(active).await?;
                }

                if !record.is_active {
                    return Err(AppError::Unauthorized);
                }
                Ok(Principal::Moderator(record))
            }
            Role::Admin => {
                let mut record = self
                    .admin_repo
                    .find_by_id(&claim.id)
                    .await?
                    .ok_or(AppError::Unauthorized)?;

                let state = SuspensionState {
                    is_active: record.is_active,
                    suspension_end_at: record.suspension_end_at,
                };
                if let Some(repaired) = reconcile_suspension(&state, now) {
                    let mut active = record.clone().into_active_model();
                    active.is_active = Set(repaired.is_active);
                    active.suspension_end_at = Set(repaired.suspension_end_at);
                    record = self.admin_repo.update(active).await?;
                }

                if !record.is_active {
                    return Err(AppError::Unauthorized);
                }
                Ok(Principal::Admin(record))
            }
        }
    }

    /// Resolve a claim that must be an administrator.
    pub async fn require_admin(&self, claim: &RequesterClaim) -> AppResult<administrator::Model> {
        match self.resolve(claim).await? {
            Principal::Admin(admin) => Ok(admin),
            _ => Err(AppError::Forbidden("administrator access required".into())),
        }
    }

    /// Resolve a claim that must be an administrator with a capability.
    pub async fn require_admin_with(
        &self,
        claim: &RequesterClaim,
        perm: Permission,
    ) -> AppResult<administrator::Model> {
        let admin = self.require_admin(claim).await?;
        if has_permission(&admin, perm) {
            Ok(admin)
        } else {
            Err(AppError::Forbidden(format!(
                "missing permission {}",
                perm.as_str()
            )))
        }
    }

    /// Resolve a claim that must be a moderator.
    pub async fn require_moderator(&self, claim: &RequesterClaim) -> AppResult<moderator::Model> {
        match self.resolve(claim).await? {
            Principal::Moderator(moderator) => Ok(moderator),
            _ => Err(AppError::Forbidden("moderator access required".into())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn admin_with(permissions: Option<&str>, superuser: bool) -> administrator::Model {
        administrator::Model {
            id: "adm1".to_string(),
            username: "root".to_string(),
            email: "root@example.com".to_string(),
            contact: "09171234567".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            first_name: "Root".to_string(),
            middle_name: None,
            last_name: "Admin".to_string(),
            is_superuser: superuser,
            permissions: permissions.map(ToString::to_string),
            is_active: true,
            suspension_end_at: None,
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_parse_permissions_trims_and_dedups() {
        let parsed = parse_permissions(" ManageUsers , ManageIncidents,ManageUsers");
        assert_eq!(
            parsed,
            vec![Permission::ManageUsers, Permission::ManageIncidents]
        );
    }

    #[test]
    fn test_parse_permissions_is_case_sensitive() {
        assert!(parse_permissions("manageusers,MANAGEADMINS").is_empty());
    }

    #[test]
    fn test_parse_permissions_ignores_unknown_names() {
        let parsed = parse_permissions("ManageEverything,ManageModerators");
        assert_eq!(parsed, vec![Permission::ManageModerators]);
    }

    #[test]
    fn test_superuser_bypasses_permission_list() {
        let admin = admin_with(None, true);
        assert!(has_permission(&admin, Permission::ManageAdmins));
    }

    #[test]
    fn test_named_permission_grants() {
        let admin = admin_with(Some("ManageIncidents"), false);
        assert!(has_permission(&admin, Permission::ManageIncidents));
        assert!(!has_permission(&admin, Permission::ManageUsers));
    }

    #[test]
    fn test_role_from_str_accepts_legacy_user_alias() {
        assert_eq!(Role::from_str("User").unwrap(), Role::Reporter);
        assert_eq!(Role::from_str("moderator").unwrap(), Role::Moderator);
        assert!(Role::from_str("overlord").is_err());
    }

    #[test]
    fn test_reconcile_lapsed_suspension_reactivates() {
        let state = SuspensionState {
            is_active: false,
            suspension_end_at: Some((Utc::now() - Duration::hours(1)).into()),
        };

        let repaired = reconcile_suspension(&state, Utc::now()).unwrap();
        assert!(repaired.is_active);
        assert!(repaired.suspension_end_at.is_none());
    }

    #[test]
    fn test_reconcile_ongoing_suspension_is_untouched() {
        let state = SuspensionState {
            is_active: false,
            suspension_end_at: Some((Utc::now() + Duration::hours(1)).into()),
        };

        assert!(reconcile_suspension(&state, Utc::now()).is_none());
    }

    #[test]
    fn test_reconcile_indefinite_suspension_is_untouched() {
        let state = SuspensionState {
            is_active: false,
            suspension_end_at: None,
        };

        assert!(reconcile_suspension(&state, Utc::now()).is_none());
    }

    #[test]
    fn test_reconcile_active_account_is_untouched() {
        let state = SuspensionState {
            is_active: true,
            suspension_end_at: None,
        };

        assert!(reconcile_suspension(&state, Utc::now()).is_none());
    }
}
