//! Validation lifecycle service.
//!
//! Pending reports are either validated or rejected. A rejected report is
//! not gone: it sits in the snapshot table until someone recovers it back to
//! pending or deletes it for good, at which point an archive copy remains.
//! Validated reports can be pulled back to pending with unvalidate.

use chrono::Utc;
use safepoint_common::{AppError, AppResult};
use safepoint_db::entities::{incident, rejected_incident, validation};
use safepoint_db::repositories::{
    IncidentRepository, RejectedIncidentRepository, ValidationRepository,
};
use sea_orm::{IntoActiveModel, Set};

use super::achievement::AchievementService;
use super::authorization::{AuthorizationService, Permission, RequesterClaim};
use super::event_publisher::EventPublisherService;
use super::incident::{IncidentService, UpdateIncidentInput};
use crate::generate_id;

/// Display status of a live incident, derived from its validation row.
#[must_use]
pub fn display_status(validation: Option<&validation::Model>) -> &'static str {
    match validation {
        Some(v) if v.status => "Validated",
        Some(v) if v.decided_at.is_some() => "Invalid",
        _ => "Pending",
    }
}

/// Validation lifecycle service for business logic.
#[derive(Clone)]
pub struct ValidationService {
    incident_repo: IncidentRepository,
    validation_repo: ValidationRepository,
    rejected_repo: RejectedIncidentRepository,
    incident_service: IncidentService,
    achievement: AchievementService,
    authz: AuthorizationService,
    event_publisher: EventPublisherService,
}

impl ValidationService {
    /// Create a new validation service.
    #[must_use]
    pub fn new(
        incident_repo: IncidentRepository,
        validation_repo: ValidationRepository,
        rejected_repo: RejectedIncidentRepository,
        incident_service: IncidentService,
        achievement: AchievementService,
        authz: AuthorizationService,
        event_publisher: EventPublisherService,
    ) -> Self {
        Self {
            incident_repo,
            validation_repo,
            rejected_repo,
            incident_service,
            achievement,
            authz,
            event_publisher,
        }
    }

    /// List every live incident with its validation state. Administrators.
    pub async fn list_all(
        &self,
        claim: &RequesterClaim,
    ) -> AppResult<Vec<(incident::Model, Option<validation::Model>)>> {
        self.authz.require_admin(claim).await?;
        self.incident_repo.find_all_with_validation().await
    }

    /// List all rejected snapshots. Administrators.
    pub async fn list_rejected(
        &self,
        claim: &RequesterClaim,
    ) -> AppResult<Vec<rejected_incident::Model>> {
        self.authz.require_admin(claim).await?;
        self.rejected_repo.find_all().await
    }

    /// Decide a pending incident. Requires `ManageIncidents`.
    ///
    /// Accepting marks the validation row and re-runs the reporter's badge
    /// evaluation; rejecting moves the whole report into the snapshot table.
    /// Either way the outcome is broadcast after the write commits.
    pub async fn validate(
        &self,
        claim: &RequesterClaim,
        incident_id: i32,
        accept: bool,
    ) -> AppResult<()> {
        let actor = self
            .authz
            .require_admin_with(claim, Permission::ManageIncidents)
            .await?;

        if accept {
            self.accept(incident_id, &actor.id).await
        } else {
            self.reject(incident_id, &actor.id).await
        }
    }

    async fn accept(&self, incident_id: i32, validator_id: &str) -> AppResult<()> {
        let (incident, validation) = self
            .incident_repo
            .find_with_validation(incident_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("incident {incident_id}")))?;

        self.mark_validation(&incident, validation, true, Some(validator_id))
            .await?;

        // Badge evaluation rides along but never blocks the decision.
        if let Err(e) = self
            .achievement
            .evaluate_reporter_validations(&incident.reporter_id)
            .await
        {
            tracing::warn!(
                "Badge evaluation failed for reporter {}: {e}",
                incident.reporter_id
            );
        }

        self.broadcast_status(&incident, "Validated").await;
        Ok(())
    }

    async fn reject(&self, incident_id: i32, rejector_id: &str) -> AppResult<()> {
        let incident = self.incident_repo.get_by_id(incident_id).await?;

        let snapshot = rejection_snapshot(&incident, Some(rejector_id.to_string()));
        self.incident_repo.reject(incident.clone(), snapshot).await?;

        self.broadcast_status(&incident, "Rejected").await;
        Ok(())
    }

    /// Pull a validated incident back to pending. Administrators.
    ///
    /// The validation row is reset rather than deleted, so repeated
    /// validate/unvalidate cycles reuse one row per incident.
    pub async fn unvalidate(&self, claim: &RequesterClaim, incident_id: i32) -> AppResult<()> {
        self.authz.require_admin(claim).await?;

        let (incident, validation) = self
            .incident_repo
            .find_with_validation(incident_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("incident {incident_id}")))?;

        match validation {
            Some(row) => {
                let mut active = row.into_active_model();
                active.status = Set(false);
                active.decided_at = Set(None);
                active.validator_id = Set(None);
                self.validation_repo.update(active).await?;
            }
            None => {
                self.validation_repo
                    .create(validation::ActiveModel {
                        id: Set(generate_id()),
                        incident_id: Set(incident.id),
                        status: Set(false),
                        decided_at: Set(None),
                        validator_id: Set(None),
                    })
                    .await?;
            }
        }
        Ok(())
    }

    /// Recover a rejected snapshot into a fresh pending incident.
    ///
    /// The report gets a new id but keeps its original submission time.
    pub async fn recover(
        &self,
        claim: &RequesterClaim,
        rejected_id: i32,
    ) -> AppResult<incident::Model> {
        self.authz
            .require_admin_with(claim, Permission::ManageIncidents)
            .await?;

        let snapshot = self.rejected_repo.get_by_id(rejected_id).await?;
        let rebuilt = recovered_incident(&snapshot);

        self.rejected_repo
            .recover(rejected_id, rebuilt, generate_id())
            .await
    }

    /// Permanently delete a rejected snapshot, keeping an archive copy.
    /// Allowed for administrators with `ManageIncidents` and any moderator.
    pub async fn delete_permanently(
        &self,
        claim: &RequesterClaim,
        rejected_id: i32,
    ) -> AppResult<()> {
        use super::authorization::Principal;

        match self.authz.resolve(claim).await? {
            Principal::Moderator(_) => {}
            Principal::Admin(admin) => {
                if !super::authorization::has_permission(&admin, Permission::ManageIncidents) {
                    return Err(AppError::Forbidden(
                        "missing permission ManageIncidents".into(),
                    ));
                }
            }
            Principal::Reporter(_) => {
                return Err(AppError::Forbidden("staff access required".into()));
            }
        }

        let snapshot = self.rejected_repo.get_by_id(rejected_id).await?;
        let archive = archive_from_snapshot(&snapshot);
        self.rejected_repo.delete_permanently(snapshot, archive).await
    }

    /// List the incidents in the moderator's own area.
    pub async fn moderator_list(
        &self,
        claim: &RequesterClaim,
    ) -> AppResult<Vec<(incident::Model, Option<validation::Model>)>> {
        let moderator = self.authz.require_moderator(claim).await?;
        self.incident_repo.find_by_area(&moderator.area_code).await
    }

    /// Get one incident in the moderator's area.
    ///
    /// Existence is checked first: a report that exists outside the
    /// moderator's area is `Forbidden`, a missing one is `NotFound`.
    pub async fn moderator_get(
        &self,
        claim: &RequesterClaim,
        incident_id: i32,
    ) -> AppResult<(incident::Model, Option<validation::Model>)> {
        let moderator = self.authz.require_moderator(claim).await?;

        let (incident, validation) = self
            .incident_repo
            .find_with_validation(incident_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("incident {incident_id}")))?;

        if incident.area_code != moderator.area_code {
            return Err(AppError::Forbidden("incident outside your area".into()));
        }
        Ok((incident, validation))
    }

    /// Patch an incident in the moderator's area.
    pub async fn moderator_update(
        &self,
        claim: &RequesterClaim,
        incident_id: i32,
        input: UpdateIncidentInput,
    ) -> AppResult<incident::Model> {
        let (incident, _) = self.moderator_get(claim, incident_id).await?;
        self.incident_service.apply_update(incident, input).await
    }

    /// Mark an in-area incident invalid without removing it.
    ///
    /// Unlike an administrator rejection, the report stays live; the
    /// validation row records a negative decision.
    pub async fn moderator_reject(
        &self,
        claim: &RequesterClaim,
        incident_id: i32,
    ) -> AppResult<()> {
        let moderator = self.authz.require_moderator(claim).await?;

        let (incident, validation) = self
            .incident_repo
            .find_with_validation(incident_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("incident {incident_id}")))?;
        if incident.area_code != moderator.area_code {
            return Err(AppError::Forbidden("incident outside your area".into()));
        }

        self.mark_validation(&incident, validation, false, Some(&moderator.id))
            .await?;

        self.broadcast_status(&incident, "Rejected").await;
        Ok(())
    }

    async fn mark_validation(
        &self,
        incident: &incident::Model,
        validation: Option<validation::Model>,
        status: bool,
        validator_id: Option<&str>,
    ) -> AppResult<()> {
        match validation {
            Some(row) => {
                let mut active = row.into_active_model();
                active.status = Set(status);
                active.decided_at = Set(Some(Utc::now().into()));
                active.validator_id = Set(validator_id.map(str::to_string));
                self.validation_repo.update(active).await?;
            }
            None => {
                self.validation_repo
                    .create(validation::ActiveModel {
                        id: Set(generate_id()),
                        incident_id: Set(incident.id),
                        status: Set(status),
                        decided_at: Set(Some(Utc::now().into())),
                        validator_id: Set(validator_id.map(str::to_string)),
                    })
                    .await?;
            }
        }
        Ok(())
    }

    async fn broadcast_status(&self, incident: &incident::Model, status: &str) {
        if let Err(e) = self
            .event_publisher
            .publish_incident_status(
                &incident.title,
                incident.location_address.as_deref(),
                incident.latitude,
                incident.longitude,
                incident.id,
                status,
                &incident.reporter_id,
            )
            .await
        {
            tracing::warn!("Failed to publish {status} for incident {}: {e}", incident.id);
        }
    }
}

/// Build the rejection snapshot for a live incident.
#[must_use]
pub fn rejection_snapshot(
    incident: &incident::Model,
    rejector_id: Option<String>,
) -> rejected_incident::ActiveModel {
    rejected_incident::ActiveModel {
        original_incident_id: Set(incident.id),
        reporter_id: Set(incident.reporter_id.clone()),
        title: Set(incident.title.clone()),
        category_code: Set(incident.category_code.clone()),
        other_hazard: Set(incident.other_hazard.clone()),
        severity: Set(incident.severity.clone()),
        occurred_at: Set(incident.occurred_at),
        area_code: Set(incident.area_code.clone()),
        description: Set(incident.description.clone()),
        image: Set(incident.image.clone()),
        latitude: Set(incident.latitude),
        longitude: Set(incident.longitude),
        location_address: Set(incident.location_address.clone()),
        created_at: Set(incident.created_at),
        rejector_id: Set(rejector_id),
        rejected_at: Set(Utc::now().into()),
        ..Default::default()
    }
}

/// Rebuild a live incident from a rejected snapshot. New id, resolution
/// flag reset, original submission time kept.
#[must_use]
pub fn recovered_incident(snapshot: &rejected_incident::Model) -> incident::ActiveModel {
    incident::ActiveModel {
        reporter_id: Set(snapshot.reporter_id.clone()),
        title: Set(snapshot.title.clone()),
        category_code: Set(snapshot.category_code.clone()),
        other_hazard: Set(snapshot.other_hazard.clone()),
        severity: Set(snapshot.severity.clone()),
        occurred_at: Set(snapshot.occurred_at),
        area_code: Set(snapshot.area_code.clone()),
        description: Set(snapshot.description.clone()),
        image: Set(snapshot.image.clone()),
        latitude: Set(snapshot.latitude),
        longitude: Set(snapshot.longitude),
        location_address: Set(snapshot.location_address.clone()),
        is_resolved: Set(false),
        created_at: Set(snapshot.created_at),
        ..Default::default()
    }
}

/// Build the terminal archive copy of a rejected snapshot.
#[must_use]
pub fn archive_from_snapshot(
    snapshot: &rejected_incident::Model,
) -> safepoint_db::entities::incident_archive::ActiveModel {
    safepoint_db::entities::incident_archive::ActiveModel {
        original_incident_id: Set(snapshot.original_incident_id),
        reporter_id: Set(snapshot.reporter_id.clone()),
        title: Set(snapshot.title.clone()),
        category_code: Set(snapshot.category_code.clone()),
        other_hazard: Set(snapshot.other_hazard.clone()),
        severity: Set(snapshot.severity.clone()),
        occurred_at: Set(snapshot.occurred_at),
        area_code: Set(snapshot.area_code.clone()),
        description: Set(snapshot.description.clone()),
        image: Set(snapshot.image.clone()),
        latitude: Set(snapshot.latitude),
        longitude: Set(snapshot.longitude),
        location_address: Set(snapshot.location_address.clone()),
        created_at: Set(snapshot.created_at),
        deleted_at: Set(Utc::now().into()),
        ..Default::default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use safepoint_db::entities::incident::Severity;
    use sea_orm::ActiveValue;

    fn sample_incident() -> incident::Model {
        incident::Model {
            id: 12,
            reporter_id: "rep1".to_string(),
            title: "Landslide near bridge".to_string(),
            category_code: "landslide".to_string(),
            other_hazard: None,
            severity: Severity::High,
            occurred_at: Utc::now().into(),
            area_code: "NORTH".to_string(),
            description: "Road shoulder collapsed".to_string(),
            image: None,
            latitude: Some(16.41),
            longitude: Some(120.59),
            location_address: Some("Kennon Road km 21".to_string()),
            is_resolved: false,
            created_at: Utc::now().into(),
        }
    }

    fn sample_validation(status: bool, decided: bool) -> validation::Model {
        validation::Model {
            id: "v1".to_string(),
            incident_id: 12,
            status,
            decided_at: decided.then(|| Utc::now().into()),
            validator_id: decided.then(|| "adm1".to_string()),
        }
    }

    #[test]
    fn test_display_status_covers_all_states() {
        assert_eq!(display_status(None), "Pending");
        assert_eq!(display_status(Some(&sample_validation(false, false))), "Pending");
        assert_eq!(display_status(Some(&sample_validation(true, true))), "Validated");
        assert_eq!(display_status(Some(&sample_validation(false, true))), "Invalid");
    }

    #[test]
    fn test_rejection_snapshot_keeps_original_id_and_times() {
        let incident = sample_incident();
        let snapshot = rejection_snapshot(&incident, Some("adm1".to_string()));

        assert_eq!(
            snapshot.original_incident_id,
            ActiveValue::Set(incident.id)
        );
        assert_eq!(snapshot.created_at, ActiveValue::Set(incident.created_at));
        assert_eq!(
            snapshot.rejector_id,
            ActiveValue::Set(Some("adm1".to_string()))
        );
        // New row, fresh pk.
        assert_eq!(snapshot.id, ActiveValue::NotSet);
    }

    #[test]
    fn test_recovered_incident_resets_resolution_and_id() {
        let incident = sample_incident();
        let snapshot_model = rejected_incident::Model {
            id: 4,
            original_incident_id: incident.id,
            reporter_id: incident.reporter_id.clone(),
            title: incident.title.clone(),
            category_code: incident.category_code.clone(),
            other_hazard: None,
            severity: Severity::High,
            occurred_at: incident.occurred_at,
            area_code: incident.area_code.clone(),
            description: incident.description.clone(),
            image: None,
            latitude: incident.latitude,
            longitude: incident.longitude,
            location_address: incident.location_address.clone(),
            created_at: incident.created_at,
            rejector_id: Some("adm1".to_string()),
            rejected_at: Utc::now().into(),
        };

        let rebuilt = recovered_incident(&snapshot_model);

        assert_eq!(rebuilt.id, ActiveValue::NotSet);
        assert_eq!(rebuilt.is_resolved, ActiveValue::Set(false));
        assert_eq!(rebuilt.created_at, ActiveValue::Set(incident.created_at));
    }
}
