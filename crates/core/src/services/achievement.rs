//! Achievement engine.
//!
//! Counts cross badge thresholds; crossing one awards the badge exactly
//! once. The engine only ever adds badges. Removal is a manual staff action.

use chrono::Utc;
use safepoint_common::{AppError, AppResult};
use safepoint_db::entities::badge;
use safepoint_db::repositories::{BadgeRepository, CommentRepository, IncidentRepository};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use super::authorization::{AuthorizationService, Principal, RequesterClaim};
use super::event_publisher::EventPublisherService;

/// Awarded-by marker for automatic awards.
pub const SYSTEM_AWARDER: &str = "System";

/// Which running count a threshold applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AchievementKind {
    ValidatedIncidents,
    Comments,
}

const VALIDATED_THRESHOLDS: [(u64, &str); 3] = [
    (10, "Certified Reporter"),
    (25, "Reliable Source"),
    (50, "Top Contributor"),
];

const COMMENT_THRESHOLDS: [(u64, &str); 1] = [(20, "Sociable")];

/// Badge names a count has earned, lowest threshold first.
#[must_use]
pub fn earned_badges(kind: AchievementKind, count: u64) -> Vec<&'static str> {
    let table: &[(u64, &str)] = match kind {
        AchievementKind::ValidatedIncidents => &VALIDATED_THRESHOLDS,
        AchievementKind::Comments => &COMMENT_THRESHOLDS,
    };
    table
        .iter()
        .filter(|(threshold, _)| count >= *threshold)
        .map(|(_, name)| *name)
        .collect()
}

/// Input for a manual badge grant or removal.
#[derive(Debug, Deserialize, Validate)]
pub struct ManualBadgeInput {
    #[validate(length(min = 1, max = 50))]
    pub person_id: String,

    #[validate(length(min = 1, max = 100))]
    pub badge_name: String,
}

/// Achievement service for business logic.
#[derive(Clone)]
pub struct AchievementService {
    badge_repo: BadgeRepository,
    incident_repo: IncidentRepository,
    comment_repo: CommentRepository,
    authz: AuthorizationService,
    event_publisher: EventPublisherService,
}

impl AchievementService {
    /// Create a new achievement service.
    #[must_use]
    pub fn new(
        badge_repo: BadgeRepository,
        incident_repo: IncidentRepository,
        comment_repo: CommentRepository,
        authz: AuthorizationService,
        event_publisher: EventPublisherService,
    ) -> Self {
        Self {
            badge_repo,
            incident_repo,
            comment_repo,
            authz,
            event_publisher,
        }
    }

    /// Award every badge the count has earned that the person lacks.
    ///
    /// Idempotent per (person, badge name); re-running with the same count
    /// changes nothing. Each fresh award is broadcast after the insert.
    pub async fn evaluate_and_award(
        &self,
        person_id: &str,
        kind: AchievementKind,
        count: u64,
    ) -> AppResult<()> {
        for name in earned_badges(kind, count) {
            if self.badge_repo.exists(person_id, name).await? {
                continue;
            }
            let created = self
                .badge_repo
                .create(badge::ActiveModel {
                    person_id: Set(person_id.to_string()),
                    badge_name: Set(name.to_string()),
                    awarded_at: Set(Utc::now().into()),
                    awarded_by: Set(Some(SYSTEM_AWARDER.to_string())),
                    ..Default::default()
                })
                .await?;
            tracing::info!("Awarded badge {name:?} to {person_id}");

            if let Err(e) = self
                .event_publisher
                .publish_badge_awarded(&created.person_id, &created.badge_name)
                .await
            {
                tracing::warn!(
                    "Failed to publish badge event for {}: {e}",
                    created.person_id
                );
            }
        }
        Ok(())
    }

    /// Recount a reporter's validated incidents and award accordingly.
    pub async fn evaluate_reporter_validations(&self, reporter_id: &str) -> AppResult<()> {
        let count = self
            .incident_repo
            .count_validated_by_reporter(reporter_id)
            .await?;
        self.evaluate_and_award(reporter_id, AchievementKind::ValidatedIncidents, count)
            .await
    }

    /// Recount a reporter's comments and award accordingly.
    pub async fn evaluate_reporter_comments(&self, reporter_id: &str) -> AppResult<()> {
        let count = self.comment_repo.count_by_reporter(reporter_id).await?;
        self.evaluate_and_award(reporter_id, AchievementKind::Comments, count)
            .await
    }

    /// List a person's badges.
    pub async fn list_badges(&self, person_id: &str) -> AppResult<Vec<badge::Model>> {
        self.badge_repo.find_by_person(person_id).await
    }

    /// Manually grant a badge. Staff only; the grant is broadcast.
    pub async fn grant_badge(
        &self,
        claim: &RequesterClaim,
        input: ManualBadgeInput,
    ) -> AppResult<badge::Model> {
        let actor = self.require_staff(claim).await?;
        input.validate()?;

        if self
            .badge_repo
            .exists(&input.person_id, &input.badge_name)
            .await?
        {
            return Err(AppError::Conflict(format!(
                "{} already holds {}",
                input.person_id, input.badge_name
            )));
        }

        let created = self
            .badge_repo
            .create(badge::ActiveModel {
                person_id: Set(input.person_id.clone()),
                badge_name: Set(input.badge_name.clone()),
                awarded_at: Set(Utc::now().into()),
                awarded_by: Set(Some(actor)),
                ..Default::default()
            })
            .await?;

        if let Err(e) = self
            .event_publisher
            .publish_badge_awarded(&created.person_id, &created.badge_name)
            .await
        {
            tracing::warn!("Failed to publish badge event for {}: {e}", created.person_id);
        }

        Ok(created)
    }

    /// Manually remove a badge. Staff only.
    pub async fn revoke_badge(
        &self,
        claim: &RequesterClaim,
        input: ManualBadgeInput,
    ) -> AppResult<()> {
        self.require_staff(claim).await?;
        input.validate()?;

        if !self
            .badge_repo
            .remove(&input.person_id, &input.badge_name)
            .await?
        {
            return Err(AppError::NotFound(format!(
                "badge {} on {}",
                input.badge_name, input.person_id
            )));
        }
        Ok(())
    }

    async fn require_staff(&self, claim: &RequesterClaim) -> AppResult<String> {
        match self.authz.resolve(claim).await? {
            Principal::Admin(m) => Ok(m.username),
            Principal::Moderator(m) => Ok(m.username),
            Principal::Reporter(_) => Err(AppError::Forbidden("staff access required".into())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::event_publisher::EventPublisher;
    use async_trait::async_trait;
    use safepoint_db::repositories::{
        AdministratorRepository, ModeratorRepository, ReporterRepository,
    };
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::{Arc, Mutex};

    /// Records badge broadcasts for assertions.
    #[derive(Default)]
    struct RecordingPublisher {
        badges: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl EventPublisher for RecordingPublisher {
        async fn publish_incident_status(
            &self,
            _title: &str,
            _location_address: Option<&str>,
            _latitude: Option<f64>,
            _longitude: Option<f64>,
            _incident_id: i32,
            _status: &str,
            _reporter_id: &str,
        ) -> AppResult<()> {
            Ok(())
        }

        async fn publish_badge_awarded(&self, person_id: &str, badge_name: &str) -> AppResult<()> {
            self.badges
                .lock()
                .unwrap()
                .push((person_id.to_string(), badge_name.to_string()));
            Ok(())
        }

        async fn publish_incident_resolved(
            &self,
            _title: &str,
            _incident_id: i32,
            _reporter_id: &str,
        ) -> AppResult<()> {
            Ok(())
        }
    }

    fn test_badge(person: &str, name: &str) -> badge::Model {
        badge::Model {
            id: 1,
            person_id: person.to_string(),
            badge_name: name.to_string(),
            awarded_at: Utc::now().into(),
            awarded_by: Some(SYSTEM_AWARDER.to_string()),
        }
    }

    #[test]
    fn test_earned_badges_below_first_threshold() {
        assert!(earned_badges(AchievementKind::ValidatedIncidents, 9).is_empty());
        assert!(earned_badges(AchievementKind::Comments, 19).is_empty());
    }

    #[test]
    fn test_earned_badges_at_exact_thresholds() {
        assert_eq!(
            earned_badges(AchievementKind::ValidatedIncidents, 10),
            vec!["Certified Reporter"]
        );
        assert_eq!(
            earned_badges(AchievementKind::ValidatedIncidents, 25),
            vec!["Certified Reporter", "Reliable Source"]
        );
        assert_eq!(
            earned_badges(AchievementKind::ValidatedIncidents, 50),
            vec!["Certified Reporter", "Reliable Source", "Top Contributor"]
        );
    }

    #[test]
    fn test_earned_badges_for_comments() {
        assert_eq!(
            earned_badges(AchievementKind::Comments, 20),
            vec!["Sociable"]
        );
        assert_eq!(
            earned_badges(AchievementKind::Comments, 500),
            vec!["Sociable"]
        );
    }

    #[tokio::test]
    async fn test_automatic_award_is_broadcast() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // No existing badge row, then the insert returns the new one.
                .append_query_results([Vec::<badge::Model>::new()])
                .append_query_results([[test_badge("rep1", "Certified Reporter")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 1,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let publisher = Arc::new(RecordingPublisher::default());
        let authz = AuthorizationService::new(
            ReporterRepository::new(Arc::clone(&db)),
            ModeratorRepository::new(Arc::clone(&db)),
            AdministratorRepository::new(Arc::clone(&db)),
        );
        let service = AchievementService::new(
            BadgeRepository::new(Arc::clone(&db)),
            IncidentRepository::new(Arc::clone(&db)),
            CommentRepository::new(Arc::clone(&db)),
            authz,
            Arc::clone(&publisher) as Arc<dyn EventPublisher>,
        );

        service
            .evaluate_and_award("rep1", AchievementKind::ValidatedIncidents, 10)
            .await
            .unwrap();

        assert_eq!(
            publisher.badges.lock().unwrap().as_slice(),
            &[("rep1".to_string(), "Certified Reporter".to_string())]
        );
    }
}
