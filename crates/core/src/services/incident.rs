//! Incident service.
//!
//! Reporter-facing submission and maintenance of incidents. Every new
//! incident starts with an implicit pending validation row; the lifecycle
//! beyond that lives in the validation service.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, NaiveDateTime, Utc};
use safepoint_common::{AppError, AppResult};
use safepoint_db::entities::area::DEFAULT_AREA_CODE;
use safepoint_db::entities::hazard_category::OTHER_CATEGORY_CODE;
use safepoint_db::entities::incident::Severity;
use safepoint_db::entities::{incident, incident_archive, validation};
use safepoint_db::repositories::{
    AreaRepository, HazardCategoryRepository, IncidentRepository, ReporterRepository,
};
use sea_orm::{IntoActiveModel, Set};
use serde::Deserialize;
use validator::Validate;

use super::authorization::RequesterClaim;
use super::event_publisher::EventPublisherService;
use crate::generate_id;

/// Accepted timestamp layouts for `occurred_at`, tried in order.
const OCCURRED_AT_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a submitted occurrence timestamp. Naive local time, no zone.
pub fn parse_occurred_at(raw: &str) -> AppResult<NaiveDateTime> {
    let trimmed = raw.trim();
    for format in OCCURRED_AT_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(parsed);
        }
    }
    Err(AppError::Validation(format!(
        "occurred_at {trimmed:?} does not match any accepted format"
    )))
}

fn parse_severity(raw: &str) -> AppResult<Severity> {
    match raw.trim().to_lowercase().as_str() {
        "low" => Ok(Severity::Low),
        "moderate" => Ok(Severity::Moderate),
        "high" => Ok(Severity::High),
        other => Err(AppError::Validation(format!("unknown severity {other:?}"))),
    }
}

/// Expand a category filter: "accident" and "road" are one group.
#[must_use]
pub fn expand_category_filter(code: &str) -> Vec<String> {
    match code {
        "accident" | "road" => vec!["accident".to_string(), "road".to_string()],
        other => vec![other.to_string()],
    }
}

/// The free-text label rides only with the "other" category. For "other"
/// a missing label is stored as an empty string, never as null.
fn other_hazard_for(category_code: &str, provided: Option<String>) -> Option<String> {
    (category_code == OTHER_CATEGORY_CODE).then(|| provided.unwrap_or_default())
}

/// Input for submitting an incident.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitIncidentInput {
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    #[validate(length(min = 1, max = 50))]
    pub category_code: String,

    /// Only meaningful when the category is "other".
    #[validate(length(max = 100))]
    pub other_hazard: Option<String>,

    pub severity: String,

    /// Local timestamp string, parsed against the accepted layouts.
    pub occurred_at: String,

    /// Blank or missing falls back to the default area.
    pub area_code: Option<String>,

    #[validate(length(min = 1))]
    pub description: String,

    /// Base64-encoded image bytes.
    pub image: Option<String>,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    #[validate(length(max = 500))]
    pub location_address: Option<String>,
}

/// Input for updating an incident.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateIncidentInput {
    #[validate(length(max = 255))]
    pub title: Option<String>,

    #[validate(length(max = 50))]
    pub category_code: Option<String>,

    #[validate(length(max = 100))]
    pub other_hazard: Option<String>,

    pub severity: Option<String>,

    pub occurred_at: Option<String>,

    #[validate(length(max = 255))]
    pub area_code: Option<String>,

    pub description: Option<String>,

    pub image: Option<String>,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    #[validate(length(max = 500))]
    pub location_address: Option<String>,
}

/// Filters for the public validated feed.
#[derive(Debug, Default, Deserialize)]
pub struct IncidentFeedFilter {
    pub category: Option<String>,
    pub severity: Option<String>,
}

/// Incident service for business logic.
#[derive(Clone)]
pub struct IncidentService {
    incident_repo: IncidentRepository,
    reporter_repo: ReporterRepository,
    area_repo: AreaRepository,
    category_repo: HazardCategoryRepository,
    event_publisher: EventPublisherService,
}

impl IncidentService {
    /// Create a new incident service.
    #[must_use]
    pub fn new(
        incident_repo: IncidentRepository,
        reporter_repo: ReporterRepository,
        area_repo: AreaRepository,
        category_repo: HazardCategoryRepository,
        event_publisher: EventPublisherService,
    ) -> Self {
        Self {
            incident_repo,
            reporter_repo,
            area_repo,
            category_repo,
            event_publisher,
        }
    }

    /// Submit a new incident as the requesting reporter.
    ///
    /// Novel hazard categories are provisioned on the fly; unknown area
    /// codes fall back to the default area. The incident is created
    /// together with its pending validation row.
    pub async fn submit(
        &self,
        claim: &RequesterClaim,
        input: SubmitIncidentInput,
    ) -> AppResult<incident::Model> {
        input.validate()?;

        let reporter = self.reporter_repo.get_by_id(&claim.id).await?;

        let occurred_at = parse_occurred_at(&input.occurred_at)?;
        let severity = parse_severity(&input.severity)?;

        let area_code = self.resolve_area_code(input.area_code.as_deref()).await?;

        let category_code = input.category_code.trim().to_lowercase();
        self.category_repo.ensure(&category_code, None).await?;

        let other_hazard = other_hazard_for(&category_code, input.other_hazard);

        let image = match input.image.as_deref() {
            Some(encoded) => Some(
                BASE64
                    .decode(encoded)
                    .map_err(|e| AppError::Validation(format!("image is not valid base64: {e}")))?,
            ),
            None => None,
        };

        let model = incident::ActiveModel {
            reporter_id: Set(reporter.id),
            title: Set(input.title),
            category_code: Set(category_code),
            other_hazard: Set(other_hazard),
            severity: Set(severity),
            occurred_at: Set(DateTime::<Utc>::from_naive_utc_and_offset(occurred_at, Utc).into()),
            area_code: Set(area_code),
            description: Set(input.description),
            image: Set(image),
            latitude: Set(input.latitude),
            longitude: Set(input.longitude),
            location_address: Set(input.location_address),
            is_resolved: Set(false),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        self.incident_repo
            .create_with_validation(model, generate_id())
            .await
    }

    /// Get one incident with its validation state.
    pub async fn get(
        &self,
        id: i32,
    ) -> AppResult<(incident::Model, Option<validation::Model>)> {
        self.incident_repo
            .find_with_validation(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("incident {id}")))
    }

    /// The public feed: validated incidents only, optionally filtered.
    pub async fn list_validated(
        &self,
        filter: IncidentFeedFilter,
    ) -> AppResult<Vec<incident::Model>> {
        let categories = filter
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(expand_category_filter);
        let severity = match filter.severity.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(parse_severity(raw)?),
            _ => None,
        };

        self.incident_repo
            .find_validated(categories.as_deref(), severity)
            .await
    }

    /// List the requesting reporter's own incidents with validation state.
    pub async fn list_own(
        &self,
        claim: &RequesterClaim,
    ) -> AppResult<Vec<(incident::Model, Option<validation::Model>)>> {
        self.incident_repo.find_by_reporter(&claim.id).await
    }

    /// Update an incident owned by the requester.
    ///
    /// Category moves carry the other-hazard rule with them: anything but
    /// "other" clears the label, "other" takes whatever was supplied, empty
    /// included. Coordinates arriving as exactly (0, 0) leave the stored
    /// position untouched; submitting clients send that pair when the map
    /// widget was never touched.
    pub async fn update(
        &self,
        claim: &RequesterClaim,
        id: i32,
        input: UpdateIncidentInput,
    ) -> AppResult<incident::Model> {
        let current = self.own_incident(claim, id).await?;
        self.apply_update(current, input).await
    }

    /// Patch an already-authorized incident. Shared by the owner flow and
    /// the moderator area flow.
    pub(crate) async fn apply_update(
        &self,
        current: incident::Model,
        input: UpdateIncidentInput,
    ) -> AppResult<incident::Model> {
        input.validate()?;

        let mut active = current.into_active_model();

        if let Some(title) = non_blank(input.title) {
            active.title = Set(title);
        }
        if let Some(raw) = non_blank(input.category_code) {
            let category_code = raw.to_lowercase();
            self.category_repo.ensure(&category_code, None).await?;
            active.other_hazard = Set(other_hazard_for(&category_code, input.other_hazard.clone()));
            active.category_code = Set(category_code);
        }
        if let Some(raw) = non_blank(input.severity) {
            active.severity = Set(parse_severity(&raw)?);
        }
        if let Some(raw) = non_blank(input.occurred_at) {
            let parsed = parse_occurred_at(&raw)?;
            active.occurred_at = Set(DateTime::<Utc>::from_naive_utc_and_offset(parsed, Utc).into());
        }
        if input.area_code.as_deref().is_some_and(|c| !c.trim().is_empty()) {
            let area_code = self.resolve_area_code(input.area_code.as_deref()).await?;
            active.area_code = Set(area_code);
        }
        if let Some(description) = non_blank(input.description) {
            active.description = Set(description);
        }
        if let Some(encoded) = input.image.as_deref() {
            let decoded = BASE64
                .decode(encoded)
                .map_err(|e| AppError::Validation(format!("image is not valid base64: {e}")))?;
            active.image = Set(Some(decoded));
        }
        match (input.latitude, input.longitude) {
            (Some(lat), Some(lon)) if lat == 0.0 && lon == 0.0 => {}
            (Some(lat), Some(lon)) => {
                active.latitude = Set(Some(lat));
                active.longitude = Set(Some(lon));
            }
            _ => {}
        }
        if let Some(address) = non_blank(input.location_address) {
            active.location_address = Set(Some(address));
        }

        self.incident_repo.update(active).await
    }

    /// Delete an incident owned by the requester, keeping an archive copy.
    pub async fn delete_own(&self, claim: &RequesterClaim, id: i32) -> AppResult<()> {
        let incident = self.own_incident(claim, id).await?;
        let archive = archive_snapshot(&incident);
        self.incident_repo
            .delete_with_archive(incident, archive)
            .await
    }

    /// Mark an incident resolved and broadcast the resolution.
    pub async fn mark_resolved(
        &self,
        claim: &RequesterClaim,
        id: i32,
    ) -> AppResult<incident::Model> {
        let incident = self.own_incident(claim, id).await?;
        let mut active = incident.into_active_model();
        active.is_resolved = Set(true);
        let updated = self.incident_repo.update(active).await?;

        if let Err(e) = self
            .event_publisher
            .publish_incident_resolved(&updated.title, updated.id, &updated.reporter_id)
            .await
        {
            tracing::warn!("Failed to publish resolution for incident {}: {e}", updated.id);
        }

        Ok(updated)
    }

    /// Resolve the area a report lands in. A registered code is used as-is;
    /// a blank or unregistered one falls back to the sentinel default area,
    /// provisioned on demand. Reporters cannot mint new areas.
    async fn resolve_area_code(&self, requested: Option<&str>) -> AppResult<String> {
        if let Some(code) = requested.map(str::trim).filter(|c| !c.is_empty()) {
            if let Some(area) = self.area_repo.find_by_code(code).await? {
                return Ok(area.code);
            }
        }
        Ok(self
            .area_repo
            .ensure(DEFAULT_AREA_CODE, DEFAULT_AREA_CODE)
            .await?
            .code)
    }

    async fn own_incident(
        &self,
        claim: &RequesterClaim,
        id: i32,
    ) -> AppResult<incident::Model> {
        let incident = self.incident_repo.get_by_id(id).await?;
        if incident.reporter_id != claim.id {
            return Err(AppError::Forbidden("not your incident".into()));
        }
        Ok(incident)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Build an archive copy of a live incident.
#[must_use]
pub fn archive_snapshot(incident: &incident::Model) -> incident_archive::ActiveModel {
    incident_archive::ActiveModel {
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
        deleted_at: Set(Utc::now().into()),
        ..Default::default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::event_publisher::NoOpEventPublisher;
    use safepoint_db::entities::area;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::Arc;

    fn service_over(db: DatabaseConnection) -> IncidentService {
        let db = Arc::new(db);
        IncidentService::new(
            IncidentRepository::new(Arc::clone(&db)),
            ReporterRepository::new(Arc::clone(&db)),
            AreaRepository::new(Arc::clone(&db)),
            HazardCategoryRepository::new(Arc::clone(&db)),
            Arc::new(NoOpEventPublisher),
        )
    }

    fn test_area(code: &str) -> area::Model {
        area::Model {
            code: code.to_string(),
            name: code.to_string(),
        }
    }

    #[test]
    fn test_parse_occurred_at_accepts_all_layouts() {
        for raw in [
            "2026-03-14 09:26:53",
            "2026-03-14T09:26:53",
            "2026-03-14 09:26",
            "2026-03-14T09:26",
        ] {
            assert!(parse_occurred_at(raw).is_ok(), "rejected {raw}");
        }
    }

    #[test]
    fn test_parse_occurred_at_rejects_date_only() {
        assert!(matches!(
            parse_occurred_at("2026-03-14"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_parse_occurred_at_rejects_garbage() {
        assert!(parse_occurred_at("next tuesday").is_err());
        assert!(parse_occurred_at("").is_err());
    }

    #[test]
    fn test_expand_category_filter_groups_road_and_accident() {
        assert_eq!(
            expand_category_filter("accident"),
            vec!["accident".to_string(), "road".to_string()]
        );
        assert_eq!(
            expand_category_filter("road"),
            vec!["accident".to_string(), "road".to_string()]
        );
        assert_eq!(expand_category_filter("flood"), vec!["flood".to_string()]);
    }

    #[test]
    fn test_parse_severity_is_case_insensitive() {
        assert_eq!(parse_severity("HIGH").unwrap(), Severity::High);
        assert_eq!(parse_severity(" low ").unwrap(), Severity::Low);
        assert!(parse_severity("catastrophic").is_err());
    }

    #[test]
    fn test_other_hazard_label_is_empty_string_not_null() {
        assert_eq!(
            other_hazard_for(OTHER_CATEGORY_CODE, None),
            Some(String::new())
        );
        assert_eq!(
            other_hazard_for(OTHER_CATEGORY_CODE, Some("loose wiring".to_string())),
            Some("loose wiring".to_string())
        );
        assert_eq!(other_hazard_for("flood", Some("ignored".to_string())), None);
    }

    #[tokio::test]
    async fn test_registered_area_code_is_kept() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_area("NORTH")]])
            .into_connection();

        let service = service_over(db);
        let code = service.resolve_area_code(Some("NORTH")).await.unwrap();

        assert_eq!(code, "NORTH");
    }

    #[tokio::test]
    async fn test_unregistered_area_code_falls_back_to_default() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // The requested code is unknown.
            .append_query_results([Vec::<area::Model>::new()])
            // The sentinel area already exists.
            .append_query_results([[test_area(DEFAULT_AREA_CODE)]])
            .into_connection();

        let service = service_over(db);
        let code = service.resolve_area_code(Some("atlantis")).await.unwrap();

        assert_eq!(code, DEFAULT_AREA_CODE);
    }

    #[tokio::test]
    async fn test_blank_area_code_falls_back_to_default() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_area(DEFAULT_AREA_CODE)]])
            .into_connection();

        let service = service_over(db);
        let code = service.resolve_area_code(Some("  ")).await.unwrap();

        assert_eq!(code, DEFAULT_AREA_CODE);
    }
}
