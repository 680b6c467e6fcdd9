//! Area service.
//!
//! Areas are the moderation boundary: every moderator is pinned to one, and
//! every incident lands in one. Submissions may name areas that do not exist
//! yet, so creation is lenient while rename and listing stay admin-facing.

use safepoint_common::{AppError, AppResult};
use safepoint_db::entities::{area, hazard_category, incident, moderator, validation};
use safepoint_db::repositories::{
    AreaRepository, HazardCategoryRepository, IncidentRepository, ModeratorRepository,
};
use sea_orm::{IntoActiveModel, Set};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::authorization::{AuthorizationService, RequesterClaim};

/// Input for creating an area.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAreaInput {
    #[validate(length(min = 1, max = 255))]
    pub code: String,

    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

/// Input for renaming an area.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAreaInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

/// An area with its headcounts, for the admin overview.
#[derive(Debug, Clone, Serialize)]
pub struct AreaSummary {
    pub code: String,
    pub name: String,
    pub moderator_count: u64,
    pub incident_count: u64,
}

/// Area service for business logic.
#[derive(Clone)]
pub struct AreaService {
    area_repo: AreaRepository,
    category_repo: HazardCategoryRepository,
    moderator_repo: ModeratorRepository,
    incident_repo: IncidentRepository,
    authz: AuthorizationService,
}

impl AreaService {
    /// Create a new area service.
    #[must_use]
    pub const fn new(
        area_repo: AreaRepository,
        category_repo: HazardCategoryRepository,
        moderator_repo: ModeratorRepository,
        incident_repo: IncidentRepository,
        authz: AuthorizationService,
    ) -> Self {
        Self {
            area_repo,
            category_repo,
            moderator_repo,
            incident_repo,
            authz,
        }
    }

    /// Create an area explicitly. Administrators only.
    pub async fn create_area(
        &self,
        claim: &RequesterClaim,
        input: CreateAreaInput,
    ) -> AppResult<area::Model> {
        self.authz.require_admin(claim).await?;
        input.validate()?;

        if self.area_repo.find_by_code(&input.code).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "area {} already exists",
                input.code
            )));
        }

        self.area_repo
            .create(area::ActiveModel {
                code: Set(input.code),
                name: Set(input.name),
            })
            .await
    }

    /// Rename an area. Administrators only.
    pub async fn update_area(
        &self,
        claim: &RequesterClaim,
        code: &str,
        input: UpdateAreaInput,
    ) -> AppResult<area::Model> {
        self.authz.require_admin(claim).await?;
        input.validate()?;

        let current = self.area_repo.get_by_code(code).await?;
        let mut active = current.into_active_model();
        active.name = Set(input.name);

        self.area_repo.update(active).await
    }

    /// List all areas.
    pub async fn list_areas(&self) -> AppResult<Vec<area::Model>> {
        self.area_repo.find_all().await
    }

    /// List all areas with their moderator and incident counts.
    pub async fn list_area_summaries(
        &self,
        claim: &RequesterClaim,
    ) -> AppResult<Vec<AreaSummary>> {
        self.authz.require_admin(claim).await?;

        let mut summaries = Vec::new();
        for area in self.area_repo.find_all().await? {
            let moderator_count = self.moderator_repo.count_by_area(&area.code).await?;
            let incident_count = self.incident_repo.count_by_area(&area.code).await?;
            summaries.push(AreaSummary {
                code: area.code,
                name: area.name,
                moderator_count,
                incident_count,
            });
        }
        Ok(summaries)
    }

    /// List the moderators assigned to an area.
    pub async fn list_moderators_in_area(
        &self,
        claim: &RequesterClaim,
        code: &str,
    ) -> AppResult<Vec<moderator::Model>> {
        self.authz.require_admin(claim).await?;
        self.area_repo.get_by_code(code).await?;
        self.moderator_repo.find_by_area(code).await
    }

    /// List the incidents in an area with their validation state.
    pub async fn list_incidents_in_area(
        &self,
        claim: &RequesterClaim,
        code: &str,
    ) -> AppResult<Vec<(incident::Model, Option<validation::Model>)>> {
        self.authz.require_admin(claim).await?;
        self.area_repo.get_by_code(code).await?;
        self.incident_repo.find_by_area(code).await
    }

    /// List the known hazard categories.
    pub async fn list_categories(&self) -> AppResult<Vec<hazard_category::Model>> {
        self.category_repo.find_all().await
    }
}
