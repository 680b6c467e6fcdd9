//! Administrator endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, patch, post},
};
use safepoint_common::AppResult;
use safepoint_core::achievement::ManualBadgeInput;
use safepoint_core::area::{AreaSummary, CreateAreaInput, UpdateAreaInput};
use safepoint_core::identity::{
    CreateAdminInput, CreateModeratorInput, RegisterReporterInput, UpdatePersonInput,
};
use safepoint_core::role_change::ChangeRoleInput;
use safepoint_db::entities::{
    administrator, area, badge, moderator, rejected_incident, reporter,
};
use safepoint_db::repositories::PersonRecord;
use serde::Deserialize;

use crate::{
    endpoints::incidents::IncidentView, extractors::Requester, middleware::AppState,
    response::ApiResponse,
};

// === Reporters ===

async fn list_reporters(
    Requester(claim): Requester,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<reporter::Model>>> {
    Ok(ApiResponse::ok(
        state.identity_service.list_reporters(&claim).await?,
    ))
}

async fn create_reporter(
    Requester(claim): Requester,
    State(state): State<AppState>,
    Json(input): Json<RegisterReporterInput>,
) -> AppResult<ApiResponse<reporter::Model>> {
    Ok(ApiResponse::ok(
        state.identity_service.create_reporter(&claim, input).await?,
    ))
}

async fn update_reporter(
    Requester(claim): Requester,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdatePersonInput>,
) -> AppResult<ApiResponse<reporter::Model>> {
    Ok(ApiResponse::ok(
        state
            .identity_service
            .update_reporter(&claim, &id, input)
            .await?,
    ))
}

async fn delete_reporter(
    Requester(claim): Requester,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<serde_json::Value>> {
    state.identity_service.delete_reporter(&claim, &id).await?;
    Ok(ApiResponse::ok(serde_json::json!({ "ok": true })))
}

// === Moderators ===

async fn list_moderators(
    Requester(claim): Requester,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<moderator::Model>>> {
    Ok(ApiResponse::ok(
        state.identity_service.list_moderators(&claim).await?,
    ))
}

async fn create_moderator(
    Requester(claim): Requester,
    State(state): State<AppState>,
    Json(input): Json<CreateModeratorInput>,
) -> AppResult<ApiResponse<moderator::Model>> {
    Ok(ApiResponse::ok(
        state
            .identity_service
            .create_moderator(&claim, input)
            .await?,
    ))
}

async fn update_moderator(
    Requester(claim): Requester,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdatePersonInput>,
) -> AppResult<ApiResponse<moderator::Model>> {
    Ok(ApiResponse::ok(
        state
            .identity_service
            .update_moderator(&claim, &id, input)
            .await?,
    ))
}

async fn delete_moderator(
    Requester(claim): Requester,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<serde_json::Value>> {
    state.identity_service.delete_moderator(&claim, &id).await?;
    Ok(ApiResponse::ok(serde_json::json!({ "ok": true })))
}

// === Administrators ===

async fn list_admins(
    Requester(claim): Requester,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<administrator::Model>>> {
    Ok(ApiResponse::ok(
        state.identity_service.list_admins(&claim).await?,
    ))
}

async fn create_admin(
    Requester(claim): Requester,
    State(state): State<AppState>,
    Json(input): Json<CreateAdminInput>,
) -> AppResult<ApiResponse<administrator::Model>> {
    Ok(ApiResponse::ok(
        state.identity_service.create_admin(&claim, input).await?,
    ))
}

async fn update_admin(
    Requester(claim): Requester,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdatePersonInput>,
) -> AppResult<ApiResponse<administrator::Model>> {
    Ok(ApiResponse::ok(
        state
            .identity_service
            .update_admin(&claim, &id, input)
            .await?,
    ))
}

async fn delete_admin(
    Requester(claim): Requester,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<serde_json::Value>> {
    state.identity_service.delete_admin(&claim, &id).await?;
    Ok(ApiResponse::ok(serde_json::json!({ "ok": true })))
}

// === Role migration ===

/// Migrate an account to another identity class.
async fn change_role(
    Requester(claim): Requester,
    State(state): State<AppState>,
    Json(input): Json<ChangeRoleInput>,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let record = state.role_change_service.change_role(&claim, input).await?;

    let role = match &record {
        PersonRecord::Reporter(_) => "Reporter",
        PersonRecord::Moderator(_) => "Moderator",
        PersonRecord::Administrator(_) => "Admin",
    };
    Ok(ApiResponse::ok(serde_json::json!({
        "id": record.id(),
        "username": record.username(),
        "role": role,
    })))
}

// === Validation lifecycle ===

async fn list_incidents(
    Requester(claim): Requester,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<IncidentView>>> {
    let incidents = state.validation_service.list_all(&claim).await?;

    Ok(ApiResponse::ok(
        incidents
            .into_iter()
            .map(|(i, v)| IncidentView::from_model(i, v.as_ref()))
            .collect(),
    ))
}

/// Validation decision body.
#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub accept: bool,
}

async fn validate_incident(
    Requester(claim): Requester,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(req): Json<ValidateRequest>,
) -> AppResult<ApiResponse<serde_json::Value>> {
    state
        .validation_service
        .validate(&claim, id, req.accept)
        .await?;
    Ok(ApiResponse::ok(serde_json::json!({ "ok": true })))
}

async fn unvalidate_incident(
    Requester(claim): Requester,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<ApiResponse<serde_json::Value>> {
    state.validation_service.unvalidate(&claim, id).await?;
    Ok(ApiResponse::ok(serde_json::json!({ "ok": true })))
}

async fn list_rejected(
    Requester(claim): Requester,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<rejected_incident::Model>>> {
    Ok(ApiResponse::ok(
        state.validation_service.list_rejected(&claim).await?,
    ))
}

async fn recover_rejected(
    Requester(claim): Requester,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<ApiResponse<IncidentView>> {
    let incident = state.validation_service.recover(&claim, id).await?;
    Ok(ApiResponse::ok(IncidentView::from_model(incident, None)))
}

async fn delete_rejected(
    Requester(claim): Requester,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<ApiResponse<serde_json::Value>> {
    state
        .validation_service
        .delete_permanently(&claim, id)
        .await?;
    Ok(ApiResponse::ok(serde_json::json!({ "ok": true })))
}

// === Areas ===

async fn list_areas(
    Requester(claim): Requester,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<AreaSummary>>> {
    Ok(ApiResponse::ok(
        state.area_service.list_area_summaries(&claim).await?,
    ))
}

async fn create_area(
    Requester(claim): Requester,
    State(state): State<AppState>,
    Json(input): Json<CreateAreaInput>,
) -> AppResult<ApiResponse<area::Model>> {
    Ok(ApiResponse::ok(
        state.area_service.create_area(&claim, input).await?,
    ))
}

async fn update_area(
    Requester(claim): Requester,
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(input): Json<UpdateAreaInput>,
) -> AppResult<ApiResponse<area::Model>> {
    Ok(ApiResponse::ok(
        state.area_service.update_area(&claim, &code, input).await?,
    ))
}

async fn area_moderators(
    Requester(claim): Requester,
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<ApiResponse<Vec<moderator::Model>>> {
    Ok(ApiResponse::ok(
        state
            .area_service
            .list_moderators_in_area(&claim, &code)
            .await?,
    ))
}

async fn area_incidents(
    Requester(claim): Requester,
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<ApiResponse<Vec<IncidentView>>> {
    let incidents = state
        .area_service
        .list_incidents_in_area(&claim, &code)
        .await?;

    Ok(ApiResponse::ok(
        incidents
            .into_iter()
            .map(|(i, v)| IncidentView::from_model(i, v.as_ref()))
            .collect(),
    ))
}

// === Badges ===

async fn grant_badge(
    Requester(claim): Requester,
    State(state): State<AppState>,
    Json(input): Json<ManualBadgeInput>,
) -> AppResult<ApiResponse<badge::Model>> {
    Ok(ApiResponse::ok(
        state.achievement_service.grant_badge(&claim, input).await?,
    ))
}

async fn revoke_badge(
    Requester(claim): Requester,
    State(state): State<AppState>,
    Json(input): Json<ManualBadgeInput>,
) -> AppResult<ApiResponse<serde_json::Value>> {
    state.achievement_service.revoke_badge(&claim, input).await?;
    Ok(ApiResponse::ok(serde_json::json!({ "ok": true })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reporters", get(list_reporters))
        .route("/reporters", post(create_reporter))
        .route("/reporters/{id}", patch(update_reporter))
        .route("/reporters/{id}", delete(delete_reporter))
        .route("/moderators", get(list_moderators))
        .route("/moderators", post(create_moderator))
        .route("/moderators/{id}", patch(update_moderator))
        .route("/moderators/{id}", delete(delete_moderator))
        .route("/admins", get(list_admins))
        .route("/admins", post(create_admin))
        .route("/admins/{id}", patch(update_admin))
        .route("/admins/{id}", delete(delete_admin))
        .route("/role-change", post(change_role))
        .route("/incidents", get(list_incidents))
        .route("/incidents/{id}/validate", post(validate_incident))
        .route("/incidents/{id}/unvalidate", post(unvalidate_incident))
        .route("/rejected", get(list_rejected))
        .route("/rejected/{id}/recover", post(recover_rejected))
        .route("/rejected/{id}", delete(delete_rejected))
        .route("/areas", get(list_areas))
        .route("/areas", post(create_area))
        .route("/areas/{code}", patch(update_area))
        .route("/areas/{code}/moderators", get(area_moderators))
        .route("/areas/{code}/incidents", get(area_incidents))
        .route("/badges", post(grant_badge))
        .route("/badges", delete(revoke_badge))
}
