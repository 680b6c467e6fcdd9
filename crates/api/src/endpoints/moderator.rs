//! Moderator endpoints, scoped to the moderator's own area.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, patch, post},
};
use safepoint_common::AppResult;
use safepoint_core::incident::UpdateIncidentInput;

use crate::{
    endpoints::incidents::IncidentView, extractors::Requester, middleware::AppState,
    response::ApiResponse,
};

/// List the incidents in the moderator's area.
async fn list_incidents(
    Requester(claim): Requester,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<IncidentView>>> {
    let incidents = state.validation_service.moderator_list(&claim).await?;

    Ok(ApiResponse::ok(
        incidents
            .into_iter()
            .map(|(i, v)| IncidentView::from_model(i, v.as_ref()))
            .collect(),
    ))
}

/// Get one incident in the moderator's area.
async fn get_incident(
    Requester(claim): Requester,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<ApiResponse<IncidentView>> {
    let (incident, validation) = state.validation_service.moderator_get(&claim, id).await?;
    Ok(ApiResponse::ok(IncidentView::from_model(
        incident,
        validation.as_ref(),
    )))
}

/// Patch an incident in the moderator's area.
async fn update_incident(
    Requester(claim): Requester,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<UpdateIncidentInput>,
) -> AppResult<ApiResponse<IncidentView>> {
    state
        .validation_service
        .moderator_update(&claim, id, input)
        .await?;

    let (incident, validation) = state.validation_service.moderator_get(&claim, id).await?;
    Ok(ApiResponse::ok(IncidentView::from_model(
        incident,
        validation.as_ref(),
    )))
}

/// Mark an in-area incident invalid.
async fn reject_incident(
    Requester(claim): Requester,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<ApiResponse<serde_json::Value>> {
    state.validation_service.moderator_reject(&claim, id).await?;
    Ok(ApiResponse::ok(serde_json::json!({ "ok": true })))
}

/// Permanently delete a rejected snapshot.
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

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/incidents", get(list_incidents))
        .route("/incidents/{id}", get(get_incident))
        .route("/incidents/{id}", patch(update_incident))
        .route("/incidents/{id}/reject", post(reject_incident))
        .route("/rejected/{id}", delete(delete_rejected))
}
