//! Incident endpoints: the public feed and the reporter's own reports.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, patch, post},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use safepoint_common::AppResult;
use safepoint_core::incident::{IncidentFeedFilter, SubmitIncidentInput, UpdateIncidentInput};
use safepoint_core::validation::display_status;
use safepoint_db::entities::{incident, validation};
use serde::Serialize;

use crate::{extractors::Requester, middleware::AppState, response::ApiResponse};

/// An incident as it goes over the wire. Image bytes travel base64-encoded.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentView {
    pub id: i32,
    pub reporter_id: String,
    pub title: String,
    pub category_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_hazard: Option<String>,
    pub severity: incident::Severity,
    pub occurred_at: chrono::DateTime<chrono::FixedOffset>,
    pub area_code: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_address: Option<String>,
    pub is_resolved: bool,
    pub status: String,
    pub created_at: chrono::DateTime<chrono::FixedOffset>,
}

impl IncidentView {
    pub(crate) fn from_model(
        incident: incident::Model,
        validation: Option<&validation::Model>,
    ) -> Self {
        let status = display_status(validation).to_string();
        Self {
            id: incident.id,
            reporter_id: incident.reporter_id,
            title: incident.title,
            category_code: incident.category_code,
            other_hazard: incident.other_hazard,
            severity: incident.severity,
            occurred_at: incident.occurred_at,
            area_code: incident.area_code,
            description: incident.description,
            image: incident.image.map(|bytes| BASE64.encode(bytes)),
            latitude: incident.latitude,
            longitude: incident.longitude,
            location_address: incident.location_address,
            is_resolved: incident.is_resolved,
            status,
            created_at: incident.created_at,
        }
    }
}

/// The public feed of validated incidents.
async fn feed(
    State(state): State<AppState>,
    Query(filter): Query<IncidentFeedFilter>,
) -> AppResult<ApiResponse<Vec<IncidentView>>> {
    let incidents = state.incident_service.list_validated(filter).await?;

    Ok(ApiResponse::ok(
        incidents
            .into_iter()
            .map(|i| {
                // Everything in the feed is validated by construction.
                let mut view = IncidentView::from_model(i, None);
                view.status = "Validated".to_string();
                view
            })
            .collect(),
    ))
}

/// Get one incident with its validation status.
async fn get_incident(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<ApiResponse<IncidentView>> {
    let (incident, validation) = state.incident_service.get(id).await?;
    Ok(ApiResponse::ok(IncidentView::from_model(
        incident,
        validation.as_ref(),
    )))
}

/// Submit a new incident.
async fn submit(
    Requester(claim): Requester,
    State(state): State<AppState>,
    Json(input): Json<SubmitIncidentInput>,
) -> AppResult<ApiResponse<IncidentView>> {
    let incident = state.incident_service.submit(&claim, input).await?;
    Ok(ApiResponse::ok(IncidentView::from_model(incident, None)))
}

/// List the requester's own incidents.
async fn mine(
    Requester(claim): Requester,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<IncidentView>>> {
    let incidents = state.incident_service.list_own(&claim).await?;

    Ok(ApiResponse::ok(
        incidents
            .into_iter()
            .map(|(i, v)| IncidentView::from_model(i, v.as_ref()))
            .collect(),
    ))
}

/// Update one of the requester's own incidents.
async fn update(
    Requester(claim): Requester,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<UpdateIncidentInput>,
) -> AppResult<ApiResponse<IncidentView>> {
    state.incident_service.update(&claim, id, input).await?;

    let (incident, validation) = state.incident_service.get(id).await?;
    Ok(ApiResponse::ok(IncidentView::from_model(
        incident,
        validation.as_ref(),
    )))
}

/// Delete one of the requester's own incidents.
async fn remove(
    Requester(claim): Requester,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<ApiResponse<serde_json::Value>> {
    state.incident_service.delete_own(&claim, id).await?;
    Ok(ApiResponse::ok(serde_json::json!({ "ok": true })))
}

/// Mark one of the requester's own incidents as resolved.
async fn resolve(
    Requester(claim): Requester,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<ApiResponse<IncidentView>> {
    state.incident_service.mark_resolved(&claim, id).await?;

    let (incident, validation) = state.incident_service.get(id).await?;
    Ok(ApiResponse::ok(IncidentView::from_model(
        incident,
        validation.as_ref(),
    )))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(feed))
        .route("/", post(submit))
        .route("/mine", get(mine))
        .route("/{id}", get(get_incident))
        .route("/{id}", patch(update))
        .route("/{id}", delete(remove))
        .route("/{id}/resolve", post(resolve))
}
