//! User-facing account endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch},
};
use safepoint_common::AppResult;
use safepoint_core::identity::UpdatePersonInput;
use safepoint_db::entities::{area, badge, reporter};

use crate::{extractors::Requester, middleware::AppState, response::ApiResponse};

/// Get a reporter's public profile.
async fn get_reporter(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<reporter::Model>> {
    Ok(ApiResponse::ok(
        state.identity_service.get_reporter(&id).await?,
    ))
}

/// List a person's badges.
async fn badges(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<badge::Model>>> {
    Ok(ApiResponse::ok(
        state.achievement_service.list_badges(&id).await?,
    ))
}

/// Update a reporter account. Allowed for the account owner and staff.
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

/// List the known areas, for report submission forms.
async fn areas(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<area::Model>>> {
    Ok(ApiResponse::ok(state.area_service.list_areas().await?))
}

/// List the known hazard categories.
async fn categories(
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<safepoint_db::entities::hazard_category::Model>>> {
    Ok(ApiResponse::ok(state.area_service.list_categories().await?))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/areas", get(areas))
        .route("/categories", get(categories))
        .route("/{id}", get(get_reporter))
        .route("/{id}", patch(update_reporter))
        .route("/{id}/badges", get(badges))
}
