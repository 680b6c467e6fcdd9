//! Self-service registration endpoints.

use axum::{Json, Router, extract::State, routing::post};
use safepoint_common::AppResult;
use safepoint_core::identity::RegisterReporterInput;
use serde::Serialize;

use crate::{middleware::AppState, response::ApiResponse};

/// Registration response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub id: String,
    pub username: String,
    pub email: String,
}

/// Register a new reporter account.
async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterReporterInput>,
) -> AppResult<ApiResponse<RegisterResponse>> {
    let reporter = state.identity_service.register_reporter(input).await?;

    Ok(ApiResponse::ok(RegisterResponse {
        id: reporter.id,
        username: reporter.username,
        email: reporter.email,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(register))
}
