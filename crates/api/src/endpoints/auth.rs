//! Authentication endpoints.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use safepoint_common::AppResult;
use safepoint_core::auth::{LoginInput, ResetPasswordInput, UpdatePasswordInput};
use serde::{Deserialize, Serialize};

use crate::{extractors::Requester, middleware::AppState, response::ApiResponse};

/// Login response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub id: String,
    pub username: String,
    pub role: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_code: Option<String>,
    pub is_superuser: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<String>,
}

/// Log in with username and password.
async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> AppResult<ApiResponse<LoginResponse>> {
    let session = state.auth_service.login(input).await?;

    Ok(ApiResponse::ok(LoginResponse {
        id: session.id,
        username: session.username,
        role: session.role.to_string(),
        email: session.email,
        area_code: session.area_code,
        is_superuser: session.is_superuser,
        permissions: session.permissions,
    }))
}

/// Change the requester's own password.
async fn update_password(
    Requester(claim): Requester,
    State(state): State<AppState>,
    Json(input): Json<UpdatePasswordInput>,
) -> AppResult<ApiResponse<serde_json::Value>> {
    state.auth_service.update_password(&claim, input).await?;
    Ok(ApiResponse::ok(serde_json::json!({ "ok": true })))
}

/// Reset a forgotten password by email.
async fn reset_password(
    State(state): State<AppState>,
    Json(input): Json<ResetPasswordInput>,
) -> AppResult<ApiResponse<serde_json::Value>> {
    state.auth_service.reset_password(input).await?;
    Ok(ApiResponse::ok(serde_json::json!({ "ok": true })))
}

/// Email lookup query.
#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

/// Whether any account owns the email. Used before offering a reset.
async fn email_exists(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let exists = state.auth_service.email_exists(&query.email).await?;
    Ok(ApiResponse::ok(serde_json::json!({ "exists": exists })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/password", post(update_password))
        .route("/reset-password", post(reset_password))
        .route("/email-exists", get(email_exists))
}
