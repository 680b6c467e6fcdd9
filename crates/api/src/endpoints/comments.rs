//! Comment endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, patch, post},
};
use safepoint_common::AppResult;
use safepoint_core::comment::{CommentView, EditCommentInput, PostCommentInput};
use safepoint_db::entities::comment;

use crate::{extractors::Requester, middleware::AppState, response::ApiResponse};

/// Post a comment on an incident.
async fn post_comment(
    Requester(claim): Requester,
    State(state): State<AppState>,
    Json(input): Json<PostCommentInput>,
) -> AppResult<ApiResponse<comment::Model>> {
    Ok(ApiResponse::ok(
        state.comment_service.post(&claim, input).await?,
    ))
}

/// List an incident's comments with resolved authors.
async fn list_comments(
    State(state): State<AppState>,
    Path(incident_id): Path<i32>,
) -> AppResult<ApiResponse<Vec<CommentView>>> {
    Ok(ApiResponse::ok(
        state.comment_service.list(incident_id).await?,
    ))
}

/// Edit one's own comment.
async fn edit_comment(
    Requester(claim): Requester,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<EditCommentInput>,
) -> AppResult<ApiResponse<comment::Model>> {
    Ok(ApiResponse::ok(
        state.comment_service.edit(&claim, id, input).await?,
    ))
}

/// Delete one's own comment.
async fn delete_comment(
    Requester(claim): Requester,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<ApiResponse<serde_json::Value>> {
    state.comment_service.delete(&claim, id).await?;
    Ok(ApiResponse::ok(serde_json::json!({ "ok": true })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(post_comment))
        .route("/incident/{id}", get(list_comments))
        .route("/{id}", patch(edit_comment))
        .route("/{id}", delete(delete_comment))
}
