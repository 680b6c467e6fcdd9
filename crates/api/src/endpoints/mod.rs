//! API endpoints.

mod admin;
mod auth;
mod comments;
mod incidents;
mod moderator;
mod register;
mod users;

use axum::{Router, routing::get};

use crate::middleware::AppState;
use crate::streaming;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/register", register::router())
        .nest("/incidents", incidents::router())
        .nest("/moderator", moderator::router())
        .nest("/admin", admin::router())
        .nest("/comments", comments::router())
        .nest("/users", users::router())
        .route("/streaming", get(streaming::streaming_handler))
}
