//! API integration tests.
//!
//! These tests verify routing, extraction and error mapping over a mock
//! database.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use safepoint_api::{StreamingState, middleware::AppState, router as api_router};
use safepoint_core::{
    AchievementService, AreaService, AuthService, AuthorizationService, CommentService,
    IdentityService, IncidentService, RoleChangeService, ValidationService,
};
use safepoint_db::repositories::{
    AdministratorRepository, AreaRepository, BadgeRepository, CommentRepository,
    HazardCategoryRepository, IdentityRepository, IncidentRepository, ModeratorRepository,
    RejectedIncidentRepository, ReporterRepository, ValidationRepository,
};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
use std::sync::Arc;
use tower::ServiceExt;

/// Create a mock database connection.
fn create_mock_db() -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .into_connection()
}

/// Create test app state with mock database.
fn create_test_state() -> AppState {
    let db = Arc::new(create_mock_db());

    let reporter_repo = ReporterRepository::new(Arc::clone(&db));
    let moderator_repo = ModeratorRepository::new(Arc::clone(&db));
    let admin_repo = AdministratorRepository::new(Arc::clone(&db));
    let identity_repo = IdentityRepository::new(Arc::clone(&db));
    let area_repo = AreaRepository::new(Arc::clone(&db));
    let category_repo = HazardCategoryRepository::new(Arc::clone(&db));
    let incident_repo = IncidentRepository::new(Arc::clone(&db));
    let validation_repo = ValidationRepository::new(Arc::clone(&db));
    let rejected_repo = RejectedIncidentRepository::new(Arc::clone(&db));
    let badge_repo = BadgeRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));

    let authz = AuthorizationService::new(
        reporter_repo.clone(),
        moderator_repo.clone(),
        admin_repo.clone(),
    );

    let streaming = StreamingState::new();
    let publisher = streaming.publisher();

    let auth_service = AuthService::new(
        identity_repo.clone(),
        reporter_repo.clone(),
        moderator_repo.clone(),
        admin_repo.clone(),
        authz.clone(),
    );
    let identity_service = IdentityService::new(
        identity_repo.clone(),
        reporter_repo.clone(),
        moderator_repo.clone(),
        admin_repo.clone(),
        area_repo.clone(),
        authz.clone(),
    );
    let area_service = AreaService::new(
        area_repo.clone(),
        category_repo.clone(),
        moderator_repo,
        incident_repo.clone(),
        authz.clone(),
    );
    let incident_service = IncidentService::new(
        incident_repo.clone(),
        reporter_repo,
        area_repo.clone(),
        category_repo,
        Arc::clone(&publisher),
    );
    let achievement_service = AchievementService::new(
        badge_repo,
        incident_repo.clone(),
        comment_repo.clone(),
        authz.clone(),
        Arc::clone(&publisher),
    );
    let validation_service = ValidationService::new(
        incident_repo.clone(),
        validation_repo,
        rejected_repo,
        incident_service.clone(),
        achievement_service.clone(),
        authz.clone(),
        Arc::clone(&publisher),
    );
    let role_change_service = RoleChangeService::new(identity_repo.clone(), area_repo, authz);
    let comment_service =
        CommentService::new(comment_repo, incident_repo, identity_repo, achievement_service.clone());

    AppState {
        auth_service,
        identity_service,
        area_service,
        incident_service,
        validation_service,
        role_change_service,
        achievement_service,
        comment_service,
        streaming,
    }
}

/// Create the test router.
fn create_test_router() -> Router {
    let state = create_test_state();
    api_router().with_state(state)
}

#[tokio::test]
async fn test_own_incidents_without_requester_headers_is_unauthorized() {
    let app = create_test_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/incidents/mine")
                .method("GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_requester_role_is_unauthorized() {
    let app = create_test_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/incidents/mine")
                .method("GET")
                .header("X-Requester-Id", "rep1")
                .header("X-Requester-Role", "overlord")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let app = create_test_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/nonexistent/endpoint")
                .method("GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_register_with_invalid_json_returns_error() {
    let app = create_test_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/register")
                .method("POST")
                .header("Content-Type", "application/json")
                .body(Body::from("invalid json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(
        response.status() == StatusCode::BAD_REQUEST
            || response.status() == StatusCode::UNPROCESSABLE_ENTITY
    );
}

#[tokio::test]
async fn test_register_with_bad_email_is_rejected_before_db() {
    let app = create_test_router();

    let body = serde_json::json!({
        "username": "alice",
        "email": "not-an-email",
        "contact": "09171234567",
        "password": "long-enough",
        "first_name": "Alice",
        "last_name": "Santos",
    });

    let response = app
        .oneshot(
            Request::builder()
                .uri("/register")
                .method("POST")
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_with_unknown_account_is_an_error() {
    let app = create_test_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth/login")
                .method("POST")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"username":"ghost","password":"wrong-secret"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    // The mock connection has no rows to return, so the lookup fails one
    // way or another; it must never succeed.
    let status = response.status();
    assert!(
        status == StatusCode::UNAUTHORIZED || status == StatusCode::INTERNAL_SERVER_ERROR
    );
}
