//! SafePoint server entry point.

#![allow(clippy::expect_used)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use safepoint_api::{StreamingState, middleware::AppState, router as api_router};
use safepoint_common::Config;
use safepoint_core::{
    AchievementService, AreaService, AuthService, AuthorizationService, CommentService,
    IdentityService, IncidentService, RoleChangeService, ValidationService,
};
use safepoint_db::repositories::{
    AdministratorRepository, AreaRepository, BadgeRepository, CommentRepository,
    HazardCategoryRepository, IdentityRepository, IncidentRepository, ModeratorRepository,
    RejectedIncidentRepository, ReporterRepository, ValidationRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "safepoint=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting SafePoint server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = safepoint_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    safepoint_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
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

    // Initialize streaming state; the publisher fans events out to every
    // connected websocket client.
    let streaming = StreamingState::new();
    let publisher = streaming.publisher();

    // Initialize services
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
    let comment_service = CommentService::new(
        comment_repo,
        incident_repo,
        identity_repo,
        achievement_service.clone(),
    );

    // Create app state
    let state = AppState {
        auth_service,
        identity_service,
        area_service,
        incident_service,
        validation_service,
        role_change_service,
        achievement_service,
        comment_service,
        streaming,
    };

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
