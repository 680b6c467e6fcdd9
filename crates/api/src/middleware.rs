//! API middleware and shared state.

use safepoint_core::{
    AchievementService, AreaService, AuthService, CommentService, IdentityService,
    IncidentService, RoleChangeService, ValidationService,
};

use crate::streaming::StreamingState;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub identity_service: IdentityService,
    pub area_service: AreaService,
    pub incident_service: IncidentService,
    pub validation_service: ValidationService,
    pub role_change_service: RoleChangeService,
    pub achievement_service: AchievementService,
    pub comment_service: CommentService,
    pub streaming: StreamingState,
}
