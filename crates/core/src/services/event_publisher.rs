//! Event publisher service.
//!
//! Provides an abstraction for publishing real-time events. The actual
//! implementation lives in the API crate, on top of the WebSocket broadcast
//! channel. Publishing happens only after the triggering state change has
//! committed, and failures are logged rather than propagated.

use async_trait::async_trait;
use safepoint_common::AppResult;
use std::sync::Arc;

/// Event types for real-time updates.
///
/// Every event is broadcast to every connected client; payloads therefore
/// carry only fields that are already public. Clients decide whether an
/// event is personally relevant to the viewer.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// An incident moved through the validation lifecycle.
    IncidentStatus {
        title: String,
        location_address: Option<String>,
        latitude: Option<f64>,
        longitude: Option<f64>,
        incident_id: i32,
        status: String,
        reporter_id: String,
    },
    /// A badge was awarded.
    BadgeAwarded {
        person_id: String,
        badge_name: String,
    },
    /// An incident was marked resolved.
    IncidentResolved {
        title: String,
        incident_id: i32,
        reporter_id: String,
    },
}

/// Trait for publishing real-time events.
///
/// Core services publish through this without depending on the transport.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an incident lifecycle event ("Validated", "Rejected", ...).
    async fn publish_incident_status(
        &self,
        title: &str,
        location_address: Option<&str>,
        latitude: Option<f64>,
        longitude: Option<f64>,
        incident_id: i32,
        status: &str,
        reporter_id: &str,
    ) -> AppResult<()>;

    /// Publish a badge awarded event.
    async fn publish_badge_awarded(&self, person_id: &str, badge_name: &str) -> AppResult<()>;

    /// Publish an incident resolved event.
    async fn publish_incident_resolved(
        &self,
        title: &str,
        incident_id: i32,
        reporter_id: &str,
    ) -> AppResult<()>;
}

/// A no-op implementation for tests or when streaming is disabled.
#[derive(Clone, Default)]
pub struct NoOpEventPublisher;

#[async_trait]
impl EventPublisher for NoOpEventPublisher {
    async fn publish_incident_status(
        &self,
        _title: &str,
        _location_address: Option<&str>,
        _latitude: Option<f64>,
        _longitude: Option<f64>,
        _incident_id: i32,
        _status: &str,
        _reporter_id: &str,
    ) -> AppResult<()> {
        Ok(())
    }

    async fn publish_badge_awarded(&self, _person_id: &str, _badge_name: &str) -> AppResult<()> {
        Ok(())
    }

    async fn publish_incident_resolved(
        &self,
        _title: &str,
        _incident_id: i32,
        _reporter_id: &str,
    ) -> AppResult<()> {
        Ok(())
    }
}

/// Wrapper for boxed `EventPublisher` trait object.
pub type EventPublisherService = Arc<dyn EventPublisher>;
