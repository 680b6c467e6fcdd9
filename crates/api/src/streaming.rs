//! WebSocket streaming API.
//!
//! One global broadcast topic. Every connected client receives every event;
//! relevance to the viewer is decided per connection with [`is_personal`],
//! never by filtering on the server. Event payloads therefore carry only
//! fields that are already public.

use async_trait::async_trait;
use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use safepoint_common::AppResult;
use safepoint_core::event_publisher::{EventPublisher, EventPublisherService, StreamEvent};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::middleware::AppState;

/// Streaming query parameters.
#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    /// Viewer account id, used to flag personally relevant events.
    pub viewer: Option<String>,
}

/// Server-to-client message.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerMessage {
    #[serde(rename = "type")]
    pub event_type: String,
    pub body: serde_json::Value,
    /// Whether the event concerns the connection's viewer.
    pub personal: bool,
}

/// Whether an event is personally relevant to a viewer.
#[must_use]
pub fn is_personal(event: &StreamEvent, viewer_id: Option<&str>) -> bool {
    let Some(viewer) = viewer_id else {
        return false;
    };
    match event {
        StreamEvent::IncidentStatus { reporter_id, .. }
        | StreamEvent::IncidentResolved { reporter_id, .. } => reporter_id == viewer,
        StreamEvent::BadgeAwarded { person_id, .. } => person_id == viewer,
    }
}

/// Serialize an event into its wire form.
#[must_use]
pub fn event_to_message(event: &StreamEvent, viewer_id: Option<&str>) -> ServerMessage {
    let (event_type, body) = match event {
        StreamEvent::IncidentStatus {
            title,
            location_address,
            latitude,
            longitude,
            incident_id,
            status,
            reporter_id,
        } => (
            "incidentStatus",
            serde_json::json!({
                "title": title,
                "locationAddress": location_address,
                "latitude": latitude,
                "longitude": longitude,
                "incidentId": incident_id,
                "status": status,
                "reporterId": reporter_id,
            }),
        ),
        StreamEvent::BadgeAwarded {
            person_id,
            badge_name,
        } => (
            "badgeAwarded",
            serde_json::json!({
                "personId": person_id,
                "badgeName": badge_name,
            }),
        ),
        StreamEvent::IncidentResolved {
            title,
            incident_id,
            reporter_id,
        } => (
            "incidentResolved",
            serde_json::json!({
                "title": title,
                "incidentId": incident_id,
                "reporterId": reporter_id,
            }),
        ),
    };

    ServerMessage {
        event_type: event_type.to_string(),
        body,
        personal: is_personal(event, viewer_id),
    }
}

/// Shared state for streaming.
#[derive(Clone)]
pub struct StreamingState {
    /// Broadcast sender for the global topic.
    pub tx: Arc<broadcast::Sender<StreamEvent>>,
}

impl StreamingState {
    /// Create a new streaming state.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1000);
        Self { tx: Arc::new(tx) }
    }

    /// An event publisher feeding this topic.
    #[must_use]
    pub fn publisher(&self) -> EventPublisherService {
        Arc::new(BroadcastEventPublisher {
            tx: Arc::clone(&self.tx),
        })
    }
}

impl Default for StreamingState {
    fn default() -> Self {
        Self::new()
    }
}

/// Event publisher backed by the global broadcast topic.
#[derive(Clone)]
pub struct BroadcastEventPublisher {
    tx: Arc<broadcast::Sender<StreamEvent>>,
}

impl BroadcastEventPublisher {
    /// Create a publisher for an existing topic.
    #[must_use]
    pub const fn new(tx: Arc<broadcast::Sender<StreamEvent>>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl EventPublisher for BroadcastEventPublisher {
    async fn publish_incident_status(
        &self,
        title: &str,
        location_address: Option<&str>,
        latitude: Option<f64>,
        longitude: Option<f64>,
        incident_id: i32,
        status: &str,
        reporter_id: &str,
    ) -> AppResult<()> {
        // A send error just means nobody is listening.
        let _ = self.tx.send(StreamEvent::IncidentStatus {
            title: title.to_string(),
            location_address: location_address.map(str::to_string),
            latitude,
            longitude,
            incident_id,
            status: status.to_string(),
            reporter_id: reporter_id.to_string(),
        });
        Ok(())
    }

    async fn publish_badge_awarded(&self, person_id: &str, badge_name: &str) -> AppResult<()> {
        let _ = self.tx.send(StreamEvent::BadgeAwarded {
            person_id: person_id.to_string(),
            badge_name: badge_name.to_string(),
        });
        Ok(())
    }

    async fn publish_incident_resolved(
        &self,
        title: &str,
        incident_id: i32,
        reporter_id: &str,
    ) -> AppResult<()> {
        let _ = self.tx.send(StreamEvent::IncidentResolved {
            title: title.to_string(),
            incident_id,
            reporter_id: reporter_id.to_string(),
        });
        Ok(())
    }
}

/// WebSocket handler for streaming.
pub async fn streaming_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<StreamQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    info!("New streaming connection");

    ws.on_upgrade(move |socket| handle_socket(socket, query, state))
}

/// Handle a WebSocket connection.
async fn handle_socket(socket: WebSocket, query: StreamQuery, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let viewer_id = query.viewer;

    info!(viewer_id = ?viewer_id, "Streaming connection established");

    let mut rx = state.streaming.tx.subscribe();

    loop {
        tokio::select! {
            Some(msg) = receiver.next() => {
                match msg {
                    Ok(Message::Close(_)) => {
                        info!("Client closed connection");
                        break;
                    }
                    Ok(Message::Ping(data)) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!("WebSocket error: {e}");
                        break;
                    }
                }
            }

            event = rx.recv() => {
                match event {
                    Ok(event) => {
                        let msg = event_to_message(&event, viewer_id.as_deref());
                        let json = serde_json::to_string(&msg).unwrap_or_default();
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Streaming client lagged, skipped {skipped} events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    info!("Streaming connection closed");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn rejection_event() -> StreamEvent {
        StreamEvent::IncidentStatus {
            title: "Flooded underpass".to_string(),
            location_address: Some("Quirino Ave".to_string()),
            latitude: Some(14.57),
            longitude: Some(120.99),
            incident_id: 8,
            status: "Rejected".to_string(),
            reporter_id: "rep1".to_string(),
        }
    }

    #[test]
    fn test_rejection_payload_carries_only_public_fields() {
        let msg = event_to_message(&rejection_event(), None);
        let body = msg.body.as_object().unwrap();

        let mut keys: Vec<&str> = body.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "incidentId",
                "latitude",
                "locationAddress",
                "longitude",
                "reporterId",
                "status",
                "title",
            ]
        );
        assert_eq!(msg.event_type, "incidentStatus");
    }

    #[test]
    fn test_is_personal_matches_reporter() {
        let event = rejection_event();

        assert!(is_personal(&event, Some("rep1")));
        assert!(!is_personal(&event, Some("rep2")));
        assert!(!is_personal(&event, None));
    }

    #[test]
    fn test_is_personal_matches_badge_holder() {
        let event = StreamEvent::BadgeAwarded {
            person_id: "rep7".to_string(),
            badge_name: "Sociable".to_string(),
        };

        assert!(is_personal(&event, Some("rep7")));
        assert!(!is_personal(&event, Some("mod1")));
    }

    #[tokio::test]
    async fn test_publisher_feeds_subscribers() {
        let state = StreamingState::new();
        let mut rx = state.tx.subscribe();
        let publisher = state.publisher();

        publisher
            .publish_badge_awarded("rep1", "Certified Reporter")
            .await
            .unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            StreamEvent::BadgeAwarded {
                person_id: "rep1".to_string(),
                badge_name: "Certified Reporter".to_string(),
            }
        );
    }
}
