//! HTTP API layer for safepoint.
//!
//! This crate provides the REST API and real-time streaming:
//!
//! - **Endpoints**: public feed, reporter, moderator and admin surfaces
//! - **Extractors**: requester identity headers
//! - **Streaming**: one global WebSocket broadcast topic
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;
pub mod streaming;

pub use endpoints::router;
pub use streaming::{BroadcastEventPublisher, StreamingState, streaming_handler};
