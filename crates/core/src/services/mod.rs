//! Business logic services.

pub mod achievement;
pub mod area;
pub mod auth;
pub mod authorization;
pub mod comment;
pub mod event_publisher;
pub mod identity;
pub mod incident;
pub mod role_change;
pub mod validation;

pub use achievement::*;
pub use area::*;
pub use auth::*;
pub use authorization::*;
pub use comment::*;
pub use event_publisher::*;
pub use identity::*;
pub use incident::*;
pub use role_change::*;
pub use validation::*;
