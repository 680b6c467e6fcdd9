//! Database entities.

pub mod administrator;
pub mod area;
pub mod badge;
pub mod comment;
pub mod hazard_category;
pub mod incident;
pub mod incident_archive;
pub mod moderator;
pub mod person_archive;
pub mod rejected_incident;
pub mod reporter;
pub mod validation;

pub use administrator::Entity as Administrator;
pub use area::Entity as Area;
pub use badge::Entity as Badge;
pub use comment::Entity as Comment;
pub use hazard_category::Entity as HazardCategory;
pub use incident::Entity as Incident;
pub use incident_archive::Entity as IncidentArchive;
pub use moderator::Entity as Moderator;
pub use person_archive::Entity as PersonArchive;
pub use rejected_incident::Entity as RejectedIncident;
pub use reporter::Entity as Reporter;
pub use validation::Entity as Validation;
