//! Database repositories.

pub mod administrator;
pub mod area;
pub mod badge;
pub mod comment;
pub mod hazard_category;
pub mod identity;
pub mod incident;
pub mod moderator;
pub mod rejected_incident;
pub mod reporter;
pub mod validation;

pub use administrator::AdministratorRepository;
pub use area::AreaRepository;
pub use badge::BadgeRepository;
pub use comment::CommentRepository;
pub use hazard_category::HazardCategoryRepository;
pub use identity::{IdentityRepository, NewPerson, PersonClass, PersonRecord};
pub use incident::IncidentRepository;
pub use moderator::ModeratorRepository;
pub use rejected_incident::RejectedIncidentRepository;
pub use reporter::ReporterRepository;
pub use validation::ValidationRepository;
