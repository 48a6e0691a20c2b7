pub mod error;
pub mod flows;
pub mod service;

pub use error::AdvisorError;
pub use flows::*;
pub use service::{AdvisorService, SavedCareerPlan, CAREER_PLANS_COLLECTION};
