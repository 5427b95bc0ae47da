//! Domain models for the advisory service.

pub mod plan;
pub mod request;

pub use plan::{TreatmentPlan, TreatmentRecommendations};
pub use request::{DiseaseReport, TreatmentRequest, TreatmentType};
