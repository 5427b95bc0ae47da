pub mod advisor;
pub mod error;
pub mod fallback;
pub mod metrics;
pub mod prompt;
pub mod providers;

pub use advisor::{Advice, PlanSource, TreatmentAdvisor};
pub use error::AdvisoryError;
pub use fallback::fallback_plan;
