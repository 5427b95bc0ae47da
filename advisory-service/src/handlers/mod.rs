//! HTTP handlers for the advisory service.

pub mod health;
pub mod metrics;
pub mod treatment;

pub use health::{health_check, not_found, readiness_check};
pub use metrics::metrics;
pub use treatment::create_treatment;
