//! Treatment plan returned to the caller.

use serde::{Deserialize, Serialize};

/// Advisory payload under the `treatment` key of a `/treatment` response.
///
/// Recommendation slots that do not apply are serialized as explicit `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreatmentPlan {
    pub disease_explanation: String,
    pub treatment_recommendations: TreatmentRecommendations,
    pub preventive_measures: String,
    pub best_recovery_practices: String,
    pub expert_advice: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreatmentRecommendations {
    pub organic: Option<String>,
    pub chemical: Option<String>,
    pub both: Option<String>,
}
