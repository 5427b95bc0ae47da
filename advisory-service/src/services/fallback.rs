//! Deterministic, network-free treatment plan.

use crate::models::{TreatmentPlan, TreatmentRecommendations, TreatmentType};

const ORGANIC_TREATMENT: &str = "Apply neem oil spray (5ml per liter of water) weekly. Use compost tea to boost plant immunity. Remove and destroy infected plant parts.";

const CHEMICAL_TREATMENT: &str = "Apply appropriate fungicide or pesticide as per label instructions. Ensure proper dosage and safety measures. Repeat application as recommended.";

const COMBINED_TREATMENT: &str = "Combine organic methods (neem oil, compost tea) with targeted chemical treatments for severe cases. Start with organic methods and use chemicals only if necessary.";

const PREVENTIVE_MEASURES: &str = "Maintain proper plant spacing for air circulation. Water at the base to keep foliage dry. Remove infected plant debris. Practice crop rotation. Use disease-resistant varieties when possible.";

const RECOVERY_PRACTICES: &str = "Ensure adequate nutrition with balanced fertilizer. Maintain consistent watering schedule. Prune affected areas. Monitor plants regularly for early detection. Improve soil drainage if needed.";

const EXPERT_ADVICE: &str = "Note: This is a general recommendation. For accurate diagnosis and treatment, please consult with a local agricultural extension officer or plant pathologist. Consider getting a soil test and ensure proper plant nutrition for better disease resistance.";

/// Build the generic plan for `detected_disease` on `plant_name`.
///
/// Only the recommendation slots selected by `preferred` are filled:
/// organic for `Organic`/`Both`, chemical for `Chemical`/`Both`, and the
/// combined text for `Both` alone.
pub fn fallback_plan(
    plant_name: &str,
    detected_disease: &str,
    preferred: Option<TreatmentType>,
) -> TreatmentPlan {
    let organic = preferred.is_some_and(TreatmentType::includes_organic);
    let chemical = preferred.is_some_and(TreatmentType::includes_chemical);
    let both = preferred == Some(TreatmentType::Both);

    TreatmentPlan {
        disease_explanation: format!(
            "{} is a common plant disease affecting {}. It typically causes damage to plant tissues and can spread if not treated promptly.",
            detected_disease, plant_name
        ),
        treatment_recommendations: TreatmentRecommendations {
            organic: organic.then(|| ORGANIC_TREATMENT.to_string()),
            chemical: chemical.then(|| CHEMICAL_TREATMENT.to_string()),
            both: both.then(|| COMBINED_TREATMENT.to_string()),
        },
        preventive_measures: PREVENTIVE_MEASURES.to_string(),
        best_recovery_practices: RECOVERY_PRACTICES.to_string(),
        expert_advice: EXPERT_ADVICE.to_string(),
    }
}
