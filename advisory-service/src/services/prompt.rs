//! Prompt sent to the external model.

use crate::models::DiseaseReport;

/// System instruction attached to every Gemini call.
pub const SYSTEM_INSTRUCTION: &str = "Generate AI-based treatment recommendations for plant diseases in JSON format. Use simple and clear English.";

const NOT_SPECIFIED: &str = "Not specified";

/// Render the farmer's report into an instruction that asks for a bare JSON
/// object in the treatment plan shape.
pub fn render_prompt(report: &DiseaseReport) -> String {
    let optional = |value: &Option<String>| value.as_deref().unwrap_or(NOT_SPECIFIED).to_string();

    format!(
        r#"Based on the following input from a farmer, provide treatment recommendations strictly in JSON format. Ensure the output is always valid JSON without any extra text or markdown formatting.

**Input Details:**
- **Plant Name:** {plant}
- **Detected Disease:** {disease}
- **Observed Symptoms:** {symptoms}
- **Affected Parts:** {parts}
- **Severity Level:** {severity}
- **Spread Rate:** {spread}
- **Weather Conditions:** {weather}
- **Preferred Treatment Type:** {treatment}
- **Previous Disease History:** {history}

**Expected JSON Output Format:**
{{
  "disease_explanation": "<Brief explanation of the disease>",
  "treatment_recommendations": {{
    "organic": "<Organic treatment options (if applicable)>",
    "chemical": "<Chemical treatment options (if applicable)>",
    "both": "<Both organic and chemical treatment options>"
  }},
  "preventive_measures": "<Preventive measures to avoid future outbreaks>",
  "best_recovery_practices": "<Best practices for plant recovery>",
  "expert_advice": "<Any additional expert advice>"
}}
"#,
        plant = report.plant_name,
        disease = report.detected_disease,
        symptoms = report.observed_symptoms,
        parts = optional(&report.affected_parts),
        severity = optional(&report.severity_level),
        spread = optional(&report.spread_rate),
        weather = optional(&report.weather_conditions),
        treatment = optional(&report.preferred_treatment_type),
        history = optional(&report.previous_disease_history),
    )
}
