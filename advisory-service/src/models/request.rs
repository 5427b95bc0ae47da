//! Disease report submitted by a farmer.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::services::AdvisoryError;

/// Wire form of `POST /treatment`.
///
/// Every field is optional at the serde level so that a missing required
/// field is reported by validation as a 400 rather than by the JSON
/// extractor. The free-text optional fields take any JSON value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentRequest {
    #[validate(required, length(min = 1, message = "Plant name is required"))]
    pub plant_name: Option<String>,
    #[validate(required, length(min = 1, message = "Detected disease is required"))]
    pub detected_disease: Option<String>,
    #[validate(required, length(min = 1, message = "Observed symptoms are required"))]
    pub observed_symptoms: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub affected_parts: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub severity_level: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub spread_rate: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub weather_conditions: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub preferred_treatment_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub previous_disease_history: Option<String>,
}

/// Strings pass through, `null` is absent, anything else keeps its JSON
/// spelling (`3`, `true`, `["leaf","stem"]`).
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}

/// A validated request: the three required fields are present and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiseaseReport {
    pub plant_name: String,
    pub detected_disease: String,
    pub observed_symptoms: String,
    pub affected_parts: Option<String>,
    pub severity_level: Option<String>,
    pub spread_rate: Option<String>,
    pub weather_conditions: Option<String>,
    pub preferred_treatment_type: Option<String>,
    pub previous_disease_history: Option<String>,
}

impl DiseaseReport {
    /// The preferred treatment type, if it names one of the known kinds.
    pub fn treatment_type(&self) -> Option<TreatmentType> {
        self.preferred_treatment_type
            .as_deref()
            .and_then(|value| value.parse().ok())
    }
}

impl TryFrom<TreatmentRequest> for DiseaseReport {
    type Error = AdvisoryError;

    fn try_from(request: TreatmentRequest) -> Result<Self, Self::Error> {
        request
            .validate()
            .map_err(|e| AdvisoryError::InvalidRequest(e.to_string()))?;

        let (Some(plant_name), Some(detected_disease), Some(observed_symptoms)) = (
            request.plant_name,
            request.detected_disease,
            request.observed_symptoms,
        ) else {
            return Err(AdvisoryError::InvalidRequest(
                "plantName, detectedDisease and observedSymptoms are required".to_string(),
            ));
        };

        Ok(Self {
            plant_name,
            detected_disease,
            observed_symptoms,
            affected_parts: request.affected_parts,
            severity_level: request.severity_level,
            spread_rate: request.spread_rate,
            weather_conditions: request.weather_conditions,
            preferred_treatment_type: request.preferred_treatment_type,
            previous_disease_history: request.previous_disease_history,
        })
    }
}

/// Kind of treatment the farmer asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreatmentType {
    Organic,
    Chemical,
    Both,
}

impl TreatmentType {
    pub fn includes_organic(self) -> bool {
        matches!(self, TreatmentType::Organic | TreatmentType::Both)
    }

    pub fn includes_chemical(self) -> bool {
        matches!(self, TreatmentType::Chemical | TreatmentType::Both)
    }
}

impl FromStr for TreatmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Organic" => Ok(TreatmentType::Organic),
            "Chemical" => Ok(TreatmentType::Chemical),
            "Both" => Ok(TreatmentType::Both),
            other => Err(format!("unknown treatment type: {}", other)),
        }
    }
}

impl fmt::Display for TreatmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TreatmentType::Organic => "Organic",
            TreatmentType::Chemical => "Chemical",
            TreatmentType::Both => "Both",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: serde_json::Value) -> TreatmentRequest {
        serde_json::from_value(value).expect("request should deserialize")
    }

    #[test]
    fn accepts_complete_request() {
        let report = DiseaseReport::try_from(request(json!({
            "plantName": "Tomato",
            "detectedDisease": "Early Blight",
            "observedSymptoms": "Brown rings on lower leaves",
            "severityLevel": "Moderate",
            "preferredTreatmentType": "Organic"
        })))
        .unwrap();

        assert_eq!(report.plant_name, "Tomato");
        assert_eq!(report.severity_level.as_deref(), Some("Moderate"));
        assert_eq!(report.treatment_type(), Some(TreatmentType::Organic));
    }

    #[test]
    fn optional_fields_accept_non_string_values() {
        let request = request(json!({
            "plantName": "Maize",
            "detectedDisease": "Rust",
            "observedSymptoms": "Orange pustules",
            "severityLevel": 3,
            "spreadRate": null,
            "weatherConditions": false,
            "affectedParts": ["leaf", "stem"],
            "preferredTreatmentType": 1
        }));

        assert_eq!(request.severity_level.as_deref(), Some("3"));
        assert_eq!(request.spread_rate, None);
        assert_eq!(request.weather_conditions.as_deref(), Some("false"));
        assert_eq!(request.affected_parts.as_deref(), Some(r#"["leaf","stem"]"#));

        let report = DiseaseReport::try_from(request).unwrap();
        assert_eq!(report.treatment_type(), None);
    }

    #[test]
    fn rejects_missing_required_field() {
        let result = DiseaseReport::try_from(request(json!({
            "plantName": "Tomato",
            "detectedDisease": "Early Blight"
        })));

        assert!(matches!(result, Err(AdvisoryError::InvalidRequest(_))));
    }

    #[test]
    fn rejects_empty_required_field() {
        let result = DiseaseReport::try_from(request(json!({
            "plantName": "",
            "detectedDisease": "Early Blight",
            "observedSymptoms": "Spots"
        })));

        assert!(matches!(result, Err(AdvisoryError::InvalidRequest(_))));
    }

    #[test]
    fn rejects_null_required_field() {
        let result = DiseaseReport::try_from(request(json!({
            "plantName": "Tomato",
            "detectedDisease": null,
            "observedSymptoms": "Spots"
        })));

        assert!(matches!(result, Err(AdvisoryError::InvalidRequest(_))));
    }

    #[test]
    fn unknown_treatment_type_is_treated_as_unset() {
        let report = DiseaseReport::try_from(request(json!({
            "plantName": "Rice",
            "detectedDisease": "Blast",
            "observedSymptoms": "Diamond lesions",
            "preferredTreatmentType": "organic"
        })))
        .unwrap();

        assert_eq!(report.treatment_type(), None);
    }

    #[test]
    fn treatment_type_coverage() {
        assert!(TreatmentType::Organic.includes_organic());
        assert!(!TreatmentType::Organic.includes_chemical());
        assert!(TreatmentType::Both.includes_organic());
        assert!(TreatmentType::Both.includes_chemical());
        assert!(!TreatmentType::Chemical.includes_organic());
    }
}
