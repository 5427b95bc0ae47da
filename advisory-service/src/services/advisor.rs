//! Treatment advisory flow: external model first, deterministic plan always.

use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::error::AdvisoryError;
use super::fallback::fallback_plan;
use super::metrics;
use super::prompt::render_prompt;
use super::providers::{GenerationParams, ProviderError, TextProvider};
use crate::models::{DiseaseReport, TreatmentRequest};

/// Default bound on a single external call.
pub const DEFAULT_EXTERNAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Where a served plan came from. Not part of the wire contract.
#[derive(Debug)]
pub enum PlanSource {
    External,
    Fallback { reason: AdvisoryError },
}

impl PlanSource {
    pub fn label(&self) -> &'static str {
        match self {
            PlanSource::External => "external",
            PlanSource::Fallback { .. } => "fallback",
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, PlanSource::Fallback { .. })
    }
}

/// A plan ready to be sent under the `treatment` key.
#[derive(Debug)]
pub struct Advice {
    pub treatment: Value,
    pub source: PlanSource,
}

/// Answers treatment requests.
///
/// Built once at startup. With no provider it runs in fallback-only mode for
/// its whole lifetime and never touches the network.
#[derive(Clone)]
pub struct TreatmentAdvisor {
    provider: Option<Arc<dyn TextProvider>>,
    external_timeout: Duration,
}

impl TreatmentAdvisor {
    pub fn new(provider: Option<Arc<dyn TextProvider>>, external_timeout: Duration) -> Self {
        Self {
            provider,
            external_timeout,
        }
    }

    /// An advisor that only ever serves the deterministic plan.
    pub fn fallback_only() -> Self {
        Self::new(None, DEFAULT_EXTERNAL_TIMEOUT)
    }

    pub fn external_enabled(&self) -> bool {
        self.provider.is_some()
    }

    pub fn external_timeout(&self) -> Duration {
        self.external_timeout
    }

    /// Validate `request` and produce a plan.
    ///
    /// Any failure on the external path is absorbed into
    /// [`PlanSource::Fallback`]; only validation and fallback construction
    /// errors are returned.
    pub async fn advise(&self, request: TreatmentRequest) -> Result<Advice, AdvisoryError> {
        let report = DiseaseReport::try_from(request)?;

        let outcome = match &self.provider {
            Some(provider) => self.consult(provider.as_ref(), &report).await,
            None => Err(AdvisoryError::ExternalServiceUnavailable),
        };

        match outcome {
            Ok(treatment) => {
                metrics::record_advice("external", "none");
                tracing::info!(
                    plant = %report.plant_name,
                    disease = %report.detected_disease,
                    source = "external",
                    "Treatment plan generated"
                );
                Ok(Advice {
                    treatment,
                    source: PlanSource::External,
                })
            }
            Err(reason) => {
                if matches!(reason, AdvisoryError::ExternalServiceUnavailable) {
                    tracing::debug!("Using fallback treatment response (API key not configured)");
                } else {
                    tracing::warn!(
                        reason = reason.kind(),
                        error = %reason,
                        "External generation failed, using fallback"
                    );
                }

                let treatment = fallback_value(&report).map_err(|e| {
                    tracing::error!(error = %e, "Failed to build fallback treatment plan");
                    e
                })?;

                metrics::record_advice("fallback", reason.kind());
                tracing::info!(
                    plant = %report.plant_name,
                    disease = %report.detected_disease,
                    source = "fallback",
                    "Treatment plan generated"
                );
                Ok(Advice {
                    treatment,
                    source: PlanSource::Fallback { reason },
                })
            }
        }
    }

    async fn consult(
        &self,
        provider: &dyn TextProvider,
        report: &DiseaseReport,
    ) -> Result<Value, AdvisoryError> {
        let prompt = render_prompt(report);
        let params = GenerationParams { json_output: true };

        let started = Instant::now();
        let result = tokio::time::timeout(self.external_timeout, provider.generate(&prompt, &params))
            .await
            .unwrap_or(Err(ProviderError::Timeout(self.external_timeout)));
        metrics::record_provider_latency(
            provider.name(),
            provider.model(),
            started.elapsed().as_secs_f64(),
        );

        let response = result.inspect_err(|e| {
            metrics::record_provider_error(provider.name(), e.kind());
        })?;
        metrics::record_tokens(provider.model(), response.input_tokens, response.output_tokens);

        let raw = response.text.ok_or_else(|| {
            AdvisoryError::ResponseUnparseable("response contained no text".to_string())
        })?;
        tracing::debug!(
            raw_response = %raw,
            finish_reason = response.finish_reason.as_str(),
            "Raw AI response"
        );

        parse_plan(&raw)
    }
}

fn fallback_value(report: &DiseaseReport) -> Result<Value, AdvisoryError> {
    let plan = fallback_plan(
        &report.plant_name,
        &report.detected_disease,
        report.treatment_type(),
    );
    serde_json::to_value(plan).map_err(AdvisoryError::FallbackConstructionFailed)
}

/// Remove every ```` ```json ```` and ```` ``` ```` marker and surrounding
/// whitespace. Deliberately textual: fences in the middle are dropped too.
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

/// Decode model output into a JSON object, tolerating markdown fences.
///
/// Valid JSON that is not an object (an array, a bare string) is rejected
/// on purpose so that `treatment` is always plan-shaped; the caller then
/// serves the fallback instead. Key order is kept as the model wrote it.
pub fn parse_plan(raw: &str) -> Result<Value, AdvisoryError> {
    let cleaned = strip_code_fences(raw);
    let value: Value = serde_json::from_str(&cleaned)
        .map_err(|e| AdvisoryError::ResponseUnparseable(e.to_string()))?;

    if !value.is_object() {
        return Err(AdvisoryError::ResponseUnparseable(
            "expected a JSON object".to_string(),
        ));
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::mock::{MockFailure, MockTextProvider};
    use serde_json::json;

    fn request(treatment_type: Option<&str>) -> TreatmentRequest {
        TreatmentRequest {
            plant_name: Some("Tomato".to_string()),
            detected_disease: Some("Late Blight".to_string()),
            observed_symptoms: Some("Dark water-soaked lesions".to_string()),
            preferred_treatment_type: treatment_type.map(str::to_string),
            ..Default::default()
        }
    }

    fn advisor_with(mock: &Arc<MockTextProvider>) -> TreatmentAdvisor {
        let provider: Arc<dyn TextProvider> = mock.clone();
        TreatmentAdvisor::new(Some(provider), Duration::from_millis(200))
    }

    fn model_plan() -> Value {
        json!({
            "disease_explanation": "Late blight is caused by Phytophthora infestans.",
            "treatment_recommendations": {
                "organic": "Copper soap spray.",
                "chemical": null,
                "both": null
            },
            "preventive_measures": "Avoid overhead watering.",
            "best_recovery_practices": "Remove infected foliage.",
            "expert_advice": "Scout daily during wet weather."
        })
    }

    #[test]
    fn strips_json_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  ```{}```  "), "{}");
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn parse_plan_rejects_prose_and_non_objects() {
        assert!(matches!(
            parse_plan("Here is your plan: apply neem oil"),
            Err(AdvisoryError::ResponseUnparseable(_))
        ));
        assert!(matches!(
            parse_plan("```json\n[1, 2]\n```"),
            Err(AdvisoryError::ResponseUnparseable(_))
        ));
    }

    #[tokio::test]
    async fn fallback_only_mode_never_consults_a_provider() {
        let advisor = TreatmentAdvisor::fallback_only();
        assert!(!advisor.external_enabled());

        let advice = advisor.advise(request(Some("Organic"))).await.unwrap();
        assert!(matches!(
            advice.source,
            PlanSource::Fallback {
                reason: AdvisoryError::ExternalServiceUnavailable
            }
        ));
        assert_eq!(
            advice.treatment,
            serde_json::to_value(fallback_plan(
                "Tomato",
                "Late Blight",
                Some(crate::models::TreatmentType::Organic)
            ))
            .unwrap()
        );
    }

    #[tokio::test]
    async fn invalid_request_is_rejected_before_the_provider() {
        let mock = Arc::new(MockTextProvider::replying(model_plan().to_string()));
        let advisor = advisor_with(&mock);

        let mut bad = request(None);
        bad.observed_symptoms = None;

        let result = advisor.advise(bad).await;
        assert!(matches!(result, Err(AdvisoryError::InvalidRequest(_))));
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn fenced_model_output_is_returned_verbatim() {
        let fenced = format!("```json\n{}\n```", model_plan());
        let mock = Arc::new(MockTextProvider::replying(fenced));
        let advisor = advisor_with(&mock);

        let advice = advisor.advise(request(Some("Organic"))).await.unwrap();
        assert_eq!(advice.source.label(), "external");
        assert_eq!(advice.treatment, model_plan());
        assert_eq!(mock.calls(), 1);
        assert!(mock.prompts()[0].contains("- **Plant Name:** Tomato"));
    }

    #[tokio::test]
    async fn provider_failure_falls_back() {
        let mock = Arc::new(MockTextProvider::failing(MockFailure::RateLimited));
        let advisor = advisor_with(&mock);

        let advice = advisor.advise(request(Some("Chemical"))).await.unwrap();
        assert!(matches!(
            advice.source,
            PlanSource::Fallback {
                reason: AdvisoryError::ExternalCallFailed(ProviderError::RateLimited)
            }
        ));
        assert!(advice.treatment["treatment_recommendations"]["chemical"].is_string());
        assert!(advice.treatment["treatment_recommendations"]["organic"].is_null());
    }

    #[tokio::test]
    async fn unparseable_output_falls_back() {
        let mock = Arc::new(MockTextProvider::replying("Sorry, I cannot help with that."));
        let advisor = advisor_with(&mock);

        let advice = advisor.advise(request(None)).await.unwrap();
        assert!(matches!(
            advice.source,
            PlanSource::Fallback {
                reason: AdvisoryError::ResponseUnparseable(_)
            }
        ));
    }

    #[tokio::test]
    async fn empty_output_falls_back() {
        let mock = Arc::new(MockTextProvider::empty());
        let advisor = advisor_with(&mock);

        let advice = advisor.advise(request(None)).await.unwrap();
        assert!(advice.source.is_fallback());
    }

    #[tokio::test]
    async fn hanging_provider_times_out_into_fallback() {
        let mock = Arc::new(MockTextProvider::hanging());
        let advisor = advisor_with(&mock);

        let advice = advisor.advise(request(Some("Both"))).await.unwrap();
        assert!(matches!(
            advice.source,
            PlanSource::Fallback {
                reason: AdvisoryError::ExternalCallFailed(ProviderError::Timeout(_))
            }
        ));
        assert!(advice.treatment["treatment_recommendations"]["both"].is_string());
    }
}
