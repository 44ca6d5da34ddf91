use schemars::JsonSchema;
use serde::{Deserialize, Deserializer};
use std::sync::Arc;

use crate::features::reports::models::ReportSeverity;
use crate::modules::geocoding::ReverseGeocoder;
use crate::modules::llm::{CompletionRequest, PhotoPayload, VisionModel};
use crate::shared::llm::{default_true, parse_with_fallback, LlmResponse};
use crate::shared::prompts::{render_issue_analysis_prompt, render_location_prompt};

const ANALYSIS_USER_PROMPT: &str = "Analyze this civic issue photo.";
const LOCATION_USER_PROMPT: &str = "Name the location shown in this photo.";

pub const ANALYSIS_UNAVAILABLE: &str =
    "Automatic analysis failed. Please fill in the issue details manually.";

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct IssueAnalysisResponse {
    /// Short name of the problem, e.g. "Pothole"
    #[serde(default)]
    pub issue_type: String,

    /// low, medium or high
    #[serde(default, deserialize_with = "lenient_severity")]
    pub severity: Option<ReportSeverity>,

    /// Two or three sentences describing the issue
    #[serde(default)]
    pub description: String,

    #[serde(default = "default_true")]
    #[schemars(skip)]
    pub is_llm_success: bool,

    #[serde(default)]
    #[schemars(skip)]
    pub llm_error_message: Option<String>,
}

crate::impl_llm_response!(IssueAnalysisResponse);

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct LocationResponse {
    /// Short human-readable location name
    #[serde(default)]
    pub location_name: String,

    #[serde(default = "default_true")]
    #[schemars(skip)]
    pub is_llm_success: bool,

    #[serde(default)]
    #[schemars(skip)]
    pub llm_error_message: Option<String>,
}

crate::impl_llm_response!(LocationResponse);

/// Unknown severities ("critical", "") become `None` instead of failing the whole response
fn lenient_severity<'de, D>(deserializer: D) -> Result<Option<ReportSeverity>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| match s.trim().to_lowercase().as_str() {
        "low" => Some(ReportSeverity::Low),
        "medium" | "moderate" => Some(ReportSeverity::Medium),
        "high" => Some(ReportSeverity::High),
        _ => None,
    }))
}

/// Issue fields suggested for a draft
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IssueAnalysis {
    pub issue_type: String,
    pub severity: Option<ReportSeverity>,
    pub description: String,
    /// Set when the model gave no usable analysis
    pub error: Option<String>,
}

impl IssueAnalysis {
    fn unavailable() -> Self {
        Self {
            error: Some(ANALYSIS_UNAVAILABLE.to_string()),
            ..Default::default()
        }
    }
}

/// Suggests issue details and a location name for a photo
pub struct IssueAnalyzer {
    model: Arc<dyn VisionModel>,
    geocoder: Option<Arc<dyn ReverseGeocoder>>,
}

impl IssueAnalyzer {
    pub fn new(model: Arc<dyn VisionModel>, geocoder: Option<Arc<dyn ReverseGeocoder>>) -> Self {
        Self { model, geocoder }
    }

    pub async fn analyze(&self, photo: &PhotoPayload, latitude: f64, longitude: f64) -> IssueAnalysis {
        let schema = IssueAnalysisResponse::json_schema_string();
        let system = match render_issue_analysis_prompt(latitude, longitude, &schema) {
            Ok(system) => system,
            Err(e) => {
                tracing::error!("Failed to render analysis prompt: {}", e);
                return IssueAnalysis::unavailable();
            }
        };

        let request = CompletionRequest::json(system, ANALYSIS_USER_PROMPT).with_photo(photo);
        let text = match self.model.complete(request).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Issue analysis failed: {}", e);
                return IssueAnalysis::unavailable();
            }
        };

        let response: IssueAnalysisResponse = parse_with_fallback(&text);
        let issue_type = response.issue_type.trim().to_string();
        if !response.is_success() || issue_type.is_empty() {
            tracing::warn!(
                "Issue analysis returned no usable result: {}",
                response
                    .llm_error_message
                    .as_deref()
                    .unwrap_or("missing issue_type")
            );
            return IssueAnalysis::unavailable();
        }

        IssueAnalysis {
            issue_type,
            severity: response.severity,
            description: response.description.trim().to_string(),
            error: None,
        }
    }

    /// Reverse geocoding first, then the model. `None` when neither names the place.
    pub async fn name_location(
        &self,
        photo: &PhotoPayload,
        latitude: f64,
        longitude: f64,
    ) -> Option<String> {
        if let Some(geocoder) = &self.geocoder {
            match geocoder.reverse(latitude, longitude).await {
                Ok(Some(name)) => return Some(name),
                Ok(None) => tracing::debug!("No geocoding result for {}, {}", latitude, longitude),
                Err(e) => tracing::warn!("Reverse geocoding failed, asking the model: {}", e),
            }
        }

        let schema = LocationResponse::json_schema_string();
        let system = render_location_prompt(latitude, longitude, &schema)
            .map_err(|e| tracing::error!("Failed to render location prompt: {}", e))
            .ok()?;

        let request = CompletionRequest::json(system, LOCATION_USER_PROMPT).with_photo(photo);
        let text = self
            .model
            .complete(request)
            .await
            .map_err(|e| tracing::warn!("Location naming failed: {}", e))
            .ok()?;

        let response: LocationResponse = parse_with_fallback(&text);
        let name = response.location_name.trim();
        (response.is_success() && !name.is_empty()).then(|| name.to_string())
    }
}
