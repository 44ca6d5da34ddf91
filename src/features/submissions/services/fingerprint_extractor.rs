use schemars::JsonSchema;
use serde::{Deserialize, Deserializer};
use std::sync::Arc;

use crate::features::submissions::fingerprint::Fingerprint;
use crate::modules::llm::{CompletionRequest, PhotoPayload, VisionModel};
use crate::shared::llm::{default_true, parse_with_fallback, LlmResponse};
use crate::shared::prompts::render_fingerprint_prompt;

/// Model calls made before giving up on a fingerprint
pub const FINGERPRINT_MAX_ATTEMPTS: usize = 2;

/// Keyword count the prompt asks for. Other counts are accepted but logged.
const EXPECTED_KEYWORDS: std::ops::RangeInclusive<usize> = 3..=5;

const USER_PROMPT: &str = "Generate the fingerprint keywords for this photo.";

pub const FINGERPRINT_UNAVAILABLE: &str =
    "Could not generate an image fingerprint, so duplicate checking was skipped.";

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct FingerprintResponse {
    /// 3 to 5 lowercase keywords describing the issue and its permanent surroundings
    #[serde(default, deserialize_with = "list_or_text")]
    pub keywords: Vec<String>,

    #[serde(default = "default_true")]
    #[schemars(skip)]
    pub is_llm_success: bool,

    #[serde(default)]
    #[schemars(skip)]
    pub llm_error_message: Option<String>,
}

crate::impl_llm_response!(FingerprintResponse);

/// Models sometimes answer `"pothole, asphalt road"` instead of an array
fn list_or_text<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Keywords {
        List(Vec<String>),
        Text(String),
    }

    Ok(match Keywords::deserialize(deserializer)? {
        Keywords::List(list) => list,
        Keywords::Text(text) => {
            let separator: &[char] = if text.contains(',') { &[','] } else { &[' ', '\t', '\n'] };
            text.split(separator).map(str::to_string).collect()
        }
    })
}

/// Outcome of fingerprinting. Extraction never fails the submission: on
/// failure the fingerprint is empty and `warning` says why.
#[derive(Debug, Clone, PartialEq)]
pub struct FingerprintOutcome {
    pub fingerprint: Fingerprint,
    pub warning: Option<String>,
}

pub struct FingerprintExtractor {
    model: Arc<dyn VisionModel>,
}

impl FingerprintExtractor {
    pub fn new(model: Arc<dyn VisionModel>) -> Self {
        Self { model }
    }

    pub async fn extract(&self, photo: &PhotoPayload) -> FingerprintOutcome {
        let system = match render_fingerprint_prompt(&FingerprintResponse::json_schema_string()) {
            Ok(system) => system,
            Err(e) => {
                tracing::error!("Failed to render fingerprint prompt: {}", e);
                return Self::unavailable();
            }
        };

        for attempt in 1..=FINGERPRINT_MAX_ATTEMPTS {
            let request = CompletionRequest::json(system.clone(), USER_PROMPT).with_photo(photo);

            let text = match self.model.complete(request).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!("Fingerprint attempt {} failed: {}", attempt, e);
                    continue;
                }
            };

            let response: FingerprintResponse = parse_with_fallback(&text);
            if !response.is_success() {
                tracing::warn!(
                    "Fingerprint attempt {} returned malformed output: {}",
                    attempt,
                    response.llm_error_message.as_deref().unwrap_or("unknown")
                );
                continue;
            }

            let fingerprint = Fingerprint::normalize(&response.keywords);
            if fingerprint.is_empty() {
                tracing::warn!("Fingerprint attempt {} returned no keywords", attempt);
                continue;
            }

            if !EXPECTED_KEYWORDS.contains(&fingerprint.len()) {
                tracing::warn!(
                    "Fingerprint has {} keywords, expected {}-{}: {:?}",
                    fingerprint.len(),
                    EXPECTED_KEYWORDS.start(),
                    EXPECTED_KEYWORDS.end(),
                    fingerprint.keywords()
                );
            }

            return FingerprintOutcome {
                fingerprint,
                warning: None,
            };
        }

        tracing::warn!(
            "No fingerprint after {} attempts; duplicate check will be skipped",
            FINGERPRINT_MAX_ATTEMPTS
        );
        Self::unavailable()
    }

    fn unavailable() -> FingerprintOutcome {
        FingerprintOutcome {
            fingerprint: Fingerprint::empty(),
            warning: Some(FINGERPRINT_UNAVAILABLE.to_string()),
        }
    }
}
