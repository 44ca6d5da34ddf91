use schemars::gen::SchemaGenerator;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;

/// Structured model output that can degrade to a default value.
///
/// When parsing fails the parser builds `Self::default()` and calls
/// `mark_as_fallback`, so callers always receive a value and decide
/// from `is_success` whether to trust it.
pub trait LlmResponse: DeserializeOwned + Default + JsonSchema {
    fn mark_as_fallback(&mut self, error_message: String);

    fn is_success(&self) -> bool;

    /// JSON schema of the response, embedded in prompts
    fn json_schema_string() -> String {
        let mut gen = SchemaGenerator::default();
        let schema = gen.root_schema_for::<Self>();
        serde_json::to_string_pretty(&schema).unwrap_or_else(|_| "{}".to_string())
    }
}

/// serde default for the `is_llm_success` flag
pub fn default_true() -> bool {
    true
}

/// Implement [`LlmResponse`] for a struct carrying the conventional
/// `is_llm_success` / `llm_error_message` fields.
#[macro_export]
macro_rules! impl_llm_response {
    ($ty:ty) => {
        impl $crate::shared::llm::LlmResponse for $ty {
            fn mark_as_fallback(&mut self, error_message: String) {
                self.is_llm_success = false;
                self.llm_error_message = Some(error_message);
            }

            fn is_success(&self) -> bool {
                self.is_llm_success
            }
        }
    };
}
