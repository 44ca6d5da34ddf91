//! Vision-capable language model access.
//!
//! Features depend on the [`VisionModel`] trait; production uses
//! [`OpenAiVisionClient`] against any OpenAI-compatible chat completions API.

mod client;
mod types;

pub use client::OpenAiVisionClient;

use async_trait::async_trait;
use base64::prelude::*;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM client error: {0}")]
    Client(String),

    #[error("LLM request failed: {0}")]
    Request(String),

    #[error("LLM request timed out")]
    Timeout,

    #[error("LLM API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("LLM returned no content")]
    EmptyResponse,
}

/// Photo attached to a completion, pre-encoded as a data URI so concurrent
/// calls over the same image share one encoding
#[derive(Debug, Clone)]
pub struct PhotoPayload {
    mime_type: String,
    data_uri: Arc<str>,
}

impl PhotoPayload {
    pub fn new(mime_type: &str, bytes: &[u8]) -> Self {
        let data_uri = format!("data:{};base64,{}", mime_type, BASE64_STANDARD.encode(bytes));
        Self {
            mime_type: mime_type.to_string(),
            data_uri: Arc::from(data_uri),
        }
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub photo: Option<PhotoPayload>,
    /// Ask the provider to constrain output to a JSON object
    pub json_output: bool,
}

impl CompletionRequest {
    pub fn json(system: String, prompt: impl Into<String>) -> Self {
        Self {
            system,
            prompt: prompt.into(),
            photo: None,
            json_output: true,
        }
    }

    pub fn with_photo(mut self, photo: &PhotoPayload) -> Self {
        self.photo = Some(photo.clone());
        self
    }
}

#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Run one completion and return the raw assistant text
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;
}
