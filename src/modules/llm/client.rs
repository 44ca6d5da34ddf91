use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use super::types::{
    ChatMessage, ChatRequest, ChatResponse, ContentPart, ImageUrl, MessageContent, ResponseFormat,
};
use super::{CompletionRequest, LlmError, VisionModel};
use crate::core::config::LlmConfig;

/// Client for OpenAI-compatible `/chat/completions` endpoints with image input
pub struct OpenAiVisionClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl OpenAiVisionClient {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                .map_err(|e| LlmError::Client(format!("Invalid API key header: {}", e)))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Client(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, request: CompletionRequest) -> ChatRequest {
        let user_content = match request.photo {
            Some(photo) => MessageContent::Parts(vec![
                ContentPart::Text {
                    text: request.prompt,
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: photo.data_uri().to_string(),
                    },
                },
            ]),
            None => MessageContent::Text(request.prompt),
        };

        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: MessageContent::Text(request.system),
                },
                ChatMessage {
                    role: "user",
                    content: user_content,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: 0.2,
            response_format: request.json_output.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        }
    }
}

#[async_trait]
impl VisionModel for OpenAiVisionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let has_photo = request.photo.is_some();
        let body = self.build_request(request);

        tracing::debug!(model = %self.model, has_photo, "LLM chat completion request");

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("LLM API returned {}: {}", status, body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Request(format!("Invalid completion payload: {}", e)))?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)
    }
}
