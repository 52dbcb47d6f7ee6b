//! Anthropic Messages API backend

use crate::client::{ApiError, Backend, CompletionRequest, FailureKind};
use std::time::Duration;

pub const MESSAGES_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicBackend {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl AnthropicBackend {
    pub fn new(api_key: &str, model: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            model: model.to_string(),
            endpoint: MESSAGES_ENDPOINT.to_string(),
        })
    }

    /// Point at a different Messages-compatible endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl Backend for AnthropicBackend {
    async fn send(&self, request: &CompletionRequest<'_>) -> Result<String, ApiError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&build_body(&self.model, request))
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::new(
                FailureKind::from_status(status.as_u16()),
                error_message(&body),
            ));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ApiError::new(FailureKind::InvalidResponse, e.to_string()))?;

        response_text(&body).ok_or_else(|| {
            ApiError::new(
                FailureKind::InvalidResponse,
                "response contained no text content block",
            )
        })
    }
}

fn build_body(model: &str, request: &CompletionRequest<'_>) -> serde_json::Value {
    serde_json::json!({
        "model": model,
        "max_tokens": request.max_tokens,
        "system": request.system,
        "messages": [{"role": "user", "content": request.user}]
    })
}

fn classify_transport_error(err: reqwest::Error) -> ApiError {
    let kind = if err.is_timeout() {
        FailureKind::Timeout
    } else if let Some(status) = err.status() {
        FailureKind::from_status(status.as_u16())
    } else if err.is_connect() || err.is_request() {
        FailureKind::Connection
    } else {
        FailureKind::InvalidResponse
    };
    ApiError::new(kind, err.to_string())
}

/// First text block of a Messages response, trimmed
fn response_text(body: &serde_json::Value) -> Option<String> {
    body["content"]
        .as_array()?
        .iter()
        .find(|block| block["type"].as_str().unwrap_or("text") == "text")
        .and_then(|block| block["text"].as_str())
        .map(|text| text.trim().to_string())
}

/// Human-readable message from an error body, falling back to the raw body
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                "empty error body".to_string()
            } else {
                body.trim().to_string()
            }
        })
}
