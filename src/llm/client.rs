//! OpenAI-compatible chat-completions client
//!
//! Speaks the plain chat-completions JSON protocol over reqwest so any
//! compatible endpoint works. Transient failures (429, 5xx, timeouts) go
//! through the shared retry policy; schema and auth failures do not.

use crate::config::ModelConfig;
use crate::llm::{ModelClient, ModelRequest, ModelResponse};
use crate::retry::RetryPolicy;
use crate::ModelError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Chat-completions client for an OpenAI-compatible endpoint
pub struct ChatModelClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    default_model: String,
    request_timeout: Duration,
    retry: RetryPolicy,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    model: Option<String>,
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl ChatModelClient {
    pub fn new(config: &ModelConfig, api_key: String, retry: RetryPolicy) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            default_model: config.model_name.clone(),
            request_timeout: Duration::from_millis(config.request_timeout_ms),
            retry,
        })
    }

    /// Reads the API key from the environment variable named in the config
    pub fn from_env(config: &ModelConfig, retry: RetryPolicy) -> Result<Self, reqwest::Error> {
        let api_key = std::env::var(&config.api_key_env).unwrap_or_default();
        Self::new(config, api_key, retry)
    }

    fn build_user_content(request: &ModelRequest) -> String {
        if request.image_refs.is_empty() {
            return request.input.clone();
        }

        let refs: Vec<String> = request
            .image_refs
            .iter()
            .enumerate()
            .map(|(i, r)| format!("  Screenshot {}: {}", i + 1, r))
            .collect();

        format!("{}\n\nScreenshot references:\n{}", request.input, refs.join("\n"))
    }

    async fn send_once(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError> {
        let model = request
            .model_override
            .as_deref()
            .unwrap_or(&self.default_model);

        let body = json!({
            "model": model,
            "messages": [
                { "role": "system", "content": request.instructions },
                { "role": "user", "content": Self::build_user_content(request) },
            ],
            "temperature": 0.2,
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ModelError::Timeout(self.request_timeout.as_millis() as u64)
                } else {
                    ModelError::Request(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Schema(e.to_string()))?;

        let content = completion
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(ModelError::Empty)?;

        Ok(ModelResponse {
            content,
            model_id: completion.model.unwrap_or_else(|| model.to_string()),
        })
    }
}

/// Whether a model error is worth another attempt
fn is_transient(error: &ModelError) -> bool {
    match error {
        ModelError::Timeout(_) => true,
        ModelError::Api { status, .. } => *status == 429 || *status >= 500,
        ModelError::Request(e) => e.is_timeout() || e.is_connect(),
        ModelError::Schema(_) | ModelError::Empty => false,
    }
}

#[async_trait]
impl ModelClient for ChatModelClient {
    async fn complete(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        self.retry
            .run(|| self.send_once(&request), is_transient)
            .await
    }
}
