//! Model invocation.
//!
//! One outbound request per pipeline invocation, bounded timeout, typed
//! failures, no retries. Retry policy against a paid generative endpoint
//! is an explicit caller decision, so none lives here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::error::AppError;

/// Abstraction over the generative endpoint. The HTTP implementation is
/// the only production one; tests substitute canned providers.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Send one composed prompt and return the raw model text.
    async fn complete(&self, prompt: &str) -> Result<String, AppError>;
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

// =============================================================================
// HTTP provider
// =============================================================================

const MODEL_TEMPERATURE: f32 = 0.2;

/// Provider for OpenAI-compatible chat-completion endpoints.
pub struct OpenAiProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiProvider {
    pub fn new(config: &AppConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.model_timeout)
            .build()
            .expect("failed to build reqwest client");

        Self {
            http,
            base_url: config.model_base_url.clone(),
            api_key: config.model_api_key.clone(),
            model: config.model_name.clone(),
        }
    }
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    async fn complete(&self, prompt: &str) -> Result<String, AppError> {
        // Credential check comes before any network activity.
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AppError::Config("MODEL_API_KEY is not set".to_string())
        })?;

        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: MODEL_TEMPERATURE,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(
                status = status.as_u16(),
                "model endpoint returned non-success: {}",
                detail.chars().take(200).collect::<String>()
            );
            return Err(AppError::Upstream(status.as_u16()));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::Transport(e.to_string()))?;

        // An empty reply flows into the parse-repair stage downstream.
        Ok(parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default())
    }
}
