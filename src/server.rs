//! HTTP boundary for the extraction pipeline.
//!
//! Two POST endpoints expose the core; everything else (UI, persistence,
//! auth) lives in other services. Handlers are stateless: shared state is
//! read-only and the pipeline holds nothing across requests.

use std::sync::Arc;

use axum::extract::State as AxumState;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use ts_rs::TS;

use crate::config::AppConfig;
use crate::engine::pipeline;
use crate::engine::provider::ModelProvider;
use crate::engine::types::{ConversationTurn, ExtractionRequest, ExtractionResponse};
use crate::error::AppError;
use crate::product::ContextClient;
use crate::validation::require_non_empty;

/// Shared state for the assist HTTP server.
pub struct AppState {
    pub provider: Arc<dyn ModelProvider>,
    pub context_client: ContextClient,
}

impl AppState {
    pub fn new(config: &AppConfig, provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            provider,
            context_client: ContextClient::new(config.context_api_url.clone()),
        }
    }
}

// =============================================================================
// Request/response bodies
// =============================================================================

#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ChatAssistBody {
    pub message: String,
    #[serde(default)]
    pub conversation_history: Vec<ConversationTurn>,
    #[serde(default)]
    pub product_id: Option<String>,
}

#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct FormAssistBody {
    pub prompt: String,
    pub form_type: String,
    #[serde(default)]
    #[ts(type = "Record<string, unknown> | null")]
    pub context: Option<Map<String, Value>>,
    #[serde(default)]
    #[ts(type = "Record<string, unknown> | null")]
    pub field_options: Option<Map<String, Value>>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub product_id: Option<String>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct FormAssistResponse {
    #[ts(type = "Record<string, unknown>")]
    pub data: Map<String, Value>,
}

// =============================================================================
// Router / server
// =============================================================================

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/assistant/chat", post(chat_assist))
        .route("/api/assistant/form", post(form_assist))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the assist HTTP server.
///
/// Runs until the shutdown channel flips, then drains gracefully.
pub async fn serve(
    config: &AppConfig,
    state: Arc<AppState>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Assist server listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
            tracing::info!("Assist server shutting down");
        })
        .await?;

    Ok(())
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint.
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok", "service": "pm-copilot" }))
}

/// POST /api/assistant/chat — multi-entity extraction from a chat message.
async fn chat_assist(
    AxumState(state): AxumState<Arc<AppState>>,
    Json(body): Json<ChatAssistBody>,
) -> Result<Json<ExtractionResponse>, AppError> {
    require_non_empty("message", &body.message)?;

    let request = ExtractionRequest {
        raw_text: body.message,
        conversation_history: body.conversation_history,
        target_form_type: None,
        section: None,
        product_id: body.product_id,
    };

    let response =
        pipeline::run_chat(state.provider.as_ref(), &state.context_client, request).await?;
    Ok(Json(response))
}

/// POST /api/assistant/form — fill a single form of a known type.
async fn form_assist(
    AxumState(state): AxumState<Arc<AppState>>,
    Json(body): Json<FormAssistBody>,
) -> Result<Json<FormAssistResponse>, AppError> {
    require_non_empty("prompt", &body.prompt)?;
    require_non_empty("formType", &body.form_type)?;

    let request = ExtractionRequest {
        raw_text: body.prompt,
        conversation_history: Vec::new(),
        target_form_type: Some(body.form_type),
        section: body.section,
        product_id: body.product_id,
    };

    let data = pipeline::run_form(
        state.provider.as_ref(),
        &state.context_client,
        request,
        body.field_options.as_ref(),
        body.context.as_ref(),
    )
    .await?;

    Ok(Json(FormAssistResponse { data }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_body_deserializes_with_defaults() {
        let body: ChatAssistBody =
            serde_json::from_str(r#"{"message": "add a task"}"#).unwrap();
        assert_eq!(body.message, "add a task");
        assert!(body.conversation_history.is_empty());
        assert!(body.product_id.is_none());
    }

    #[test]
    fn test_form_body_deserializes_camel_case() {
        let body: FormAssistBody = serde_json::from_str(
            r#"{"prompt": "a cost", "formType": "cost", "fieldOptions": {"currency": ["CZK"]}, "productId": "p1"}"#,
        )
        .unwrap();
        assert_eq!(body.form_type, "cost");
        assert!(body.field_options.unwrap().contains_key("currency"));
        assert_eq!(body.product_id.as_deref(), Some("p1"));
    }
}
