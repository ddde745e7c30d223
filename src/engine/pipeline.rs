//! Extraction pipeline orchestration.
//!
//! Each inbound request runs one stateless pass:
//!   context fetch -> selection -> composition -> invocation
//!     -> repair -> normalization -> aggregation
//!
//! The only I/O-bound steps are the two outbound HTTP calls; everything
//! else is pure. No state survives a request.

use serde_json::{Map, Value};
use uuid::Uuid;

use super::context::select_context;
use super::normalize::normalize;
use super::parser::{extract_json_object, form_fallback, CHAT_PARSE_FALLBACK_MESSAGE};
use super::prompt::{compose_chat_prompt, compose_form_prompt};
use super::provider::ModelProvider;
use super::schema::registry;
use super::types::{EntityDraft, ExtractionRequest, ExtractionResponse};
use crate::error::AppError;
use crate::product::{ContextClient, ProductSnapshot};

// =============================================================================
// Chat flow (multi-entity)
// =============================================================================

/// Run the multi-entity chat extraction flow.
pub async fn run_chat(
    provider: &dyn ModelProvider,
    context_client: &ContextClient,
    request: ExtractionRequest,
) -> Result<ExtractionResponse, AppError> {
    let request_id = Uuid::new_v4();
    tracing::debug!(%request_id, "chat extraction started");

    let snapshot = fetch_snapshot(context_client, &request).await;
    let bundle = select_context(request.section.as_deref(), None, snapshot.as_ref());
    let prompt = compose_chat_prompt(&bundle, &request);

    let raw = provider.complete(&prompt).await?;

    let Some(parsed) = extract_json_object(&raw) else {
        tracing::warn!(%request_id, "model reply was not recoverable JSON");
        return Ok(aggregate(vec![], Some(CHAT_PARSE_FALLBACK_MESSAGE.to_string())));
    };

    let mut drafts = Vec::new();
    if let Some(candidates) = parsed.get("entities").and_then(|v| v.as_array()) {
        for candidate in candidates {
            if let Some(draft) = normalize_candidate(candidate, &request.raw_text) {
                drafts.push(draft);
            }
        }
    }

    let message = parsed
        .get("message")
        .and_then(|v| v.as_str())
        .map(String::from);

    tracing::info!(%request_id, drafts = drafts.len(), "chat extraction finished");
    Ok(aggregate(drafts, message))
}

fn normalize_candidate(candidate: &Value, user_text: &str) -> Option<EntityDraft> {
    let entity_type = candidate
        .get("entityType")
        .or_else(|| candidate.get("entity_type"))
        .and_then(|v| v.as_str())?;

    let Some(schema) = registry().get(entity_type) else {
        tracing::warn!(entity_type, "skipping candidate of unknown entity type");
        return None;
    };

    // Tolerate candidates that inline their fields instead of nesting
    // them under "data".
    let fields = candidate.get("data").unwrap_or(candidate);

    Some(normalize(
        schema,
        fields,
        candidate.get("confidence"),
        Some(user_text),
    ))
}

// =============================================================================
// Form flow (single entity)
// =============================================================================

/// Run the single-form assist flow: one schema, one normalized record.
pub async fn run_form(
    provider: &dyn ModelProvider,
    context_client: &ContextClient,
    request: ExtractionRequest,
    field_options: Option<&Map<String, Value>>,
    caller_context: Option<&Map<String, Value>>,
) -> Result<Map<String, Value>, AppError> {
    let request_id = Uuid::new_v4();

    let form_type = request
        .target_form_type
        .as_deref()
        .unwrap_or_default()
        .to_string();
    let schema = registry()
        .get(&form_type)
        .ok_or_else(|| AppError::NotFound(format!("unknown form type: {form_type}")))?;

    tracing::debug!(%request_id, form_type, "form assist started");

    let snapshot = fetch_snapshot(context_client, &request).await;
    let bundle = select_context(
        request.section.as_deref(),
        Some(&form_type),
        snapshot.as_ref(),
    );
    let prompt = compose_form_prompt(schema, &bundle, &request, field_options, caller_context);

    let raw = provider.complete(&prompt).await?;

    // Unparseable replies degrade to a free-text record rather than failing.
    let fields = extract_json_object(&raw).unwrap_or_else(|| {
        tracing::warn!(%request_id, "model reply was not recoverable JSON, wrapping as text");
        form_fallback(&raw)
    });

    let draft = normalize(schema, &fields, fields.get("confidence"), None);
    tracing::info!(%request_id, form_type, "form assist finished");
    Ok(draft.data)
}

// =============================================================================
// Shared stages
// =============================================================================

async fn fetch_snapshot(
    context_client: &ContextClient,
    request: &ExtractionRequest,
) -> Option<ProductSnapshot> {
    let product_id = request.product_id.as_deref()?;
    context_client.fetch_snapshot(product_id).await
}

/// Assemble the terminal response: normalized drafts plus a human-readable
/// summary (the model's own message when it gave one).
pub fn aggregate(drafts: Vec<EntityDraft>, model_message: Option<String>) -> ExtractionResponse {
    let message = match model_message.filter(|m| !m.trim().is_empty()) {
        Some(message) => message,
        None if drafts.is_empty() => "No entities could be extracted from your request.".to_string(),
        None => format!("Prepared {} draft(s) from your request.", drafts.len()),
    };

    ExtractionResponse {
        entities: drafts,
        message,
    }
}
