//! Prompt composition.
//!
//! Assembles the instruction text sent to the model from four parts in a
//! fixed order: persona, schema contract, grounding context, then the
//! conversation and the JSON-only reply instruction. Given identical
//! inputs the output is byte-identical; nothing here is randomized.

use serde_json::{Map, Value};

use super::context::ContextBundle;
use super::persona::persona_for;
use super::schema::{registry, EntitySchema, FieldSpec};
use super::types::ExtractionRequest;

/// Prior turns beyond this are dropped (oldest first). Same rationale as
/// the context ceiling: prompt size is bounded.
pub const MAX_HISTORY_TURNS: usize = 10;

// =============================================================================
// Entry points
// =============================================================================

/// Prompt for the multi-entity chat flow: the model may propose records of
/// any catalog type.
pub fn compose_chat_prompt(bundle: &ContextBundle, request: &ExtractionRequest) -> String {
    let mut prompt = String::new();

    push_persona(&mut prompt, request);

    prompt.push_str("## Record types\n");
    prompt.push_str(
        "You can propose records of the following types. Use exactly these \
         field names and types.\n\n",
    );
    for schema in registry().schemas() {
        push_schema_contract(&mut prompt, schema, None);
    }

    push_context(&mut prompt, bundle);
    push_history(&mut prompt, request);

    prompt.push_str("## Request\n");
    prompt.push_str(&request.raw_text);
    prompt.push_str("\n\n");

    prompt.push_str("## Reply format\n");
    prompt.push_str(
        "Respond with valid JSON only. No prose, no markdown fences. The JSON \
         must have exactly this shape:\n\
         {\"entities\": [{\"entityType\": \"<record type>\", \"data\": {<field values>}, \
         \"confidence\": <number between 0 and 1>}], \
         \"message\": \"<one-sentence summary for the user>\"}\n",
    );

    prompt
}

/// Prompt for the single-form assist flow: one schema, one record.
pub fn compose_form_prompt(
    schema: &EntitySchema,
    bundle: &ContextBundle,
    request: &ExtractionRequest,
    field_options: Option<&Map<String, Value>>,
    caller_context: Option<&Map<String, Value>>,
) -> String {
    let mut prompt = String::new();

    push_persona(&mut prompt, request);

    prompt.push_str("## Record type\n");
    prompt.push_str(&format!(
        "Fill in a single \"{}\" record. Use exactly these field names and types.\n\n",
        schema.entity_type
    ));
    push_schema_contract(&mut prompt, schema, field_options);

    if let Some(extra) = caller_context.filter(|m| !m.is_empty()) {
        prompt.push_str("## Caller context\n");
        for (key, value) in extra {
            prompt.push_str(&format!("- {}: {}\n", key, render_scalar(value)));
        }
        prompt.push('\n');
    }

    push_context(&mut prompt, bundle);
    push_history(&mut prompt, request);

    prompt.push_str("## Request\n");
    prompt.push_str(&request.raw_text);
    prompt.push_str("\n\n");

    prompt.push_str("## Reply format\n");
    prompt.push_str(
        "Respond with valid JSON only. No prose, no markdown fences. Reply \
         with a single JSON object whose keys are the field names listed above.\n",
    );

    prompt
}

// =============================================================================
// Section builders
// =============================================================================

fn push_persona(prompt: &mut String, request: &ExtractionRequest) {
    prompt.push_str(persona_for(
        request.section.as_deref(),
        request.target_form_type.as_deref(),
    ));
    prompt.push_str("\n\n");
}

fn push_schema_contract(
    prompt: &mut String,
    schema: &EntitySchema,
    field_options: Option<&Map<String, Value>>,
) {
    prompt.push_str(&format!("### {}\n", schema.entity_type));
    for field in &schema.fields {
        prompt.push_str(&render_field_line(field, field_options));
    }
    prompt.push('\n');
}

fn render_field_line(field: &FieldSpec, field_options: Option<&Map<String, Value>>) -> String {
    let mut line = format!(
        "- {} ({}{})",
        field.name,
        field.field_type.label(),
        if field.required { ", required" } else { "" },
    );

    // Caller-supplied options extend the schema's own allowed values.
    let mut allowed: Vec<String> = field
        .allowed_values
        .map(|vals| vals.iter().map(|v| v.to_string()).collect())
        .unwrap_or_default();
    if let Some(options) = field_options.and_then(|m| m.get(field.name)) {
        if let Some(extra) = options.as_array() {
            for value in extra {
                let rendered = render_scalar(value);
                if !allowed.contains(&rendered) {
                    allowed.push(rendered);
                }
            }
        }
    }
    if !allowed.is_empty() {
        line.push_str(&format!(": one of {}", allowed.join(", ")));
    }

    line.push('\n');
    line
}

fn push_context(prompt: &mut String, bundle: &ContextBundle) {
    if bundle.is_empty() {
        return;
    }

    prompt.push_str("## Existing product context\n");
    prompt.push_str(
        "Do not duplicate the items listed below; stay consistent with them \
         and reference them where relevant.\n\n",
    );
    for (category, items) in bundle.groups() {
        if items.is_empty() {
            continue;
        }
        prompt.push_str(&format!("{}:\n", category.label()));
        for item in items {
            prompt.push_str(&format!("- {}", item.label));
            if let Some(status) = &item.status {
                prompt.push_str(&format!(" [{}]", status));
            }
            if let Some(detail) = &item.detail {
                prompt.push_str(&format!(" — {}", detail));
            }
            prompt.push('\n');
        }
        prompt.push('\n');
    }
}

fn push_history(prompt: &mut String, request: &ExtractionRequest) {
    if request.conversation_history.is_empty() {
        return;
    }

    let turns = &request.conversation_history;
    let start = turns.len().saturating_sub(MAX_HISTORY_TURNS);

    prompt.push_str("## Conversation so far\n");
    for turn in &turns[start..] {
        prompt.push_str(&format!("{}: {}\n", turn.role.as_str(), turn.content));
    }
    prompt.push('\n');
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::context::select_context;
    use crate::engine::types::{ConversationTurn, Role};
    use crate::product::{ItemSummary, ProductSnapshot};
    use serde_json::json;

    fn request(text: &str) -> ExtractionRequest {
        ExtractionRequest {
            raw_text: text.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_chat_prompt_is_deterministic() {
        let snapshot = ProductSnapshot {
            tasks: vec![ItemSummary {
                id: "t1".into(),
                title: "Fix login".into(),
                status: Some("todo".into()),
                description: None,
            }],
            ..Default::default()
        };
        let bundle = select_context(None, None, Some(&snapshot));
        let req = request("add a task");
        assert_eq!(
            compose_chat_prompt(&bundle, &req),
            compose_chat_prompt(&bundle, &req)
        );
    }

    #[test]
    fn test_chat_prompt_carries_all_parts() {
        let req = request("add a login task");
        let prompt = compose_chat_prompt(&ContextBundle::default(), &req);
        assert!(prompt.contains("product manager")); // default persona
        assert!(prompt.contains("### task"));
        assert!(prompt.contains("### cost"));
        assert!(prompt.contains("add a login task"));
        assert!(prompt.contains("valid JSON only"));
        assert!(prompt.contains("\"entities\""));
    }

    #[test]
    fn test_empty_bundle_renders_no_context_section() {
        let prompt = compose_chat_prompt(&ContextBundle::default(), &request("hi"));
        assert!(!prompt.contains("Existing product context"));
    }

    #[test]
    fn test_context_carries_dedup_instruction() {
        let snapshot = ProductSnapshot {
            features: vec![ItemSummary {
                id: "f1".into(),
                title: "Dark mode".into(),
                status: None,
                description: None,
            }],
            ..Default::default()
        };
        let bundle = select_context(None, Some("feature"), Some(&snapshot));
        let prompt = compose_chat_prompt(&bundle, &request("new feature"));
        assert!(prompt.contains("Do not duplicate"));
        assert!(prompt.contains("- Dark mode"));
    }

    #[test]
    fn test_history_is_capped_to_recent_turns() {
        let mut req = request("and one more");
        req.conversation_history = (0..15)
            .map(|i| ConversationTurn {
                role: if i % 2 == 0 { Role::User } else { Role::Assistant },
                content: format!("turn {i}"),
            })
            .collect();
        let prompt = compose_chat_prompt(&ContextBundle::default(), &req);
        assert!(!prompt.contains("turn 4"));
        assert!(prompt.contains("turn 5"));
        assert!(prompt.contains("turn 14"));
    }

    #[test]
    fn test_form_prompt_merges_field_options() {
        let schema = registry().get("task").unwrap();
        let mut options = Map::new();
        options.insert("status".into(), json!(["blocked"]));
        let prompt = compose_form_prompt(
            schema,
            &ContextBundle::default(),
            &request("fill this in"),
            Some(&options),
            None,
        );
        assert!(prompt.contains("one of todo, in_progress, done, blocked"));
        assert!(prompt.contains("single JSON object"));
    }

    #[test]
    fn test_form_prompt_renders_caller_context() {
        let schema = registry().get("feature").unwrap();
        let mut extra = Map::new();
        extra.insert("team".into(), json!("growth"));
        let prompt = compose_form_prompt(
            schema,
            &ContextBundle::default(),
            &request("a feature"),
            None,
            Some(&extra),
        );
        assert!(prompt.contains("## Caller context"));
        assert!(prompt.contains("- team: growth"));
    }
}
