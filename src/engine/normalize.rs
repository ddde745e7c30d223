//! Normalization and validation of extracted candidates.
//!
//! Every field of a parsed candidate is untrusted input. Each one is routed
//! through its schema `FieldSpec`: defaults fill required gaps and enums are
//! enforced. A value that cannot be coerced to any sane shape is dropped
//! with a log line, never an error.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::schema::{EntitySchema, FieldSpec, FieldType};
use super::types::{EntityAction, EntityDraft};

/// Conservative score assigned when the model reports none.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

// =============================================================================
// Entry point
// =============================================================================

/// Normalize one candidate record against its schema.
///
/// `fields` is the candidate's data object (any JSON value is tolerated);
/// `confidence` is the model's self-reported score, if any; `user_text`
/// drives action inference and is only supplied by the chat flow.
pub fn normalize(
    schema: &EntitySchema,
    fields: &Value,
    confidence: Option<&Value>,
    user_text: Option<&str>,
) -> EntityDraft {
    let mut data = Map::new();

    for spec in &schema.fields {
        let raw = fields.get(spec.name).filter(|v| !v.is_null());

        match raw {
            Some(value) => match coerce(spec, value) {
                Some(coerced) if spec.required && is_empty(&coerced) => {
                    data.insert(spec.name.to_string(), spec.fallback_value());
                }
                Some(coerced) => {
                    data.insert(spec.name.to_string(), coerced);
                }
                None => {
                    tracing::warn!(
                        entity_type = schema.entity_type,
                        field = spec.name,
                        "dropping uncoercible value"
                    );
                    // Invalid enum values are never passed through; they are
                    // replaced by the schema default even on optional fields.
                    if spec.required || spec.field_type == FieldType::Enum {
                        data.insert(spec.name.to_string(), spec.fallback_value());
                    }
                }
            },
            None if spec.required => {
                data.insert(spec.name.to_string(), spec.fallback_value());
            }
            None => {} // absent optional fields stay absent
        }
    }

    EntityDraft {
        entity_type: schema.entity_type.to_string(),
        data,
        confidence: clamp_confidence(confidence),
        action: user_text.map(infer_action).unwrap_or(EntityAction::Create),
    }
}

// =============================================================================
// Confidence
// =============================================================================

/// Clamping policy: missing or non-numeric scores default to 0.5, numeric
/// scores clamp into [0,1], NaN defaults. Never re-derived beyond this.
pub fn clamp_confidence(value: Option<&Value>) -> f64 {
    match value.and_then(|v| v.as_f64()) {
        Some(score) if score.is_nan() => DEFAULT_CONFIDENCE,
        Some(score) => score.clamp(0.0, 1.0),
        None => DEFAULT_CONFIDENCE,
    }
}

// =============================================================================
// Action inference
// =============================================================================

static DISCARD_CUES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(discard|cancel|ignore|remove|delete|drop)\b").expect("valid cue pattern")
});
static EDIT_CUES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(edit|update|change|modify|rename|adjust|revise)\b")
        .expect("valid cue pattern")
});

/// Infer what the user wants done with the drafts from lexical cues in the
/// original request. Cancellation language wins over edit language; the
/// default is create.
pub fn infer_action(text: &str) -> EntityAction {
    if DISCARD_CUES.is_match(text) {
        EntityAction::Discard
    } else if EDIT_CUES.is_match(text) {
        EntityAction::Edit
    } else {
        EntityAction::Create
    }
}

// =============================================================================
// Coercion
// =============================================================================

fn is_empty(value: &Value) -> bool {
    matches!(value, Value::String(s) if s.trim().is_empty())
}

/// Best-effort coercion of an untrusted value into the field's type.
/// Returns `None` when no sane conversion exists.
fn coerce(spec: &FieldSpec, value: &Value) -> Option<Value> {
    match spec.field_type {
        FieldType::String => coerce_string(value),
        FieldType::Number => coerce_number(value),
        FieldType::Boolean => coerce_boolean(value),
        FieldType::Enum => coerce_enum(spec, value),
        FieldType::Array => coerce_array(value),
        FieldType::Date => coerce_date(value),
    }
}

fn coerce_string(value: &Value) -> Option<Value> {
    match value {
        Value::String(_) => Some(value.clone()),
        Value::Number(n) => Some(Value::String(n.to_string())),
        Value::Bool(b) => Some(Value::String(b.to_string())),
        _ => None,
    }
}

fn coerce_number(value: &Value) -> Option<Value> {
    match value {
        Value::Number(_) => Some(value.clone()),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        _ => None,
    }
}

fn coerce_boolean(value: &Value) -> Option<Value> {
    match value {
        Value::Bool(_) => Some(value.clone()),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}

fn coerce_enum(spec: &FieldSpec, value: &Value) -> Option<Value> {
    let allowed = spec.allowed_values?;
    let candidate = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    allowed
        .iter()
        .find(|v| **v == candidate)
        .map(|v| Value::String(v.to_string()))
}

fn coerce_array(value: &Value) -> Option<Value> {
    match value {
        Value::Array(_) => Some(value.clone()),
        // A bare scalar wraps into a one-element array.
        Value::String(_) | Value::Number(_) | Value::Bool(_) => {
            Some(Value::Array(vec![value.clone()]))
        }
        _ => None,
    }
}

fn coerce_date(value: &Value) -> Option<Value> {
    let s = value.as_str()?.trim();
    if chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() {
        return Some(Value::String(s.to_string()));
    }
    // Full timestamps collapse to their date portion.
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| Value::String(dt.date_naive().format("%Y-%m-%d").to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::schema::registry;
    use serde_json::json;

    #[test]
    fn test_task_scenario_fills_defaults() {
        // "Add a task to redesign the login page, high priority"
        let schema = registry().get("task").unwrap();
        let candidate = json!({
            "title": "Redesign the login page",
            "priority": "high"
        });
        let draft = normalize(
            schema,
            &candidate,
            None,
            Some("Add a task to redesign the login page, high priority"),
        );

        assert_eq!(draft.data["title"], "Redesign the login page");
        assert_eq!(draft.data["status"], "todo");
        assert_eq!(draft.data["priority"], "high");
        assert_eq!(draft.data["assignee_ids"], json!([]));
        assert_eq!(draft.action, EntityAction::Create);
        assert_eq!(draft.confidence, DEFAULT_CONFIDENCE);
    }

    #[test]
    fn test_cost_discard_scenario() {
        let schema = registry().get("cost").unwrap();
        let candidate = json!({ "name": "Cloud hosting", "cost_type": "vendor" });
        let draft = normalize(
            schema,
            &candidate,
            Some(&json!(0.9)),
            Some("discard the vendor cost for cloud hosting"),
        );

        assert_eq!(draft.entity_type, "cost");
        assert_eq!(draft.action, EntityAction::Discard);
        assert_eq!(draft.data["amount"], json!(0));
        assert_eq!(draft.confidence, 0.9);
    }

    #[test]
    fn test_required_fields_never_missing() {
        let schema = registry().get("task").unwrap();
        let draft = normalize(schema, &json!({}), None, None);
        for spec in schema.fields.iter().filter(|f| f.required) {
            assert!(
                draft.data.contains_key(spec.name),
                "required field {} missing",
                spec.name
            );
        }
    }

    #[test]
    fn test_invalid_enum_is_replaced_with_default() {
        let schema = registry().get("task").unwrap();
        let draft = normalize(schema, &json!({ "status": "someday" }), None, None);
        assert_eq!(draft.data["status"], "todo");
    }

    #[test]
    fn test_empty_required_string_gets_filler() {
        let schema = registry().get("task").unwrap();
        let draft = normalize(schema, &json!({ "title": "   " }), None, None);
        assert_eq!(draft.data["title"], "");
    }

    #[test]
    fn test_optional_fields_pass_through_or_stay_absent() {
        let schema = registry().get("task").unwrap();
        let with = normalize(
            schema,
            &json!({ "description": "dark mode everywhere" }),
            None,
            None,
        );
        assert_eq!(with.data["description"], "dark mode everywhere");

        let without = normalize(schema, &json!({}), None, None);
        assert!(!without.data.contains_key("description"));
    }

    #[test]
    fn test_unknown_candidate_fields_are_dropped() {
        let schema = registry().get("task").unwrap();
        let draft = normalize(schema, &json!({ "sprint": 12 }), None, None);
        assert!(!draft.data.contains_key("sprint"));
    }

    #[test]
    fn test_scalar_coercions() {
        let schema = registry().get("cost").unwrap();
        let draft = normalize(schema, &json!({ "amount": "1200.50" }), None, None);
        assert_eq!(draft.data["amount"], json!(1200.5));

        let schema = registry().get("task").unwrap();
        let draft = normalize(schema, &json!({ "assignee_ids": "u-1" }), None, None);
        assert_eq!(draft.data["assignee_ids"], json!(["u-1"]));
    }

    #[test]
    fn test_bad_date_is_dropped() {
        let schema = registry().get("task").unwrap();
        let draft = normalize(schema, &json!({ "due_date": "next tuesday" }), None, None);
        assert!(!draft.data.contains_key("due_date"));

        let draft = normalize(schema, &json!({ "due_date": "2026-09-01" }), None, None);
        assert_eq!(draft.data["due_date"], "2026-09-01");
    }

    #[test]
    fn test_rfc3339_timestamp_collapses_to_date() {
        let schema = registry().get("task").unwrap();
        let draft = normalize(
            schema,
            &json!({ "due_date": "2026-09-01T10:30:00Z" }),
            None,
            None,
        );
        assert_eq!(draft.data["due_date"], "2026-09-01");
    }

    #[test]
    fn test_confidence_policy() {
        assert_eq!(clamp_confidence(None), DEFAULT_CONFIDENCE);
        assert_eq!(clamp_confidence(Some(&json!("high"))), DEFAULT_CONFIDENCE);
        assert_eq!(clamp_confidence(Some(&json!(0.7))), 0.7);
        assert_eq!(clamp_confidence(Some(&json!(3.5))), 1.0);
        assert_eq!(clamp_confidence(Some(&json!(-1))), 0.0);
    }

    #[test]
    fn test_action_cues() {
        assert_eq!(infer_action("add a new task for onboarding"), EntityAction::Create);
        assert_eq!(infer_action("please update the pricing feature"), EntityAction::Edit);
        assert_eq!(infer_action("cancel the infra cost"), EntityAction::Discard);
        // Cancellation wins over edit language.
        assert_eq!(
            infer_action("update the list and remove the old item"),
            EntityAction::Discard
        );
        // No cue defaults to create.
        assert_eq!(infer_action("a login redesign"), EntityAction::Create);
    }

    #[test]
    fn test_non_object_candidate_yields_pure_defaults() {
        let schema = registry().get("problem").unwrap();
        let draft = normalize(schema, &json!("not an object"), None, None);
        assert_eq!(draft.data["severity"], "medium");
        assert_eq!(draft.data["status"], "open");
        assert_eq!(draft.data["title"], "");
    }
}
