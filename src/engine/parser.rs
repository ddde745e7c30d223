//! JSON recovery from raw model text.
//!
//! The model is not guaranteed to return pure JSON; replies routinely wrap
//! the payload in prose or code fences. Malformed output is an expected
//! condition here, so nothing in this module returns an error.

use serde_json::{json, Value};

/// Summary used when the chat flow cannot recover a JSON payload.
pub const CHAT_PARSE_FALLBACK_MESSAGE: &str =
    "I couldn't turn the reply into structured records. Try rephrasing your request.";

/// Recover a single JSON object from raw model text.
///
/// Scans for the first `{` and the last `}` and parses that span. Returns
/// `None` when no span exists, the span does not parse, or the parsed
/// value is not an object. Total for any input string.
pub fn extract_json_object(raw: &str) -> Option<Value> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }

    let candidate = &raw[start..=end];
    match serde_json::from_str::<Value>(candidate) {
        Ok(value) if value.is_object() => Some(value),
        Ok(_) | Err(_) => None,
    }
}

/// Fallback for the single-entity form flow: wrap the raw reply as a
/// free-text field so the caller still receives something usable.
pub fn form_fallback(raw: &str) -> Value {
    json!({ "description": raw.trim() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_json_wrapped_in_prose() {
        let raw = "Sure! Here you go: {\"name\":\"X\"}  Hope that helps!";
        assert_eq!(extract_json_object(raw), Some(json!({"name": "X"})));
    }

    #[test]
    fn test_extracts_json_from_markdown_fence() {
        let raw = "```json\n{\"entities\": [], \"message\": \"ok\"}\n```";
        let value = extract_json_object(raw).unwrap();
        assert_eq!(value["message"], "ok");
    }

    #[test]
    fn test_idempotent_on_valid_json() {
        let original = json!({"a": 1, "b": {"c": [1, 2, 3]}, "d": "text"});
        let raw = serde_json::to_string(&original).unwrap();
        assert_eq!(extract_json_object(&raw), Some(original));
    }

    #[test]
    fn test_none_for_pure_prose() {
        assert_eq!(extract_json_object("There is nothing structured here."), None);
        assert_eq!(extract_json_object(""), None);
    }

    #[test]
    fn test_none_for_truncated_json() {
        assert_eq!(extract_json_object("{\"name\": \"X\""), None);
    }

    #[test]
    fn test_none_for_reversed_braces() {
        assert_eq!(extract_json_object("} not json {"), None);
    }

    #[test]
    fn test_none_for_braceless_array() {
        assert_eq!(extract_json_object("[1, 2, 3]"), None);
    }

    #[test]
    fn test_recovers_object_nested_in_array_reply() {
        // First-brace/last-brace lands on the inner object.
        assert_eq!(
            extract_json_object("[{\"a\": 1}]"),
            Some(json!({"a": 1}))
        );
    }

    #[test]
    fn test_form_fallback_wraps_raw_text() {
        let value = form_fallback("  just a sentence about costs  ");
        assert_eq!(value["description"], "just a sentence about costs");
    }
}
