//! Static entity-schema registry.
//!
//! Every field specification used elsewhere in the pipeline is resolved
//! through this registry. No schema knowledge lives in the prompt composer
//! or the normalizer.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde_json::{json, Value};

// =============================================================================
// Field specification
// =============================================================================

/// Primitive type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Enum,
    Array,
    Date,
}

impl FieldType {
    /// Label used when rendering the schema contract into prompt text.
    pub fn label(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Enum => "enum",
            FieldType::Array => "array",
            FieldType::Date => "date (YYYY-MM-DD)",
        }
    }
}

/// Specification of a single field in an entity schema.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub field_type: FieldType,
    pub required: bool,
    pub default_value: Option<Value>,
    pub allowed_values: Option<&'static [&'static str]>,
}

impl FieldSpec {
    /// Safe filler for a required field: the declared default, else a
    /// type-appropriate zero value. A required field is never absent from
    /// an emitted record.
    pub fn fallback_value(&self) -> Value {
        if let Some(default) = &self.default_value {
            return default.clone();
        }
        match self.field_type {
            FieldType::String | FieldType::Date => json!(""),
            FieldType::Number => json!(0),
            FieldType::Boolean => json!(false),
            FieldType::Array => json!([]),
            FieldType::Enum => self
                .allowed_values
                .and_then(|vals| vals.first())
                .map(|v| json!(v))
                .unwrap_or_else(|| json!("")),
        }
    }
}

// =============================================================================
// Entity schema
// =============================================================================

/// One supported record kind. Field order is the render order in prompts.
#[derive(Debug, Clone)]
pub struct EntitySchema {
    pub entity_type: &'static str,
    pub fields: Vec<FieldSpec>,
}

// =============================================================================
// Registry
// =============================================================================

/// Read-only schema catalog, built once at first use.
pub struct SchemaRegistry {
    schemas: HashMap<&'static str, EntitySchema>,
    order: Vec<&'static str>,
}

impl SchemaRegistry {
    pub fn get(&self, entity_type: &str) -> Option<&EntitySchema> {
        self.schemas.get(entity_type)
    }

    /// Entity type names in catalog order (stable for prompt rendering).
    pub fn entity_types(&self) -> &[&'static str] {
        &self.order
    }

    /// Schemas in catalog order.
    pub fn schemas(&self) -> impl Iterator<Item = &EntitySchema> {
        self.order.iter().map(|name| &self.schemas[name])
    }
}

/// Process-wide registry accessor.
pub fn registry() -> &'static SchemaRegistry {
    static REGISTRY: OnceLock<SchemaRegistry> = OnceLock::new();
    REGISTRY.get_or_init(build_registry)
}

// =============================================================================
// Catalog
// =============================================================================

fn text(name: &'static str, required: bool) -> FieldSpec {
    FieldSpec {
        name,
        field_type: FieldType::String,
        required,
        default_value: required.then(|| json!("")),
        allowed_values: None,
    }
}

fn number(name: &'static str, required: bool) -> FieldSpec {
    FieldSpec {
        name,
        field_type: FieldType::Number,
        required,
        default_value: required.then(|| json!(0)),
        allowed_values: None,
    }
}

fn array(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        field_type: FieldType::Array,
        required: true,
        default_value: Some(json!([])),
        allowed_values: None,
    }
}

fn date(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        field_type: FieldType::Date,
        required: false,
        default_value: None,
        allowed_values: None,
    }
}

fn enumeration(
    name: &'static str,
    allowed: &'static [&'static str],
    default: &'static str,
) -> FieldSpec {
    debug_assert!(allowed.contains(&default));
    FieldSpec {
        name,
        field_type: FieldType::Enum,
        required: true,
        default_value: Some(json!(default)),
        allowed_values: Some(allowed),
    }
}

fn build_registry() -> SchemaRegistry {
    let catalog = vec![
        EntitySchema {
            entity_type: "task",
            fields: vec![
                text("title", true),
                text("description", false),
                enumeration("status", &["todo", "in_progress", "done"], "todo"),
                enumeration("priority", &["low", "medium", "high"], "medium"),
                array("assignee_ids"),
                date("due_date"),
                text("workstream", false),
            ],
        },
        EntitySchema {
            entity_type: "feature",
            fields: vec![
                text("name", true),
                text("description", false),
                enumeration(
                    "status",
                    &["idea", "planned", "in_progress", "shipped"],
                    "idea",
                ),
                enumeration("priority", &["low", "medium", "high"], "medium"),
                number("effort", false),
                number("impact", false),
                text("strategy", false),
            ],
        },
        EntitySchema {
            entity_type: "strategy",
            fields: vec![
                text("title", true),
                text("vision", false),
                array("objectives"),
                enumeration("time_horizon", &["quarter", "half_year", "year"], "quarter"),
                enumeration("status", &["draft", "active", "archived"], "draft"),
            ],
        },
        EntitySchema {
            entity_type: "cost",
            fields: vec![
                text("name", true),
                number("amount", true),
                enumeration("currency", &["USD", "EUR", "GBP"], "USD"),
                enumeration(
                    "cost_type",
                    &["vendor", "personnel", "infrastructure", "marketing", "other"],
                    "other",
                ),
                enumeration("recurrence", &["one_time", "monthly", "annual"], "one_time"),
                text("vendor", false),
            ],
        },
        EntitySchema {
            entity_type: "problem",
            fields: vec![
                text("title", true),
                text("description", false),
                enumeration("severity", &["low", "medium", "high", "critical"], "medium"),
                enumeration("status", &["open", "investigating", "resolved"], "open"),
                array("affected_groups"),
            ],
        },
        EntitySchema {
            entity_type: "workstream",
            fields: vec![
                text("name", true),
                text("description", false),
                enumeration("status", &["active", "paused", "done"], "active"),
                text("owner", false),
            ],
        },
        EntitySchema {
            entity_type: "metric",
            fields: vec![
                text("name", true),
                text("description", false),
                text("unit", false),
                number("target_value", false),
                number("current_value", false),
                enumeration("direction", &["increase", "decrease"], "increase"),
            ],
        },
        EntitySchema {
            entity_type: "stakeholder",
            fields: vec![
                text("name", true),
                text("role", false),
                enumeration("influence", &["low", "medium", "high"], "medium"),
                enumeration("interest", &["low", "medium", "high"], "medium"),
                text("notes", false),
            ],
        },
    ];

    let order: Vec<&'static str> = catalog.iter().map(|s| s.entity_type).collect();
    let schemas = catalog.into_iter().map(|s| (s.entity_type, s)).collect();
    SchemaRegistry { schemas, order }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_resolves_known_types() {
        for entity_type in [
            "task",
            "feature",
            "strategy",
            "cost",
            "problem",
            "workstream",
            "metric",
            "stakeholder",
        ] {
            assert!(
                registry().get(entity_type).is_some(),
                "missing schema for {entity_type}"
            );
        }
    }

    #[test]
    fn test_registry_unknown_type_is_none() {
        assert!(registry().get("okr").is_none());
        assert!(registry().get("").is_none());
    }

    #[test]
    fn test_every_required_field_has_a_filler() {
        for schema in registry().schemas() {
            for field in schema.fields.iter().filter(|f| f.required) {
                let filler = field.fallback_value();
                assert!(
                    !filler.is_null(),
                    "{}.{} has no emittable filler",
                    schema.entity_type,
                    field.name
                );
            }
        }
    }

    #[test]
    fn test_enum_defaults_are_members() {
        for schema in registry().schemas() {
            for field in schema
                .fields
                .iter()
                .filter(|f| f.field_type == FieldType::Enum)
            {
                let allowed = field.allowed_values.expect("enum field has allowed values");
                let default = field
                    .default_value
                    .as_ref()
                    .and_then(|v| v.as_str())
                    .expect("enum field has a string default");
                assert!(allowed.contains(&default));
            }
        }
    }

    #[test]
    fn test_task_schema_defaults() {
        let task = registry().get("task").unwrap();
        let status = task.fields.iter().find(|f| f.name == "status").unwrap();
        assert_eq!(status.fallback_value(), json!("todo"));
        let assignees = task
            .fields
            .iter()
            .find(|f| f.name == "assignee_ids")
            .unwrap();
        assert_eq!(assignees.fallback_value(), json!([]));
    }
}
