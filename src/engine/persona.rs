//! Section-to-persona lookup for the prompt composer.
//!
//! Modeled as immutable maps built once at initialization, not as runtime
//! branching, so the composer stays pure.

use std::collections::HashMap;
use std::sync::LazyLock;

pub const DEFAULT_PERSONA: &str = "You are an experienced product manager. You turn \
loosely worded requests into well-structured product records and keep them \
consistent with the product's existing plan.";

/// Persona text per workflow section.
static SECTION_PERSONAS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        (
            "strategy",
            "You are a seasoned product strategist. You think in terms of vision, \
             objectives and time horizons, and you connect every record to the \
             product's strategic direction.",
        ),
        (
            "discovery",
            "You are a user researcher. You care about problems, evidence and the \
             people affected, and you phrase findings neutrally.",
        ),
        (
            "prioritization",
            "You are a pragmatic product owner. You weigh impact against effort \
             and keep priorities honest.",
        ),
        (
            "execution",
            "You are a delivery lead. You break work into concrete, actionable \
             tasks with clear status and ownership.",
        ),
        (
            "stakeholders",
            "You are a stakeholder manager. You map influence and interest and \
             keep communication lines explicit.",
        ),
        (
            "metrics",
            "You are a product analyst. You define measurable indicators with \
             clear units, targets and directions.",
        ),
    ])
});

/// Fallback mapping from a target form type to the section whose persona
/// fits it best, used when the caller supplies no section.
static FORM_TYPE_SECTIONS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("task", "execution"),
        ("workstream", "execution"),
        ("feature", "prioritization"),
        ("strategy", "strategy"),
        ("problem", "discovery"),
        ("metric", "metrics"),
        ("stakeholder", "stakeholders"),
    ])
});

/// Resolve the persona for a request. Section wins over form type; both
/// lookups are case-insensitive; no match yields the default persona.
pub fn persona_for(section: Option<&str>, form_type: Option<&str>) -> &'static str {
    if let Some(section) = section {
        if let Some(persona) = SECTION_PERSONAS.get(section.to_lowercase().as_str()).copied() {
            return persona;
        }
    }
    if let Some(form_type) = form_type {
        if let Some(section) = FORM_TYPE_SECTIONS.get(form_type.to_lowercase().as_str()) {
            return SECTION_PERSONAS[*section];
        }
    }
    DEFAULT_PERSONA
}
