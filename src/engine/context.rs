//! Bounded context selection.
//!
//! Picks a category plan from the workflow section (or target form type),
//! caps each category, and enforces a global ceiling so prompt size stays
//! bounded no matter how large the product snapshot is.

use crate::product::{ItemSummary, ProductSnapshot};

// =============================================================================
// Categories
// =============================================================================

/// A grounding-context category, in fixed render order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextCategory {
    Strategies,
    Problems,
    Features,
    Tasks,
    Workstreams,
    Metrics,
    Stakeholders,
    Costs,
}

impl ContextCategory {
    /// Heading used when rendering the bundle into prompt text.
    pub fn label(&self) -> &'static str {
        match self {
            ContextCategory::Strategies => "Existing strategies",
            ContextCategory::Problems => "Known problems",
            ContextCategory::Features => "Existing features",
            ContextCategory::Tasks => "Existing tasks",
            ContextCategory::Workstreams => "Workstreams",
            ContextCategory::Metrics => "Tracked metrics",
            ContextCategory::Stakeholders => "Stakeholders",
            ContextCategory::Costs => "Recorded costs",
        }
    }
}

/// A context line shown to the model. Never persisted or mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextItem {
    pub id: String,
    pub label: String,
    pub detail: Option<String>,
    pub status: Option<String>,
}

/// Grounding items grouped by category. Ordered (not a map) so prompt
/// composition is deterministic.
#[derive(Debug, Clone, Default)]
pub struct ContextBundle {
    groups: Vec<(ContextCategory, Vec<ContextItem>)>,
}

impl ContextBundle {
    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|(_, items)| items.is_empty())
    }

    pub fn total_items(&self) -> usize {
        self.groups.iter().map(|(_, items)| items.len()).sum()
    }

    pub fn groups(&self) -> &[(ContextCategory, Vec<ContextItem>)] {
        &self.groups
    }
}

// =============================================================================
// Selection
// =============================================================================

/// Hard ceiling on the bundle's total item count, regardless of snapshot
/// size. Prompt size is bounded.
pub const MAX_TOTAL_CONTEXT_ITEMS: usize = 60;

const DETAIL_PREVIEW_CHARS: usize = 120;

type CategoryPlan = &'static [(ContextCategory, usize)];

const STRATEGY_PLAN: CategoryPlan = &[
    (ContextCategory::Strategies, 5),
    (ContextCategory::Features, 10),
    (ContextCategory::Problems, 10),
];
const DISCOVERY_PLAN: CategoryPlan = &[
    (ContextCategory::Problems, 10),
    (ContextCategory::Stakeholders, 10),
    (ContextCategory::Features, 10),
];
const PRIORITIZATION_PLAN: CategoryPlan = &[
    (ContextCategory::Features, 15),
    (ContextCategory::Tasks, 15),
    (ContextCategory::Strategies, 5),
];
const EXECUTION_PLAN: CategoryPlan = &[
    (ContextCategory::Tasks, 20),
    (ContextCategory::Features, 10),
    (ContextCategory::Workstreams, 8),
];
const STAKEHOLDERS_PLAN: CategoryPlan = &[
    (ContextCategory::Stakeholders, 10),
    (ContextCategory::Workstreams, 8),
];
const METRICS_PLAN: CategoryPlan = &[
    (ContextCategory::Metrics, 10),
    (ContextCategory::Strategies, 5),
    (ContextCategory::Features, 10),
];
const COST_PLAN: CategoryPlan = &[
    (ContextCategory::Costs, 10),
    (ContextCategory::Features, 10),
];
const DEFAULT_PLAN: CategoryPlan = &[
    (ContextCategory::Tasks, 10),
    (ContextCategory::Features, 10),
    (ContextCategory::Strategies, 5),
    (ContextCategory::Problems, 5),
];

fn plan_for_section(section: &str) -> Option<CategoryPlan> {
    match section.to_lowercase().as_str() {
        "strategy" => Some(STRATEGY_PLAN),
        "discovery" => Some(DISCOVERY_PLAN),
        "prioritization" => Some(PRIORITIZATION_PLAN),
        "execution" => Some(EXECUTION_PLAN),
        "stakeholders" => Some(STAKEHOLDERS_PLAN),
        "metrics" => Some(METRICS_PLAN),
        _ => None,
    }
}

fn plan_for_form_type(form_type: &str) -> Option<CategoryPlan> {
    match form_type.to_lowercase().as_str() {
        "task" | "workstream" => Some(EXECUTION_PLAN),
        "feature" => Some(PRIORITIZATION_PLAN),
        "strategy" => Some(STRATEGY_PLAN),
        "problem" => Some(DISCOVERY_PLAN),
        "metric" => Some(METRICS_PLAN),
        "stakeholder" => Some(STAKEHOLDERS_PLAN),
        "cost" => Some(COST_PLAN),
        _ => None,
    }
}

/// Select a bounded, relevant slice of the product snapshot.
///
/// Without a snapshot (no product id, or the context fetch failed) the
/// bundle is empty and the pipeline proceeds without grounding.
pub fn select_context(
    section: Option<&str>,
    target_form_type: Option<&str>,
    snapshot: Option<&ProductSnapshot>,
) -> ContextBundle {
    let Some(snapshot) = snapshot else {
        return ContextBundle::default();
    };

    let plan = section
        .and_then(plan_for_section)
        .or_else(|| target_form_type.and_then(plan_for_form_type))
        .unwrap_or(DEFAULT_PLAN);

    let mut groups = Vec::with_capacity(plan.len());
    let mut remaining = MAX_TOTAL_CONTEXT_ITEMS;

    for &(category, cap) in plan {
        let take = cap.min(remaining);
        let items = pick_items(category, snapshot, take);
        remaining -= items.len();
        groups.push((category, items));
        if remaining == 0 {
            break;
        }
    }

    ContextBundle { groups }
}

fn pick_items(category: ContextCategory, snapshot: &ProductSnapshot, cap: usize) -> Vec<ContextItem> {
    let source = match category {
        ContextCategory::Strategies => &snapshot.strategies,
        ContextCategory::Problems => &snapshot.problems,
        ContextCategory::Features => &snapshot.features,
        ContextCategory::Tasks => &snapshot.tasks,
        ContextCategory::Workstreams => &snapshot.workstreams,
        ContextCategory::Metrics => &snapshot.metrics,
        ContextCategory::Stakeholders => &snapshot.stakeholders,
        ContextCategory::Costs => &snapshot.costs,
    };

    // Active work is more relevant than finished work; keep the original
    // order inside each half.
    let (active, done): (Vec<&ItemSummary>, Vec<&ItemSummary>) = source
        .iter()
        .partition(|item| !matches!(item.status.as_deref(), Some("done") | Some("resolved")));

    active
        .into_iter()
        .chain(done)
        .take(cap)
        .map(project_item)
        .collect()
}

fn project_item(item: &ItemSummary) -> ContextItem {
    let detail = item.description.as_deref().map(|d| {
        if d.chars().count() > DETAIL_PREVIEW_CHARS {
            let preview: String = d.chars().take(DETAIL_PREVIEW_CHARS).collect();
            format!("{preview}...")
        } else {
            d.to_string()
        }
    });

    ContextItem {
        id: item.id.clone(),
        label: item.title.clone(),
        detail,
        status: item.status.clone(),
    }
}
