use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ts_rs::TS;

// =============================================================================
// Conversation
// =============================================================================

/// Role of a conversation turn. Serializes as a lowercase string to match
/// the TypeScript union type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One prior turn of the conversation, passed through as read-only context.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

// =============================================================================
// Pipeline input
// =============================================================================

/// One inbound user utterance plus optional prior turns and schema hint.
/// Internal form shared by both endpoint bodies.
#[derive(Debug, Clone, Default)]
pub struct ExtractionRequest {
    pub raw_text: String,
    pub conversation_history: Vec<ConversationTurn>,
    pub target_form_type: Option<String>,
    pub section: Option<String>,
    pub product_id: Option<String>,
}

// =============================================================================
// Pipeline output
// =============================================================================

/// What the caller should do with a draft, inferred from lexical cues in
/// the user's request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum EntityAction {
    Create,
    Edit,
    Discard,
}

impl EntityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityAction::Create => "create",
            EntityAction::Edit => "edit",
            EntityAction::Discard => "discard",
        }
    }
}

/// A normalized, schema-valid candidate record. Never persisted here;
/// the caller owns what happens next.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct EntityDraft {
    pub entity_type: String,
    #[ts(type = "Record<string, unknown>")]
    pub data: Map<String, Value>,
    /// Advisory score in [0,1]; the caller decides whether to auto-apply
    /// or prompt for review.
    pub confidence: f64,
    pub action: EntityAction,
}

/// Terminal output of the extraction pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ExtractionResponse {
    pub entities: Vec<EntityDraft>,
    pub message: String,
}
