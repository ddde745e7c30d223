//! Read-only client for the persistence layer's product-context endpoint.
//!
//! Failure here never fails an extraction request: the pipeline degrades
//! to an empty context bundle and keeps going.

use serde::Deserialize;

// =============================================================================
// Snapshot types
// =============================================================================

/// Lightweight projection of one existing domain object, as served by
/// `GET /products/{id}/context`. Only used for prompt grounding.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    #[serde(default)]
    pub id: String,
    #[serde(default, alias = "name")]
    pub title: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Everything the persistence layer knows about a product, grouped by
/// record kind. Every group is optional on the wire.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    #[serde(default)]
    pub strategies: Vec<ItemSummary>,
    #[serde(default)]
    pub problems: Vec<ItemSummary>,
    #[serde(default)]
    pub features: Vec<ItemSummary>,
    #[serde(default)]
    pub tasks: Vec<ItemSummary>,
    #[serde(default)]
    pub workstreams: Vec<ItemSummary>,
    #[serde(default)]
    pub metrics: Vec<ItemSummary>,
    #[serde(default)]
    pub stakeholders: Vec<ItemSummary>,
    #[serde(default)]
    pub costs: Vec<ItemSummary>,
}

// =============================================================================
// ContextClient
// =============================================================================

const CONTEXT_FETCH_TIMEOUT_SECS: u64 = 5;

/// HTTP client for the persistence layer's read-only context endpoint.
pub struct ContextClient {
    http: reqwest::Client,
    base_url: String,
}

impl ContextClient {
    pub fn new(base_url: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(CONTEXT_FETCH_TIMEOUT_SECS))
            .build()
            .expect("failed to build reqwest client");

        Self { http, base_url }
    }

    /// `GET /products/{id}/context`. Any failure (network, status, body)
    /// logs a warning and returns `None`.
    pub async fn fetch_snapshot(&self, product_id: &str) -> Option<ProductSnapshot> {
        let url = format!("{}/products/{}/context", self.base_url, product_id);

        let response = match self.http.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(product_id, "context fetch failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::warn!(
                product_id,
                status = response.status().as_u16(),
                "context endpoint returned non-success status"
            );
            return None;
        }

        match response.json::<ProductSnapshot>().await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(product_id, "context payload did not parse: {}", e);
                None
            }
        }
    }
}
