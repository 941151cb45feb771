use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SearchResultItem — Normalized projection of an upstream catalog card
// ---------------------------------------------------------------------------

/// One card returned by a catalog search. Never persisted as-is; convert
/// into a [`NewCardItem`](super::NewCardItem) to store it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultItem {
    pub id: String,
    pub name: Option<String>,
    pub set_name: Option<String>,
    pub image_url: Option<String>,
    #[serde(rename = "priceUSD")]
    pub price_usd: Option<f64>,
    pub price_updated_at: Option<String>,
}

// ---------------------------------------------------------------------------
// SearchFilter — Structured restrictions ANDed onto a search query
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    /// Restrict results to a set with this exact display name.
    pub set_name: Option<String>,
}

impl SearchFilter {
    pub fn set_name(name: impl Into<String>) -> Self {
        Self {
            set_name: Some(name.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// ProbeReport — Result of a catalog connectivity probe
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeReport {
    pub url: String,
    pub status: Option<u16>,
    pub elapsed_ms: u64,
    /// Leading part of the response body.
    pub sample: Option<String>,
    /// Transport failure description when no response arrived.
    pub error: Option<String>,
}
