use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::search::SearchResultItem;

// ---------------------------------------------------------------------------
// CollectionCardItem — A denormalized catalog snapshot stored in a collection
// ---------------------------------------------------------------------------

/// A card placed inside a collection.
///
/// Every field except `id`, `card_id` and `added_at` is a display snapshot
/// copied at add time; none of them track the catalog afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionCardItem {
    pub id: String,
    pub card_id: String,
    pub name: Option<String>,
    pub set_name: Option<String>,
    pub image_url: Option<String>,
    #[serde(rename = "priceUSD")]
    pub price_usd: Option<f64>,
    /// Upstream tag for when the price was taken. Stored verbatim.
    pub price_updated_at: Option<String>,
    pub added_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// NewCardItem — Candidate passed to `ItemStore::add`
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCardItem {
    pub card_id: String,
    pub name: Option<String>,
    pub set_name: Option<String>,
    pub image_url: Option<String>,
    #[serde(rename = "priceUSD")]
    pub price_usd: Option<f64>,
    pub price_updated_at: Option<String>,
}

impl NewCardItem {
    /// Candidate with only the catalog id set.
    pub fn new(card_id: impl Into<String>) -> Self {
        Self {
            card_id: card_id.into(),
            ..Self::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn set_name(mut self, set_name: impl Into<String>) -> Self {
        self.set_name = Some(set_name.into());
        self
    }

    pub fn image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    pub fn price(mut self, price_usd: f64, updated_at: Option<&str>) -> Self {
        self.price_usd = Some(price_usd);
        self.price_updated_at = updated_at.map(str::to_string);
        self
    }
}

impl From<SearchResultItem> for NewCardItem {
    fn from(card: SearchResultItem) -> Self {
        Self {
            card_id: card.id,
            name: card.name,
            set_name: card.set_name,
            image_url: card.image_url,
            price_usd: card.price_usd,
            price_updated_at: card.price_updated_at,
        }
    }
}
