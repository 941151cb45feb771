//! Offline card catalog loaded from a bundled JSON file.
//!
//! The file is a JSON array of card entries (`id`, `name`, `setName`,
//! `imageSmall`, `rarity`, `number`; other fields are ignored). Searches are a
//! case-insensitive substring match over name, set name, rarity and number,
//! returned in file order.

use std::fs;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::query::clamp_limit;
use crate::config::DEFAULT_SEARCH_LIMIT;
use crate::error::Result;
use crate::models::SearchResultItem;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeedCard {
    id: Option<String>,
    name: Option<String>,
    set_name: Option<String>,
    image_small: Option<String>,
    rarity: Option<String>,
    number: Option<String>,
}

impl SeedCard {
    fn matches(&self, needle: &str) -> bool {
        [&self.name, &self.set_name, &self.rarity, &self.number]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(needle))
    }

    fn to_result(&self) -> Option<SearchResultItem> {
        Some(SearchResultItem {
            id: self.id.clone()?,
            name: self.name.clone(),
            set_name: self.set_name.clone(),
            image_url: self.image_small.clone(),
            price_usd: None,
            price_updated_at: None,
        })
    }
}

/// In-memory card list searched without touching the network.
#[derive(Debug, Clone)]
pub struct SeedCatalog {
    cards: Vec<SeedCard>,
}

impl SeedCatalog {
    /// Parse a JSON array of seed cards.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cards: Vec<SeedCard> = serde_json::from_str(json)?;
        Ok(Self::from_cards(cards))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let cards: Vec<SeedCard> = serde_json::from_reader(reader)?;
        Ok(Self::from_cards(cards))
    }

    /// Load the catalog from a file on disk.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&raw)?;
        tracing::info!(path = %path.display(), cards = catalog.len(), "loaded seed catalog");
        Ok(catalog)
    }

    fn from_cards(cards: Vec<SeedCard>) -> Self {
        let missing = cards.iter().filter(|c| c.id.is_none()).count();
        if missing > 0 {
            tracing::warn!(missing, "seed catalog entries without an id are never returned");
        }
        Self { cards }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Cards matching `query`, at most `limit` (clamped to 1..=50, 10 when `None`).
    ///
    /// A blank query returns the first entries unfiltered.
    pub fn search(&self, query: &str, limit: impl Into<Option<usize>>) -> Vec<SearchResultItem> {
        let limit = clamp_limit(limit.into().unwrap_or(DEFAULT_SEARCH_LIMIT));
        let needle = query.trim().to_lowercase();

        self.cards
            .iter()
            .filter(|card| needle.is_empty() || card.matches(&needle))
            .filter_map(SeedCard::to_result)
            .take(limit)
            .collect()
    }
}
