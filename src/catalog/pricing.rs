//! Mapping of upstream card records into [`SearchResultItem`]s.

use serde_json::Value;

use crate::config::PRICE_VARIANTS;
use crate::models::SearchResultItem;

/// Pick the market price from a `tcgplayer.prices` object.
///
/// Variants are tried in [`PRICE_VARIANTS`] order and the first one with a
/// numeric, non-negative `market` value wins. Returns `None` when no variant
/// has one, which means "no market price", not zero.
pub fn pick_price(prices: &Value) -> Option<f64> {
    PRICE_VARIANTS
        .iter()
        .find_map(|variant| prices.get(*variant).and_then(market))
}

fn market(variant: &Value) -> Option<f64> {
    variant
        .get("market")
        .and_then(Value::as_f64)
        .filter(|p| p.is_finite() && *p >= 0.0)
}

fn text(node: Option<&Value>, field: &str) -> Option<String> {
    node.and_then(|n| n.get(field))
        .and_then(Value::as_str)
        .map(|s| s.to_string())
}

/// Project one upstream card record. Records without an `id` yield `None`.
pub fn card_from_record(record: &Value) -> Option<SearchResultItem> {
    let id = text(Some(record), "id")?;
    let tcgplayer = record.get("tcgplayer");

    Some(SearchResultItem {
        id,
        name: text(Some(record), "name"),
        set_name: text(record.get("set"), "name"),
        image_url: text(record.get("images"), "small"),
        price_usd: tcgplayer.and_then(|t| t.get("prices")).and_then(pick_price),
        price_updated_at: text(tcgplayer, "updatedAt"),
    })
}
