//! Card item storage, scoped to `users/{uid}/collections/{collection_id}/items`.

use duckdb::params;

use super::{new_document_id, non_blank, opt_f64, opt_str, req_str, timestamp};
use crate::connection::{Connection, Row};
use crate::error::{Result, StackTrackError};
use crate::models::{CollectionCardItem, NewCardItem};
use crate::sql_builder::SqlBuilder;

const COLUMNS: [&str; 8] = [
    "i.id",
    "i.card_id",
    "i.name",
    "i.set_name",
    "i.image_url",
    "i.price_usd",
    "i.price_updated_at",
    "i.added_at_us",
];

/// Items are only visible while their parent collection exists.
const PARENT_JOIN: &str = "JOIN collections c ON c.uid = i.uid AND c.id = i.collection_id";

/// Card item operations for one connection.
pub struct ItemStore<'a> {
    conn: &'a Connection,
}

impl<'a> ItemStore<'a> {
    /// Create a new `ItemStore` bound to the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Items of one collection, most recently added first.
    ///
    /// A collection that does not exist (or was deleted) lists as empty.
    /// Unreadable rows are skipped with a warning.
    pub fn list(&self, uid: &str, collection_id: &str) -> Result<Vec<CollectionCardItem>> {
        let (sql, params) = SqlBuilder::new("items i")
            .select(&COLUMNS)
            .join(PARENT_JOIN)
            .where_eq("i.uid", uid)
            .where_eq("i.collection_id", collection_id)
            .order_by(&["i.added_at_us DESC NULLS LAST", "i.rowid ASC"])
            .build();

        let rows = self.conn.execute(&sql, &params)?;
        Ok(rows
            .iter()
            .filter_map(|row| match item_from_row(row) {
                Ok(item) => Some(item),
                Err(e) => {
                    tracing::warn!(uid, collection_id, error = %e, "skipping unreadable item");
                    None
                }
            })
            .collect())
    }

    /// Add a card snapshot to a collection.
    ///
    /// `card_id` is required; blank optional strings are stored as null. The
    /// same card may be added any number of times, each add yielding a new item.
    pub fn add(
        &self,
        uid: &str,
        collection_id: &str,
        candidate: &NewCardItem,
    ) -> Result<CollectionCardItem> {
        let card_id = candidate.card_id.trim();
        if card_id.is_empty() {
            return Err(StackTrackError::Validation("cardId must not be blank".to_string()));
        }
        if let Some(price) = candidate.price_usd {
            if !price.is_finite() || price < 0.0 {
                return Err(StackTrackError::Validation(format!(
                    "priceUSD must be a non-negative amount, got {}",
                    price
                )));
            }
        }

        let name = non_blank(candidate.name.as_deref());
        let set_name = non_blank(candidate.set_name.as_deref());
        let image_url = non_blank(candidate.image_url.as_deref());
        let price_updated_at = non_blank(candidate.price_updated_at.as_deref());
        let id = new_document_id();

        let item = self.conn.commit(|w| {
            let parent = w.query(
                "SELECT id FROM collections WHERE uid = ? AND id = ?",
                params![uid, collection_id],
            )?;
            if parent.is_empty() {
                return Err(StackTrackError::NotFound(format!(
                    "collection {} does not exist",
                    collection_id
                )));
            }

            let added_at_us = w.commit_us();
            w.execute(
                "INSERT INTO items (uid, collection_id, id, card_id, name, set_name, image_url, \
                 price_usd, price_updated_at, added_at_us) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    uid,
                    collection_id,
                    id,
                    card_id,
                    name,
                    set_name,
                    image_url,
                    candidate.price_usd,
                    price_updated_at,
                    added_at_us
                ],
            )?;

            let rows = w.query(
                "SELECT id, card_id, name, set_name, image_url, price_usd, price_updated_at, added_at_us \
                 FROM items WHERE uid = ? AND collection_id = ? AND id = ?",
                params![uid, collection_id, id],
            )?;
            match rows.first() {
                Some(row) => item_from_row(row),
                None => Err(StackTrackError::StoreCorrupt(format!(
                    "item {} vanished after insert",
                    id
                ))),
            }
        })?;

        tracing::debug!(uid, collection_id, item_id = %item.id, card_id = %item.card_id, "added item");
        Ok(item)
    }

    /// Remove one item. Removing a missing item is not an error.
    pub fn delete(&self, uid: &str, collection_id: &str, item_id: &str) -> Result<()> {
        let removed = self.conn.commit(|w| {
            w.execute(
                "DELETE FROM items WHERE uid = ? AND collection_id = ? AND id = ?",
                params![uid, collection_id, item_id],
            )
        })?;

        tracing::debug!(uid, collection_id, item_id, removed, "deleted item");
        Ok(())
    }

    /// Remove items of `uid` whose collection no longer exists.
    ///
    /// Collection deletes never cascade; this is the cleanup a background job
    /// runs afterwards. Returns the number of items removed.
    pub fn purge_orphans(&self, uid: &str) -> Result<usize> {
        let removed = self.conn.commit(|w| {
            w.execute(
                "DELETE FROM items WHERE uid = ? AND NOT EXISTS (\
                 SELECT 1 FROM collections c WHERE c.uid = items.uid AND c.id = items.collection_id)",
                params![uid],
            )
        })?;

        if removed > 0 {
            tracing::info!(uid, removed, "purged orphaned items");
        }
        Ok(removed)
    }
}

fn item_from_row(row: &Row) -> Result<CollectionCardItem> {
    Ok(CollectionCardItem {
        id: req_str(row, "id", "item")?,
        card_id: req_str(row, "card_id", "item")?,
        name: opt_str(row, "name"),
        set_name: opt_str(row, "set_name"),
        image_url: opt_str(row, "image_url"),
        price_usd: opt_f64(row, "price_usd"),
        price_updated_at: opt_str(row, "price_updated_at"),
        added_at: timestamp(row, "added_at_us"),
    })
}
