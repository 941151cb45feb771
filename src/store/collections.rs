//! Collection storage, scoped to `users/{uid}/collections`.

use duckdb::params;

use super::{new_document_id, req_str, timestamp};
use crate::connection::{Connection, Row};
use crate::error::{Result, StackTrackError};
use crate::models::Collection;
use crate::sql_builder::SqlBuilder;

const COLUMNS: [&str; 3] = ["id", "name", "created_at_us"];

/// Newest first; rows sharing a timestamp keep their insertion order.
const ORDER: [&str; 2] = ["created_at_us DESC NULLS LAST", "rowid ASC"];

/// Collection operations for one connection.
pub struct CollectionStore<'a> {
    conn: &'a Connection,
}

impl<'a> CollectionStore<'a> {
    /// Create a new `CollectionStore` bound to the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// All collections of `uid`, newest first. Not paginated.
    ///
    /// Rows that cannot be decoded are skipped with a warning so the rest of
    /// the listing stays reachable.
    pub fn list(&self, uid: &str) -> Result<Vec<Collection>> {
        let (sql, params) = SqlBuilder::new("collections")
            .select(&COLUMNS)
            .where_eq("uid", uid)
            .order_by(&ORDER)
            .build();

        let rows = self.conn.execute(&sql, &params)?;
        Ok(rows
            .iter()
            .filter_map(|row| match collection_from_row(row) {
                Ok(c) => Some(c),
                Err(e) => {
                    tracing::warn!(uid, error = %e, "skipping unreadable collection");
                    None
                }
            })
            .collect())
    }

    /// Fetch one collection, or `None` if `uid` has no collection `id`.
    pub fn get(&self, uid: &str, id: &str) -> Result<Option<Collection>> {
        let (sql, params) = SqlBuilder::new("collections")
            .select(&COLUMNS)
            .where_eq("uid", uid)
            .where_eq("id", id)
            .limit(1)
            .build();

        let rows = self.conn.execute(&sql, &params)?;
        rows.first().map(collection_from_row).transpose()
    }

    /// Create a collection named `name` (trimmed, must not be blank).
    ///
    /// The returned `created_at` is read back from the committed row.
    pub fn create(&self, uid: &str, name: &str) -> Result<Collection> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StackTrackError::Validation(
                "collection name must not be blank".to_string(),
            ));
        }

        let id = new_document_id();
        let collection = self.conn.commit(|w| {
            let created_at_us = w.commit_us();
            w.execute(
                "INSERT INTO collections (uid, id, name, created_at_us) VALUES (?, ?, ?, ?)",
                params![uid, id, name, created_at_us],
            )?;

            let rows = w.query(
                "SELECT id, name, created_at_us FROM collections WHERE uid = ? AND id = ?",
                params![uid, id],
            )?;
            match rows.first() {
                Some(row) => collection_from_row(row),
                None => Err(StackTrackError::StoreCorrupt(format!(
                    "collection {} vanished after insert",
                    id
                ))),
            }
        })?;

        tracing::debug!(uid, collection_id = %collection.id, "created collection");
        Ok(collection)
    }

    /// Delete collection `id` of `uid`. Deleting a missing id is not an error.
    ///
    /// Items stored under the collection are left in place; they are no longer
    /// listed and can be removed with [`ItemStore::purge_orphans`](super::ItemStore::purge_orphans).
    pub fn delete(&self, uid: &str, id: &str) -> Result<()> {
        let removed = self.conn.commit(|w| {
            w.execute(
                "DELETE FROM collections WHERE uid = ? AND id = ?",
                params![uid, id],
            )
        })?;

        tracing::debug!(uid, collection_id = id, removed, "deleted collection");
        Ok(())
    }
}

fn collection_from_row(row: &Row) -> Result<Collection> {
    Ok(Collection {
        id: req_str(row, "id", "collection")?,
        name: req_str(row, "name", "collection")?,
        created_at: timestamp(row, "created_at_us"),
    })
}
