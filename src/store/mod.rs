//! User-scoped persistence on top of the DuckDB [`Connection`](crate::connection::Connection).
//!
//! The tables model a hierarchical document namespace:
//! `users/{uid}`, `users/{uid}/collections/{id}` and
//! `users/{uid}/collections/{collection_id}/items/{id}`. Every row carries its
//! full ownership path and every query filters on it, so nothing is reachable
//! outside the owning uid.
//!
//! Each wrapper borrows the connection and is cheap to create per call.

pub mod collections;
pub mod items;
pub mod profiles;

pub use collections::CollectionStore;
pub use items::ItemStore;
pub use profiles::ProfileStore;

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::connection::{Connection, Row};
use crate::error::{Result, StackTrackError};

/// Length of generated document ids.
pub const DOCUMENT_ID_LEN: usize = 20;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    uid VARCHAR PRIMARY KEY,
    email VARCHAR,
    name VARCHAR,
    updated_at_us BIGINT
);
CREATE TABLE IF NOT EXISTS collections (
    uid VARCHAR NOT NULL,
    id VARCHAR NOT NULL,
    name VARCHAR,
    created_at_us BIGINT,
    PRIMARY KEY (uid, id)
);
CREATE TABLE IF NOT EXISTS items (
    uid VARCHAR NOT NULL,
    collection_id VARCHAR NOT NULL,
    id VARCHAR NOT NULL,
    card_id VARCHAR,
    name VARCHAR,
    set_name VARCHAR,
    image_url VARCHAR,
    price_usd DOUBLE,
    price_updated_at VARCHAR,
    added_at_us BIGINT,
    PRIMARY KEY (uid, collection_id, id)
);
"#;

/// Create the tables if missing and seed the commit clock from existing rows.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;

    let latest = conn
        .execute_scalar(
            "SELECT GREATEST(
                COALESCE((SELECT MAX(created_at_us) FROM collections), 0),
                COALESCE((SELECT MAX(added_at_us) FROM items), 0),
                COALESCE((SELECT MAX(updated_at_us) FROM users), 0)
            )",
            &[],
        )?
        .and_then(|v| v.as_i64())
        .unwrap_or(0);
    conn.observe_commit_time(latest)?;

    tracing::info!(latest_commit_us = latest, "store schema ready");
    Ok(())
}

/// Generate a random alphanumeric document id.
pub fn new_document_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(DOCUMENT_ID_LEN)
        .map(char::from)
        .collect()
}

// ---------------------------------------------------------------------------
// Row decoding helpers
// ---------------------------------------------------------------------------

/// Optional text column; missing, null and non-text values all read as `None`.
pub(crate) fn opt_str(row: &Row, col: &str) -> Option<String> {
    row.get(col).and_then(|v| v.as_str()).map(|s| s.to_string())
}

/// Required text column; absence means the record itself is unreadable.
pub(crate) fn req_str(row: &Row, col: &str, what: &str) -> Result<String> {
    opt_str(row, col)
        .ok_or_else(|| StackTrackError::StoreCorrupt(format!("{} is missing `{}`", what, col)))
}

pub(crate) fn opt_f64(row: &Row, col: &str) -> Option<f64> {
    row.get(col).and_then(|v| v.as_f64())
}

/// Timestamp column in microseconds; a missing value reads as the Unix epoch.
pub(crate) fn timestamp(row: &Row, col: &str) -> DateTime<Utc> {
    row.get(col)
        .and_then(|v| v.as_i64())
        .and_then(DateTime::from_timestamp_micros)
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Trim a user-supplied string, mapping blank to `None`.
pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
