//! Query normalization for the upstream card search syntax.
//!
//! The upstream accepts a Lucene-like `q` parameter (`name:char*`,
//! `set.name:"Base"`, `AND` / `OR`). Plain text is turned into a name prefix
//! match; anything that already uses the syntax is passed through verbatim.

use crate::config::{MAX_SEARCH_LIMIT, MIN_SEARCH_LIMIT};
use crate::models::SearchFilter;

/// Whether `query` already uses the structured syntax.
pub fn looks_advanced(query: &str) -> bool {
    query.contains([':', '*', '"'])
}

/// Normalize free text into an upstream query. Blank input yields `None`.
pub fn normalize_query(query: &str) -> Option<String> {
    let query = query.trim();
    if query.is_empty() {
        None
    } else if looks_advanced(query) {
        Some(query.to_string())
    } else {
        Some(format!("name:{}*", query))
    }
}

/// Escape a value for embedding between double quotes.
pub fn escape_quoted(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Combine the normalized text query with the structured filter.
///
/// Returns `None` when neither contributes anything, i.e. an unfiltered browse.
pub fn build_query(query: &str, filter: &SearchFilter) -> Option<String> {
    let text = normalize_query(query);
    let set_clause = filter
        .set_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("set.name:\"{}\"", escape_quoted(s)));

    match (text, set_clause) {
        (Some(q), Some(f)) => Some(format!("({}) AND {}", q, f)),
        (Some(q), None) => Some(q),
        (None, Some(f)) => Some(f),
        (None, None) => None,
    }
}

/// Clamp a caller-supplied limit into the supported page size range.
pub fn clamp_limit(limit: usize) -> usize {
    limit.clamp(MIN_SEARCH_LIMIT, MAX_SEARCH_LIMIT)
}
