//! Unit tests for the SqlBuilder query construction.

use stacktrack::SqlBuilder;

// ---------------------------------------------------------------------------
// Basic construction
// ---------------------------------------------------------------------------

#[test]
fn new_creates_select_star_from_table() {
    let (sql, params) = SqlBuilder::new("collections").build();
    assert_eq!(sql, "SELECT *\nFROM collections");
    assert!(params.is_empty());
}

#[test]
fn select_replaces_default_star() {
    let (sql, _) = SqlBuilder::new("collections").select(&["id", "name"]).build();
    assert!(sql.starts_with("SELECT id, name\n"));
}

// ---------------------------------------------------------------------------
// WHERE conditions
// ---------------------------------------------------------------------------

#[test]
fn where_eq_conditions_are_anded_in_order() {
    let (sql, params) = SqlBuilder::new("items")
        .where_eq("uid", "u1")
        .where_eq("collection_id", "c1")
        .build();
    assert!(sql.contains("WHERE uid = ? AND collection_id = ?"));
    assert_eq!(params, vec!["u1", "c1"]);
}

#[test]
fn values_are_never_interpolated() {
    let (sql, params) = SqlBuilder::new("collections")
        .where_eq("name", "'; DROP TABLE items; --")
        .build();
    assert!(!sql.contains("DROP"));
    assert_eq!(params.len(), 1);
}

// ---------------------------------------------------------------------------
// Clause ordering
// ---------------------------------------------------------------------------

#[test]
fn join_comes_before_where() {
    let (sql, _) = SqlBuilder::new("items i")
        .join("JOIN collections c ON c.id = i.collection_id")
        .where_eq("i.uid", "u1")
        .build();
    let join = sql.find("JOIN").unwrap();
    let filter = sql.find("WHERE").unwrap();
    assert!(join < filter);
    assert!(sql.contains("FROM items i\n"));
}

#[test]
fn order_by_and_limit_are_appended_last() {
    let (sql, _) = SqlBuilder::new("collections")
        .where_eq("uid", "u1")
        .order_by(&["created_at_us DESC NULLS LAST", "rowid ASC"])
        .limit(1)
        .build();
    assert!(sql.ends_with("ORDER BY created_at_us DESC NULLS LAST, rowid ASC\nLIMIT 1"));
}
