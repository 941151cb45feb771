use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Collection — A user-named grouping of card items
// ---------------------------------------------------------------------------

/// A collection owned by exactly one uid.
///
/// `id` is unique only within the owner's namespace. `created_at` is assigned
/// by the store at commit time and never taken from the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
