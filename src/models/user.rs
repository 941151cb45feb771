use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity produced by an [`IdentityVerifier`](crate::identity::IdentityVerifier).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedUser {
    pub uid: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Profile record kept in the `users` namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub updated_at: DateTime<Utc>,
}
