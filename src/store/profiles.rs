//! Profile records under `users/{uid}`.

use duckdb::params;

use super::{non_blank, opt_str, req_str, timestamp};
use crate::connection::{Connection, Row};
use crate::error::{Result, StackTrackError};
use crate::models::{UserProfile, VerifiedUser};
use crate::sql_builder::SqlBuilder;

/// Profile operations for one connection.
pub struct ProfileStore<'a> {
    conn: &'a Connection,
}

impl<'a> ProfileStore<'a> {
    /// Create a new `ProfileStore` bound to the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Merge the verified identity into the user's profile, creating it if absent.
    ///
    /// Email and name are only overwritten when the identity carries them;
    /// `updated_at` is refreshed on every call.
    pub fn upsert(&self, user: &VerifiedUser) -> Result<UserProfile> {
        let uid = user.uid.as_str();
        let email = non_blank(user.email.as_deref());
        let name = non_blank(user.name.as_deref());

        self.conn.commit(|w| {
            w.execute(
                "INSERT INTO users (uid, email, name, updated_at_us) VALUES (?, ?, ?, ?) \
                 ON CONFLICT (uid) DO UPDATE SET \
                 email = COALESCE(EXCLUDED.email, email), \
                 name = COALESCE(EXCLUDED.name, name), \
                 updated_at_us = EXCLUDED.updated_at_us",
                params![uid, email, name, w.commit_us()],
            )?;

            let rows = w.query(
                "SELECT uid, email, name, updated_at_us FROM users WHERE uid = ?",
                params![uid],
            )?;
            match rows.first() {
                Some(row) => profile_from_row(row),
                None => Err(StackTrackError::StoreCorrupt(format!(
                    "profile {} vanished after upsert",
                    uid
                ))),
            }
        })
    }

    /// Fetch a profile, or `None` if the user was never seen.
    pub fn get(&self, uid: &str) -> Result<Option<UserProfile>> {
        let (sql, params) = SqlBuilder::new("users")
            .select(&["uid", "email", "name", "updated_at_us"])
            .where_eq("uid", uid)
            .limit(1)
            .build();

        let rows = self.conn.execute(&sql, &params)?;
        rows.first().map(profile_from_row).transpose()
    }
}

fn profile_from_row(row: &Row) -> Result<UserProfile> {
    Ok(UserProfile {
        uid: req_str(row, "uid", "profile")?,
        email: opt_str(row, "email"),
        name: opt_str(row, "name"),
        updated_at: timestamp(row, "updated_at_us"),
    })
}
