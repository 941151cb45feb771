//! Shared fixtures for the StackTrack integration tests.
//!
//! Every fixture builds an in-memory or temp-file store. The catalog is
//! pointed at a proxied base URL so no API key is needed; catalog tests pass
//! the URL of their own mock server instead.

#![allow(dead_code)]

use stacktrack::models::VerifiedUser;
use stacktrack::{CatalogConfig, IdentityVerifier, Result, StackTrack, StackTrackError};
use std::path::Path;
use std::time::Duration;

/// Catalog settings that skip the API key requirement.
pub fn offline_catalog() -> CatalogConfig {
    CatalogConfig::default()
        .base_url("http://127.0.0.1:9/v2")
        .proxied(true)
        .retry_backoff(Duration::from_millis(10))
}

/// Fresh in-memory instance.
pub fn memory_stack() -> StackTrack {
    StackTrack::builder().catalog(offline_catalog()).build().unwrap()
}

/// Instance persisted under `path`.
pub fn file_stack(path: &Path) -> StackTrack {
    StackTrack::builder()
        .db_path(path)
        .catalog(offline_catalog())
        .build()
        .unwrap()
}

/// Verifier accepting a fixed set of `token -> user` pairs.
pub struct StaticVerifier {
    users: Vec<(String, VerifiedUser)>,
}

impl StaticVerifier {
    pub fn new() -> Self {
        Self { users: Vec::new() }
    }

    pub fn with(mut self, token: &str, uid: &str, email: Option<&str>, name: Option<&str>) -> Self {
        self.users.push((
            token.to_string(),
            VerifiedUser {
                uid: uid.to_string(),
                email: email.map(str::to_string),
                name: name.map(str::to_string),
            },
        ));
        self
    }
}

impl IdentityVerifier for StaticVerifier {
    fn verify(&self, credential: &str) -> Result<VerifiedUser> {
        self.users
            .iter()
            .find(|(token, _)| token == credential)
            .map(|(_, user)| user.clone())
            .ok_or_else(|| StackTrackError::Unauthorized("unknown token".to_string()))
    }
}
