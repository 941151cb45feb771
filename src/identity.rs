//! Identity verification seam.
//!
//! Token verification itself lives outside this crate; callers pass in an
//! [`IdentityVerifier`] and the facade only consumes the verified identity.

use crate::error::{Result, StackTrackError};
use crate::models::VerifiedUser;

const BEARER_PREFIX: &str = "Bearer ";

/// Turns an opaque bearer credential into a verified identity.
pub trait IdentityVerifier: Send + Sync {
    /// Fails with [`StackTrackError::Unauthorized`] when the credential is rejected.
    fn verify(&self, credential: &str) -> Result<VerifiedUser>;
}

/// Extract the credential from an `Authorization` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str> {
    let header = header
        .ok_or_else(|| StackTrackError::Unauthorized("missing bearer token".to_string()))?;
    let token = header
        .strip_prefix(BEARER_PREFIX)
        .ok_or_else(|| StackTrackError::Unauthorized("malformed authorization header".to_string()))?
        .trim();
    if token.is_empty() {
        return Err(StackTrackError::Unauthorized("empty bearer token".to_string()));
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_token_after_prefix() {
        assert_eq!(bearer_token(Some("Bearer abc.def")).unwrap(), "abc.def");
    }

    #[test]
    fn rejects_missing_malformed_and_empty_headers() {
        for header in [None, Some("Basic abc"), Some("Bearer   "), Some("bearer abc")] {
            assert!(matches!(
                bearer_token(header),
                Err(StackTrackError::Unauthorized(_))
            ));
        }
    }
}
