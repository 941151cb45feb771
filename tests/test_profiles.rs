//! Integration tests for identity resolution and profile upkeep.

mod common;

use common::StaticVerifier;
use stacktrack::models::VerifiedUser;
use stacktrack::StackTrackError;
use tracing_test::traced_test;

fn verifier() -> StaticVerifier {
    StaticVerifier::new()
        .with("tok-ash", "u-ash", Some("ash@example.com"), Some("Ash"))
        .with("tok-anon", "u-anon", None, None)
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

#[test]
fn authenticate_resolves_user_and_creates_profile() {
    let st = common::memory_stack();
    let user = st.authenticate(&verifier(), Some("Bearer tok-ash")).unwrap();
    assert_eq!(user.uid, "u-ash");

    let profile = st.profiles().get("u-ash").unwrap().unwrap();
    assert_eq!(profile.email.as_deref(), Some("ash@example.com"));
    assert_eq!(profile.name.as_deref(), Some("Ash"));
}

#[test]
fn me_does_not_touch_profiles() {
    let st = common::memory_stack();
    let user = st.me(&verifier(), Some("Bearer tok-ash")).unwrap();
    assert_eq!(user.email.as_deref(), Some("ash@example.com"));
    assert!(st.profiles().get("u-ash").unwrap().is_none());
}

#[test]
fn bad_credentials_are_unauthorized() {
    let st = common::memory_stack();
    for header in [None, Some("Bearer wrong"), Some("tok-ash"), Some("Bearer ")] {
        let err = st.authenticate(&verifier(), header).unwrap_err();
        assert!(matches!(err, StackTrackError::Unauthorized(_)), "{:?}", header);
    }
    assert!(st.profiles().get("u-ash").unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Profile upsert
// ---------------------------------------------------------------------------

#[test]
fn upsert_keeps_known_fields_when_identity_lacks_them() {
    let st = common::memory_stack();
    let full = VerifiedUser {
        uid: "u1".to_string(),
        email: Some("misty@example.com".to_string()),
        name: Some("Misty".to_string()),
    };
    let first = st.profiles().upsert(&full).unwrap();

    let partial = VerifiedUser {
        uid: "u1".to_string(),
        email: None,
        name: Some("  ".to_string()),
    };
    let second = st.profiles().upsert(&partial).unwrap();

    assert_eq!(second.email.as_deref(), Some("misty@example.com"));
    assert_eq!(second.name.as_deref(), Some("Misty"));
    assert!(second.updated_at > first.updated_at);
}

#[test]
fn upsert_overwrites_with_new_values() {
    let st = common::memory_stack();
    let mut user = VerifiedUser {
        uid: "u1".to_string(),
        email: Some("old@example.com".to_string()),
        name: None,
    };
    st.profiles().upsert(&user).unwrap();

    user.email = Some("new@example.com".to_string());
    user.name = Some("Brock".to_string());
    let profile = st.profiles().upsert(&user).unwrap();
    assert_eq!(profile.email.as_deref(), Some("new@example.com"));
    assert_eq!(profile.name.as_deref(), Some("Brock"));
}

#[test]
fn anonymous_identity_gets_an_empty_profile() {
    let st = common::memory_stack();
    st.authenticate(&verifier(), Some("Bearer tok-anon")).unwrap();
    let profile = st.profiles().get("u-anon").unwrap().unwrap();
    assert_eq!(profile.email, None);
    assert_eq!(profile.name, None);
}

// ---------------------------------------------------------------------------
// Best-effort upkeep
// ---------------------------------------------------------------------------

#[test]
#[traced_test]
fn profile_failure_does_not_fail_authentication() {
    let st = common::memory_stack();
    st.connection().execute_batch("DROP TABLE users").unwrap();

    let user = st.authenticate(&verifier(), Some("Bearer tok-ash")).unwrap();
    assert_eq!(user.uid, "u-ash");
    assert!(logs_contain("profile upkeep failed"));

    // The store keeps serving other requests
    st.collections().create("u-ash", "Still works").unwrap();
}
