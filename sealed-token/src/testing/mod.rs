//! Shared fixtures for unit and end-to-end tests.

use crate::auth::ClaimSet;
use crate::config::TokenSettings;
use crate::time::Timestamp;

/// A fixed issuance time (November 2023).
pub const NOW: Timestamp = 1_700_000_000;

/// Valid settings: 10 minute lifetime, no not-before delay, no skew.
pub fn test_settings() -> TokenSettings {
    TokenSettings {
        secret_key: b"test-secret-key-that-is-long-enough".to_vec(),
        encryption_key: b"test-enc-key-16b".to_vec(),
        audience: "orders-api".to_string(),
        issuer: "identity-service".to_string(),
        expiration_minutes: 10,
        not_before_minutes: 0,
        clock_skew_seconds: 0,
    }
}

/// A typical user claim set with repeated roles.
#[allow(clippy::expect_used)]
pub fn test_claims() -> ClaimSet {
    ClaimSet::from_pairs([
        ("sub", "user-42"),
        ("name", "alice"),
        ("email", "alice@example.com"),
        ("role", "admin"),
        ("role", "auditor"),
        ("tenant", "acme"),
    ])
    .expect("fixture claims are valid")
}
