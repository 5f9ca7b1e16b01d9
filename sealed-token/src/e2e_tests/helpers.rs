//! Common helpers for end-to-end tests.

use crate::auth::{ClaimSet, IssuedToken, issue};
use crate::config::TokenSettings;
use crate::testing::{NOW, test_settings};

/// Settings with a custom validity window.
pub fn settings_with_window(expiration_minutes: u32, not_before_minutes: u32) -> TokenSettings {
    TokenSettings {
        expiration_minutes,
        not_before_minutes,
        ..test_settings()
    }
}

/// A distinct claim set for index `i`.
#[allow(clippy::expect_used)]
pub fn claims_for(i: usize) -> ClaimSet {
    let mut claims = ClaimSet::new();
    claims.push("sub", format!("user-{i}")).expect("sub");
    claims.push("name", format!("name-{i}")).expect("name");
    for r in 0..(i % 3) {
        claims.push("role", format!("role-{i}-{r}")).expect("role");
    }
    claims
}

/// Issue at [`NOW`] with the given settings.
#[allow(clippy::expect_used)]
pub fn issue_now(claims: &ClaimSet, settings: &TokenSettings) -> IssuedToken {
    issue(claims, settings, NOW).expect("issue")
}
