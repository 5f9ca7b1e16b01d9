//! `Authorization: Bearer` handling for hosts.
//!
//! Extracts the token from a header value and collapses every validation
//! failure into one [`AuthRejected`] outcome, so a client cannot tell an
//! expired token from a forged one.

use super::claims::ClaimSet;
use super::token::{self, TokenError};
use crate::config::TokenSettings;
use crate::time::Timestamp;

const BEARER_SCHEME: &str = "bearer";

/// The request is not authenticated.
///
/// Carries no detail about which check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthRejected;

impl std::fmt::Display for AuthRejected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid or missing bearer token")
    }
}

impl std::error::Error for AuthRejected {}

/// Extract the token from an `Authorization` header value.
///
/// The scheme is matched case-insensitively; surrounding whitespace is
/// ignored. Returns `None` for any other scheme or an empty token.
#[must_use]
pub fn extract_bearer(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return None;
    }
    let token = token.trim();
    if token.is_empty() || token.contains(char::is_whitespace) {
        return None;
    }
    Some(token)
}

/// Authenticate a request from its `Authorization` header value.
///
/// # Errors
/// Returns [`AuthRejected`] when the header is absent or malformed, or the
/// token fails any validation check. Configuration errors are also reported
/// as rejections here; they are logged at error level since they mean the
/// process should not have started.
pub fn authenticate(
    header_value: Option<&str>,
    settings: &TokenSettings,
    now: Timestamp,
) -> Result<ClaimSet, AuthRejected> {
    let Some(token) = header_value.and_then(extract_bearer) else {
        tracing::debug!("rejected request: no bearer token");
        return Err(AuthRejected);
    };

    token::validate(token, settings, now).map_err(|e| reject(&e))
}

/// Log the specific failure, then hide it.
fn reject(error: &TokenError) -> AuthRejected {
    if error.is_configuration() {
        tracing::error!("token settings are invalid: {error}");
    } else {
        tracing::debug!("rejected bearer token: {error}");
    }
    AuthRejected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{NOW, test_claims, test_settings};

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_bearer("bearer abc"), Some("abc"));
        assert_eq!(extract_bearer("BEARER   abc  "), Some("abc"));
        assert_eq!(extract_bearer("  Bearer abc"), Some("abc"));
    }

    #[test]
    fn test_extract_bearer_rejects_other_forms() {
        assert_eq!(extract_bearer("Basic dXNlcjpwYXNz"), None);
        assert_eq!(extract_bearer("Bearer"), None);
        assert_eq!(extract_bearer("Bearer "), None);
        assert_eq!(extract_bearer("Bearer a b"), None);
        assert_eq!(extract_bearer(""), None);
        assert_eq!(extract_bearer("abc.def.ghi"), None);
    }

    #[test]
    fn test_authenticate_success() {
        let settings = test_settings();
        let token = token::issue(&test_claims(), &settings, NOW).expect("issue");
        let header = format!("Bearer {token}");

        let claims = authenticate(Some(header.as_str()), &settings, NOW).expect("authenticated");
        assert_eq!(claims, test_claims());
    }

    #[test]
    fn test_authenticate_failures_are_indistinguishable() {
        let settings = test_settings();
        let token = token::issue(&test_claims(), &settings, NOW).expect("issue");
        let header = format!("Bearer {token}");

        let mut wrong_audience = settings.clone();
        wrong_audience.audience = "elsewhere".to_string();
        let mut wrong_secret = settings.clone();
        wrong_secret.secret_key = b"a-different-signing-secret".to_vec();

        let outcomes = [
            authenticate(None, &settings, NOW),
            authenticate(Some("Basic xyz"), &settings, NOW),
            authenticate(Some("Bearer garbage"), &settings, NOW),
            authenticate(Some(header.as_str()), &settings, NOW + 1_000_000),
            authenticate(Some(header.as_str()), &wrong_audience, NOW),
            authenticate(Some(header.as_str()), &wrong_secret, NOW),
        ];
        for outcome in outcomes {
            assert_eq!(outcome, Err(AuthRejected));
        }
    }

    #[test]
    fn test_auth_rejected_display() {
        assert_eq!(AuthRejected.to_string(), "invalid or missing bearer token");
    }
}
