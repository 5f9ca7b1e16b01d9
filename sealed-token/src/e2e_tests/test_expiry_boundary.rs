//! Expiry is inclusive: valid at exactly `exp`, expired one second later.

use crate::auth::{TokenError, validate};
use crate::e2e_tests::helpers::*;
use crate::testing::{NOW, test_claims};

#[test]
fn test_valid_at_exact_expiry() {
    let settings = settings_with_window(10, 0);
    let token = issue_now(&test_claims(), &settings);

    assert!(validate(token.as_str(), &settings, NOW + 600).is_ok());
}

#[test]
fn test_expired_one_second_after() {
    let settings = settings_with_window(10, 0);
    let token = issue_now(&test_claims(), &settings);

    assert_eq!(
        validate(token.as_str(), &settings, NOW + 601),
        Err(TokenError::TokenExpired)
    );
}

#[test]
fn test_expired_long_after() {
    let settings = settings_with_window(1, 0);
    let token = issue_now(&test_claims(), &settings);

    assert_eq!(
        validate(token.as_str(), &settings, NOW + 86_400),
        Err(TokenError::TokenExpired)
    );
}

#[test]
fn test_validator_lifetime_does_not_matter() {
    // exp is fixed at issuance; a longer lifetime on the validating side
    // does not extend it.
    let token = issue_now(&test_claims(), &settings_with_window(10, 0));
    let validating = settings_with_window(120, 0);

    assert_eq!(
        validate(token.as_str(), &validating, NOW + 601),
        Err(TokenError::TokenExpired)
    );
}
