//! A configured clock skew widens both time bounds by the same amount.

use crate::auth::{TokenError, validate};
use crate::e2e_tests::helpers::*;
use crate::testing::{NOW, test_claims};

#[test]
fn test_skew_extends_expiry() {
    let settings = settings_with_window(10, 0).with_clock_skew(30);
    let token = issue_now(&test_claims(), &settings);

    assert!(validate(token.as_str(), &settings, NOW + 630).is_ok());
    assert_eq!(
        validate(token.as_str(), &settings, NOW + 631),
        Err(TokenError::TokenExpired)
    );
}

#[test]
fn test_skew_allows_early_use() {
    let settings = settings_with_window(10, 2).with_clock_skew(30);
    let token = issue_now(&test_claims(), &settings);

    assert!(validate(token.as_str(), &settings, NOW + 90).is_ok());
    assert_eq!(
        validate(token.as_str(), &settings, NOW + 89),
        Err(TokenError::TokenNotYetValid)
    );
}

#[test]
fn test_skew_applies_on_validating_side_only() {
    let issuing = settings_with_window(10, 0);
    let validating = settings_with_window(10, 0).with_clock_skew(5);
    let token = issue_now(&test_claims(), &issuing);

    assert!(validate(token.as_str(), &validating, NOW + 605).is_ok());
    assert_eq!(
        validate(token.as_str(), &issuing, NOW + 605),
        Err(TokenError::TokenExpired)
    );
}
