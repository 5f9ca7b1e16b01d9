//! Not-before is inclusive: invalid one second early, valid exactly at `nbf`.

use crate::auth::{TokenError, validate};
use crate::e2e_tests::helpers::*;
use crate::testing::{NOW, test_claims};

#[test]
fn test_not_yet_valid_one_second_early() {
    let settings = settings_with_window(10, 2);
    let token = issue_now(&test_claims(), &settings);

    assert_eq!(
        validate(token.as_str(), &settings, NOW + 119),
        Err(TokenError::TokenNotYetValid)
    );
}

#[test]
fn test_valid_at_exact_not_before() {
    let settings = settings_with_window(10, 2);
    let token = issue_now(&test_claims(), &settings);

    assert!(validate(token.as_str(), &settings, NOW + 120).is_ok());
}

#[test]
fn test_not_yet_valid_at_issuance() {
    let settings = settings_with_window(10, 2);
    let token = issue_now(&test_claims(), &settings);

    assert_eq!(
        validate(token.as_str(), &settings, NOW),
        Err(TokenError::TokenNotYetValid)
    );
}

#[test]
fn test_zero_not_before_valid_immediately() {
    let settings = settings_with_window(10, 0);
    let token = issue_now(&test_claims(), &settings);

    assert!(validate(token.as_str(), &settings, NOW).is_ok());
}

#[test]
fn test_before_issuance_is_not_yet_valid() {
    let settings = settings_with_window(10, 0);
    let token = issue_now(&test_claims(), &settings);

    assert_eq!(
        validate(token.as_str(), &settings, NOW - 1),
        Err(TokenError::TokenNotYetValid)
    );
}
