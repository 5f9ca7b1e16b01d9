//! Audience and issuer are bound into the token.

use crate::auth::{TokenError, validate};
use crate::e2e_tests::helpers::*;
use crate::testing::{NOW, test_claims, test_settings};

#[test]
fn test_audience_mismatch() {
    let mut issuing = test_settings();
    issuing.audience = "A".to_string();
    let mut validating = test_settings();
    validating.audience = "B".to_string();

    let token = issue_now(&test_claims(), &issuing);
    assert_eq!(
        validate(token.as_str(), &validating, NOW),
        Err(TokenError::AudienceMismatch)
    );
}

#[test]
fn test_issuer_mismatch() {
    let mut validating = test_settings();
    validating.issuer = "someone-else".to_string();

    let token = issue_now(&test_claims(), &test_settings());
    assert_eq!(
        validate(token.as_str(), &validating, NOW),
        Err(TokenError::IssuerMismatch)
    );
}

#[test]
fn test_audience_comparison_is_exact() {
    let mut validating = test_settings();
    validating.audience = validating.audience.to_uppercase();

    let token = issue_now(&test_claims(), &test_settings());
    assert_eq!(
        validate(token.as_str(), &validating, NOW),
        Err(TokenError::AudienceMismatch)
    );
}

#[test]
fn test_matching_audience_and_issuer_accepted() {
    let mut settings = test_settings();
    settings.audience = "A".to_string();
    settings.issuer = "I".to_string();

    let token = issue_now(&test_claims(), &settings);
    assert!(validate(token.as_str(), &settings, NOW).is_ok());
}
