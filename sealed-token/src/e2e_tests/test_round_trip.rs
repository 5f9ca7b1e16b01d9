//! Validation returns exactly the claims that were issued.

use crate::auth::{ClaimSet, validate};
use crate::e2e_tests::helpers::*;
use crate::testing::{NOW, test_claims, test_settings};

#[test]
fn test_round_trip_typical_claims() {
    let settings = test_settings();
    let token = issue_now(&test_claims(), &settings);

    assert_eq!(validate(token.as_str(), &settings, NOW), Ok(test_claims()));
}

#[test]
fn test_round_trip_many_shapes() {
    let settings = test_settings();
    for i in 0..20 {
        let claims = claims_for(i);
        let token = issue_now(&claims, &settings);
        assert_eq!(validate(token.as_str(), &settings, NOW + 60), Ok(claims));
    }
}

#[test]
fn test_round_trip_unicode_and_punctuation() {
    let settings = test_settings();
    let claims = ClaimSet::from_pairs([
        ("sub", "ユーザー-1"),
        ("display", "Zoë \"Z\" O'Neil"),
        ("path", "a.b.c/d?e=f&g"),
        ("empty", ""),
    ])
    .expect("claims");

    let token = issue_now(&claims, &settings);
    assert_eq!(validate(token.as_str(), &settings, NOW), Ok(claims));
}

#[test]
fn test_validation_is_repeatable() {
    let settings = test_settings();
    let token = issue_now(&test_claims(), &settings);

    let first = validate(token.as_str(), &settings, NOW);
    let second = validate(token.as_str(), &settings, NOW);
    assert_eq!(first, second);
    assert!(first.is_ok());
}

#[test]
fn test_large_claim_value() {
    let settings = test_settings();
    let big = "x".repeat(8 * 1024);
    let claims = ClaimSet::from_pairs([("sub", "1"), ("blob", big.as_str())]).expect("claims");

    let token = issue_now(&claims, &settings);
    assert_eq!(validate(token.as_str(), &settings, NOW), Ok(claims));
}
