//! Any single-bit change to a token is rejected without yielding claims.

use crate::auth::{TokenError, validate};
use crate::e2e_tests::helpers::*;
use crate::testing::{NOW, test_claims, test_settings};

#[test]
fn test_every_single_bit_flip_is_rejected() {
    let settings = test_settings();
    let token = issue_now(&test_claims(), &settings);
    let bytes = token.as_str().as_bytes();

    for position in 0..bytes.len() {
        // Bits 0..=6 keep the byte ASCII, so the result is still a string.
        for bit in 0..7 {
            let mut tampered = bytes.to_vec();
            tampered[position] ^= 1 << bit;
            let Ok(tampered) = String::from_utf8(tampered) else {
                continue;
            };

            let result = validate(&tampered, &settings, NOW);
            assert!(
                matches!(
                    result,
                    Err(TokenError::MalformedToken
                        | TokenError::InvalidSignature
                        | TokenError::DecryptionFailure)
                ),
                "flip at byte {position} bit {bit} gave {result:?}"
            );
        }
    }
}

#[test]
fn test_truncated_token_rejected() {
    let settings = test_settings();
    let token = issue_now(&test_claims(), &settings);
    let text = token.as_str();

    for cut in [1, 10, text.len() / 2, text.len() - 1] {
        assert!(validate(&text[..cut], &settings, NOW).is_err());
    }
}

#[test]
fn test_swapped_payload_rejected() {
    // Payload from one token under the header and signature of another.
    let settings = test_settings();
    let a = issue_now(&claims_for(1), &settings);
    let b = issue_now(&claims_for(2), &settings);

    let a_parts: Vec<&str> = a.as_str().split('.').collect();
    let b_parts: Vec<&str> = b.as_str().split('.').collect();
    let spliced = format!("{}.{}.{}", a_parts[0], b_parts[1], a_parts[2]);

    assert_eq!(
        validate(&spliced, &settings, NOW),
        Err(TokenError::InvalidSignature)
    );
}

#[test]
fn test_appended_data_rejected() {
    let settings = test_settings();
    let token = issue_now(&test_claims(), &settings);

    assert_eq!(
        validate(&format!("{token}.extra"), &settings, NOW),
        Err(TokenError::MalformedToken)
    );
}

#[test]
fn test_undecodable_payload_is_malformed() {
    let settings = test_settings();
    let token = issue_now(&test_claims(), &settings);
    let parts: Vec<&str> = token.as_str().split('.').collect();

    // Not base64url, base64url of "not json", and JSON without envelope fields.
    for payload in ["@@@not-base64@@@", "bm90IGpzb24", "eyJzdWIiOiJtYWxsb3J5In0"] {
        let spliced = format!("{}.{payload}.{}", parts[0], parts[2]);
        assert_eq!(
            validate(&spliced, &settings, NOW),
            Err(TokenError::MalformedToken),
            "payload {payload}"
        );
    }
}

#[test]
fn test_undecodable_signature_is_malformed() {
    let settings = test_settings();
    let token = issue_now(&test_claims(), &settings);
    let parts: Vec<&str> = token.as_str().split('.').collect();

    let spliced = format!("{}.{}.!!sig!!", parts[0], parts[1]);
    assert_eq!(
        validate(&spliced, &settings, NOW),
        Err(TokenError::MalformedToken)
    );
}
