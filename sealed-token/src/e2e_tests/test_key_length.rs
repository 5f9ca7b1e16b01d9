//! Key material is checked before any token work.

use crate::auth::{TokenError, issue, validate};
use crate::config::ConfigError;
use crate::testing::{NOW, test_claims, test_settings};

#[test]
fn test_fifteen_byte_encryption_key_rejected_at_issuance() {
    let mut settings = test_settings();
    settings.encryption_key = vec![7u8; 15];

    assert_eq!(
        issue(&test_claims(), &settings, NOW),
        Err(TokenError::Configuration(ConfigError::EncryptionKeyLength {
            actual: 15
        }))
    );
}

#[test]
fn test_seventeen_byte_encryption_key_rejected() {
    let mut settings = test_settings();
    settings.encryption_key = vec![7u8; 17];

    assert!(matches!(
        issue(&test_claims(), &settings, NOW),
        Err(TokenError::Configuration(ConfigError::EncryptionKeyLength { actual: 17 }))
    ));
}

#[test]
fn test_fifteen_byte_secret_rejected() {
    let mut settings = test_settings();
    settings.secret_key = vec![1u8; 15];

    assert!(matches!(
        issue(&test_claims(), &settings, NOW),
        Err(TokenError::Configuration(ConfigError::SecretKeyTooShort { actual: 15 }))
    ));
}

#[test]
fn test_sixteen_byte_secret_accepted() {
    let mut settings = test_settings();
    settings.secret_key = vec![1u8; 16];

    let token = issue(&test_claims(), &settings, NOW).expect("issue");
    assert!(validate(token.as_str(), &settings, NOW).is_ok());
}

#[test]
fn test_binary_keys_accepted() {
    let mut settings = test_settings();
    settings.secret_key = (0u8..32).collect();
    settings.encryption_key = vec![0xff; 16];

    let token = issue(&test_claims(), &settings, NOW).expect("issue");
    assert_eq!(validate(token.as_str(), &settings, NOW), Ok(test_claims()));
}
