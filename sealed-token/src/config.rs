//! Token settings and their loading from environment variables.
//!
//! # Environment Variables
//!
//! - `SEALED_TOKEN_SECRET_KEY`: HMAC-SHA-256 signing key, at least 16 bytes (required)
//! - `SEALED_TOKEN_ENCRYPTION_KEY`: AES-128 content key, exactly 16 bytes (required)
//! - `SEALED_TOKEN_AUDIENCE`: Audience bound into every token (required)
//! - `SEALED_TOKEN_ISSUER`: Issuer bound into every token (required)
//! - `SEALED_TOKEN_EXPIRATION_MINUTES`: Token lifetime (default: `60`)
//! - `SEALED_TOKEN_NOT_BEFORE_MINUTES`: Delay before a token becomes valid (default: `0`)
//! - `SEALED_TOKEN_CLOCK_SKEW_SECONDS`: Grace window on both time bounds (default: `0`)
//!
//! Key values are taken as their UTF-8 bytes. A value of the form
//! `base64:<data>` is decoded as standard base64 instead, for keys that are
//! not printable text.
//!
//! # Invariants
//!
//! - A `TokenSettings` that passed [`TokenSettings::validate`] has a signing
//!   key of at least 16 bytes and an encryption key of exactly 16 bytes.
//! - `not_before_minutes < expiration_minutes`, so every token has a
//!   non-empty validity window.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Minimum signing key length for HMAC-SHA-256.
pub const MIN_SECRET_KEY_LEN: usize = 16;
/// Required content key length for AES-128.
pub const ENCRYPTION_KEY_LEN: usize = 16;

const ENV_SECRET_KEY: &str = "SEALED_TOKEN_SECRET_KEY";
const ENV_ENCRYPTION_KEY: &str = "SEALED_TOKEN_ENCRYPTION_KEY";
const ENV_AUDIENCE: &str = "SEALED_TOKEN_AUDIENCE";
const ENV_ISSUER: &str = "SEALED_TOKEN_ISSUER";
const ENV_EXPIRATION_MINUTES: &str = "SEALED_TOKEN_EXPIRATION_MINUTES";
const ENV_NOT_BEFORE_MINUTES: &str = "SEALED_TOKEN_NOT_BEFORE_MINUTES";
const ENV_CLOCK_SKEW_SECONDS: &str = "SEALED_TOKEN_CLOCK_SKEW_SECONDS";

const BASE64_KEY_PREFIX: &str = "base64:";

/// Settings for issuing and validating tokens.
///
/// Treated as an immutable snapshot: a configuration change produces a new
/// `TokenSettings` rather than editing one in place (see
/// [`SettingsRegistry`](crate::auth::SettingsRegistry)).
#[derive(Clone, PartialEq, Eq)]
pub struct TokenSettings {
    /// HMAC-SHA-256 key for the token signature.
    pub secret_key: Vec<u8>,
    /// AES-128 key for the claims payload.
    pub encryption_key: Vec<u8>,
    /// Intended recipient of the token.
    pub audience: String,
    /// System that minted the token.
    pub issuer: String,
    /// Minutes from issuance until the token expires.
    pub expiration_minutes: u32,
    /// Minutes from issuance until the token becomes valid.
    pub not_before_minutes: u32,
    /// Grace window applied to both the not-before and expiry checks.
    pub clock_skew_seconds: u64,
}

/// Error returned when token settings are missing or invalid.
///
/// These errors are fatal at startup; they are never a per-request outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable is missing.
    MissingEnvVar(String),
    /// A setting has an invalid value.
    InvalidValue { name: String, message: String },
    /// The signing key is shorter than [`MIN_SECRET_KEY_LEN`].
    SecretKeyTooShort { actual: usize },
    /// The encryption key is not exactly [`ENCRYPTION_KEY_LEN`] bytes.
    EncryptionKeyLength { actual: usize },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEnvVar(name) => {
                write!(f, "missing required environment variable: {name}")
            }
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
            Self::SecretKeyTooShort { actual } => write!(
                f,
                "secret key must be at least {MIN_SECRET_KEY_LEN} bytes, got {actual}"
            ),
            Self::EncryptionKeyLength { actual } => write!(
                f,
                "encryption key must be exactly {ENCRYPTION_KEY_LEN} bytes, got {actual}"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

impl std::fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSettings")
            .field("secret_key", &format_args!("<{} bytes>", self.secret_key.len()))
            .field(
                "encryption_key",
                &format_args!("<{} bytes>", self.encryption_key.len()),
            )
            .field("audience", &self.audience)
            .field("issuer", &self.issuer)
            .field("expiration_minutes", &self.expiration_minutes)
            .field("not_before_minutes", &self.not_before_minutes)
            .field("clock_skew_seconds", &self.clock_skew_seconds)
            .finish()
    }
}

impl TokenSettings {
    /// Default token lifetime.
    pub const DEFAULT_EXPIRATION_MINUTES: u32 = 60;
    /// Default not-before delay.
    pub const DEFAULT_NOT_BEFORE_MINUTES: u32 = 0;
    /// Default clock skew. Zero: no grace window on either bound.
    pub const DEFAULT_CLOCK_SKEW_SECONDS: u64 = 0;

    /// Build settings from their parts and validate them.
    ///
    /// The clock skew starts at [`Self::DEFAULT_CLOCK_SKEW_SECONDS`]; use
    /// [`Self::with_clock_skew`] to change it.
    ///
    /// # Errors
    ///
    /// Returns an error if any constraint listed in the module docs is violated.
    pub fn new(
        secret_key: impl Into<Vec<u8>>,
        encryption_key: impl Into<Vec<u8>>,
        audience: impl Into<String>,
        issuer: impl Into<String>,
        expiration_minutes: u32,
        not_before_minutes: u32,
    ) -> Result<Self, ConfigError> {
        let settings = Self {
            secret_key: secret_key.into(),
            encryption_key: encryption_key.into(),
            audience: audience.into(),
            issuer: issuer.into(),
            expiration_minutes,
            not_before_minutes,
            clock_skew_seconds: Self::DEFAULT_CLOCK_SKEW_SECONDS,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Return a copy of these settings with a different clock skew.
    #[must_use]
    pub const fn with_clock_skew(mut self, clock_skew_seconds: u64) -> Self {
        self.clock_skew_seconds = clock_skew_seconds;
        self
    }

    /// Check every settings constraint.
    ///
    /// Fields are public, so a `TokenSettings` can be built without going
    /// through [`Self::new`]; issuance and validation call this before
    /// touching key material.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret_key.len() < MIN_SECRET_KEY_LEN {
            return Err(ConfigError::SecretKeyTooShort {
                actual: self.secret_key.len(),
            });
        }
        if self.encryption_key.len() != ENCRYPTION_KEY_LEN {
            return Err(ConfigError::EncryptionKeyLength {
                actual: self.encryption_key.len(),
            });
        }
        if self.audience.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "audience".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.issuer.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "issuer".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.expiration_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                name: "expiration_minutes".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.not_before_minutes >= self.expiration_minutes {
            return Err(ConfigError::InvalidValue {
                name: "not_before_minutes".to_string(),
                message: format!(
                    "{} must be less than expiration_minutes ({})",
                    self.not_before_minutes, self.expiration_minutes
                ),
            });
        }
        Ok(())
    }

    /// Load settings from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing, a value does not
    /// parse, or the resulting settings fail [`Self::validate`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    ///
    /// [`Self::from_env`] passes `std::env::var`; tests pass a map.
    ///
    /// # Errors
    ///
    /// Same as [`Self::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret_key = decode_key(ENV_SECRET_KEY, &required(&lookup, ENV_SECRET_KEY)?)?;
        let encryption_key =
            decode_key(ENV_ENCRYPTION_KEY, &required(&lookup, ENV_ENCRYPTION_KEY)?)?;
        let audience = required(&lookup, ENV_AUDIENCE)?;
        let issuer = required(&lookup, ENV_ISSUER)?;
        let expiration_minutes = optional_number(
            &lookup,
            ENV_EXPIRATION_MINUTES,
            Self::DEFAULT_EXPIRATION_MINUTES,
        )?;
        let not_before_minutes = optional_number(
            &lookup,
            ENV_NOT_BEFORE_MINUTES,
            Self::DEFAULT_NOT_BEFORE_MINUTES,
        )?;
        let clock_skew_seconds = optional_number(
            &lookup,
            ENV_CLOCK_SKEW_SECONDS,
            Self::DEFAULT_CLOCK_SKEW_SECONDS,
        )?;

        let settings = Self {
            secret_key,
            encryption_key,
            audience,
            issuer,
            expiration_minutes,
            not_before_minutes,
            clock_skew_seconds,
        };
        settings.validate()?;
        Ok(settings)
    }
}

/// Read a required, non-empty variable.
fn required<F>(lookup: &F, name: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(name).ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))?;
    if value.is_empty() {
        return Err(ConfigError::InvalidValue {
            name: name.to_string(),
            message: "must not be empty".to_string(),
        });
    }
    Ok(value)
}

/// Read an optional numeric variable, falling back to `default` when unset.
fn optional_number<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(name).map_or_else(
        || Ok(default),
        |value| {
            value.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
                name: name.to_string(),
                message: format!("'{value}' is not a valid non-negative integer"),
            })
        },
    )
}

/// Turn a configured key string into key bytes.
fn decode_key(name: &str, value: &str) -> Result<Vec<u8>, ConfigError> {
    value.strip_prefix(BASE64_KEY_PREFIX).map_or_else(
        || Ok(value.as_bytes().to_vec()),
        |encoded| {
            STANDARD
                .decode(encoded.trim())
                .map_err(|e| ConfigError::InvalidValue {
                    name: name.to_string(),
                    message: format!("invalid base64 key: {e}"),
                })
        },
    )
}
