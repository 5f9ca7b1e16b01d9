//! Sealed token issuance and validation.
//!
//! A token is a compact HS256 JWS whose payload is an encrypted envelope.
//! The envelope holds the claim set together with `iss`, `aud`, `iat`,
//! `nbf` and `exp`, encrypted with the content cipher in
//! [`cipher`](super::cipher).
//!
//! ```text
//! base64url(header) . base64url(envelope) . base64url(hmac_sha256)
//! header   = {"typ":"JWT","alg":"HS256","cty":"JWE"}
//! envelope = {"enc":"A128CBC-HS256","iv":..,"ciphertext":..,"tag":..}
//! ```
//!
//! # Pre-conditions
//! - `settings` must pass [`TokenSettings::validate`]; both operations check
//!   this first and fail with [`TokenError::Configuration`] otherwise.
//!
//! # Post-conditions
//! - `validate(issue(c, s, t), s, t')` returns `c` unchanged for any `t'`
//!   inside the token's validity window.
//!
//! # Invariants
//! - Both operations are pure functions of their arguments apart from the
//!   random IV drawn during issuance.
//! - Validation checks run in a fixed order and stop at the first failure.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, decode_header, encode,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::cipher::{self, CONTENT_ALGORITHM, Sealed};
use super::claims::ClaimSet;
use crate::config::{ConfigError, TokenSettings};
use crate::time::Timestamp;

/// `typ` header value.
pub const TOKEN_TYPE: &str = "JWT";
/// `cty` header value marking an encrypted payload.
pub const CONTENT_TYPE: &str = "JWE";

const SECONDS_PER_MINUTE: u64 = 60;

/// Error returned when issuing or validating a token fails.
///
/// Every variant except [`Configuration`](Self::Configuration) and
/// [`Encoding`](Self::Encoding) means "request unauthenticated". Hosts
/// should report all of them identically; see
/// [`bearer::authenticate`](super::bearer::authenticate).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The settings' key material or fields are invalid.
    Configuration(ConfigError),
    /// The token does not have the expected header/payload/signature shape.
    MalformedToken,
    /// The signature does not verify under the secret key.
    InvalidSignature,
    /// The payload does not decrypt under the encryption key.
    DecryptionFailure,
    /// `iat`, `nbf` or `exp` is absent or not an integer.
    MissingTemporalClaims,
    /// The current time is before `nbf`.
    TokenNotYetValid,
    /// The current time is after `exp`.
    TokenExpired,
    /// The token's audience differs from the configured one.
    AudienceMismatch,
    /// The token's issuer differs from the configured one.
    IssuerMismatch,
    /// The token could not be serialized during issuance.
    Encoding(String),
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(e) => write!(f, "token configuration error: {e}"),
            Self::MalformedToken => write!(f, "malformed token"),
            Self::InvalidSignature => write!(f, "invalid token signature"),
            Self::DecryptionFailure => write!(f, "token payload could not be decrypted"),
            Self::MissingTemporalClaims => write!(f, "missing or invalid iat/nbf/exp claims"),
            Self::TokenNotYetValid => write!(f, "token is not yet valid"),
            Self::TokenExpired => write!(f, "token has expired"),
            Self::AudienceMismatch => write!(f, "token audience mismatch"),
            Self::IssuerMismatch => write!(f, "token issuer mismatch"),
            Self::Encoding(reason) => write!(f, "token encoding failed: {reason}"),
        }
    }
}

impl std::error::Error for TokenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Configuration(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for TokenError {
    fn from(e: ConfigError) -> Self {
        Self::Configuration(e)
    }
}

impl TokenError {
    /// Whether this error comes from bad settings rather than a bad token.
    ///
    /// Configuration errors should abort startup, not reject a request.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

/// A serialized token. Opaque to callers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IssuedToken(String);

impl IssuedToken {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for IssuedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for IssuedToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Signed outer payload.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    enc: String,
    iv: String,
    ciphertext: String,
    tag: String,
}

/// Plaintext written at issuance.
#[derive(Serialize)]
struct SealedClaims<'a> {
    iss: &'a str,
    aud: &'a str,
    iat: Timestamp,
    nbf: Timestamp,
    exp: Timestamp,
    claims: &'a ClaimSet,
}

/// Plaintext read at validation. Temporal fields stay loosely typed so a
/// missing or non-integer value is reported as such rather than as a
/// decryption failure.
#[derive(Deserialize)]
struct OpenedClaims {
    iss: Option<String>,
    aud: Option<String>,
    iat: Option<Value>,
    nbf: Option<Value>,
    exp: Option<Value>,
    claims: ClaimSet,
}

/// Issue a token for `claims` at time `now`.
///
/// The output differs on every call because each token gets a fresh IV.
///
/// # Errors
/// Returns [`TokenError::Configuration`] if `settings` are invalid and
/// [`TokenError::Encoding`] if serialization fails.
pub fn issue(
    claims: &ClaimSet,
    settings: &TokenSettings,
    now: Timestamp,
) -> Result<IssuedToken, TokenError> {
    settings.validate()?;

    let nbf = now.saturating_add(u64::from(settings.not_before_minutes) * SECONDS_PER_MINUTE);
    let exp = now.saturating_add(u64::from(settings.expiration_minutes) * SECONDS_PER_MINUTE);

    let plaintext = serde_json::to_vec(&SealedClaims {
        iss: &settings.issuer,
        aud: &settings.audience,
        iat: now,
        nbf,
        exp,
        claims,
    })
    .map_err(|e| TokenError::Encoding(format!("claims: {e}")))?;

    let sealed = cipher::seal(
        &settings.encryption_key,
        &plaintext,
        CONTENT_ALGORITHM.as_bytes(),
    )
    .map_err(|e| TokenError::Encoding(format!("encrypt: {e}")))?;

    let envelope = Envelope {
        enc: CONTENT_ALGORITHM.to_string(),
        iv: URL_SAFE_NO_PAD.encode(&sealed.iv),
        ciphertext: URL_SAFE_NO_PAD.encode(&sealed.ciphertext),
        tag: URL_SAFE_NO_PAD.encode(&sealed.tag),
    };

    let mut header = Header::new(Algorithm::HS256);
    header.typ = Some(TOKEN_TYPE.to_string());
    header.cty = Some(CONTENT_TYPE.to_string());

    let token = encode(
        &header,
        &envelope,
        &EncodingKey::from_secret(&settings.secret_key),
    )
    .map_err(|e| TokenError::Encoding(format!("jwt encode: {e}")))?;

    tracing::debug!(
        "issued token with {} claims, nbf={nbf}, exp={exp}",
        claims.len()
    );
    Ok(IssuedToken(token))
}

/// Validate `token` at time `now` and return its claims.
///
/// # Errors
/// Returns the first failed check, in this order: configuration,
/// [`MalformedToken`](TokenError::MalformedToken),
/// [`InvalidSignature`](TokenError::InvalidSignature),
/// [`DecryptionFailure`](TokenError::DecryptionFailure),
/// [`MissingTemporalClaims`](TokenError::MissingTemporalClaims),
/// [`TokenNotYetValid`](TokenError::TokenNotYetValid),
/// [`TokenExpired`](TokenError::TokenExpired),
/// [`AudienceMismatch`](TokenError::AudienceMismatch),
/// [`IssuerMismatch`](TokenError::IssuerMismatch).
pub fn validate(
    token: &str,
    settings: &TokenSettings,
    now: Timestamp,
) -> Result<ClaimSet, TokenError> {
    settings.validate()?;

    check_structure(token)?;
    let envelope = verify_signature(token, &settings.secret_key)?;
    let opened = open_envelope(&envelope, &settings.encryption_key)?;

    let (Some(_iat), Some(nbf), Some(exp)) = (
        opened.iat.as_ref().and_then(Value::as_u64),
        opened.nbf.as_ref().and_then(Value::as_u64),
        opened.exp.as_ref().and_then(Value::as_u64),
    ) else {
        return Err(TokenError::MissingTemporalClaims);
    };

    let skew = settings.clock_skew_seconds;
    if now.saturating_add(skew) < nbf {
        return Err(TokenError::TokenNotYetValid);
    }
    if now > exp.saturating_add(skew) {
        return Err(TokenError::TokenExpired);
    }

    if opened.aud.as_deref() != Some(settings.audience.as_str()) {
        return Err(TokenError::AudienceMismatch);
    }
    if opened.iss.as_deref() != Some(settings.issuer.as_str()) {
        return Err(TokenError::IssuerMismatch);
    }

    Ok(opened.claims)
}

/// Check the three-segment shape, the header fields, and that the payload
/// and signature segments decode, all before any key is used.
fn check_structure(token: &str) -> Result<(), TokenError> {
    let segments: Vec<&str> = token.split('.').collect();
    let &[header, payload, signature] = segments.as_slice() else {
        return Err(TokenError::MalformedToken);
    };
    if header.is_empty() || payload.is_empty() || signature.is_empty() {
        return Err(TokenError::MalformedToken);
    }

    let header = decode_header(token).map_err(|_| TokenError::MalformedToken)?;
    if header.alg != Algorithm::HS256 || header.cty.as_deref() != Some(CONTENT_TYPE) {
        return Err(TokenError::MalformedToken);
    }

    URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| TokenError::MalformedToken)?;
    let payload = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| TokenError::MalformedToken)?;
    serde_json::from_slice::<Envelope>(&payload).map_err(|_| TokenError::MalformedToken)?;
    Ok(())
}

/// Verify the HS256 signature and return the signed envelope.
fn verify_signature(token: &str, secret: &[u8]) -> Result<Envelope, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    // Time, audience and issuer live inside the encrypted payload and are
    // checked after decryption.
    validation.required_spec_claims.clear();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;

    decode::<Envelope>(token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims)
        .map_err(map_jwt_error)
}

/// Decrypt the envelope and parse the plaintext.
fn open_envelope(envelope: &Envelope, key: &[u8]) -> Result<OpenedClaims, TokenError> {
    if envelope.enc != CONTENT_ALGORITHM {
        return Err(TokenError::DecryptionFailure);
    }

    let decode_field =
        |field: &str| URL_SAFE_NO_PAD.decode(field).map_err(|_| TokenError::DecryptionFailure);
    let sealed = Sealed {
        iv: decode_field(&envelope.iv)?,
        ciphertext: decode_field(&envelope.ciphertext)?,
        tag: decode_field(&envelope.tag)?,
    };

    let plaintext = cipher::open(key, &sealed, CONTENT_ALGORITHM.as_bytes())
        .map_err(|_| TokenError::DecryptionFailure)?;
    serde_json::from_slice(&plaintext).map_err(|_| TokenError::DecryptionFailure)
}

/// Maps jsonwebtoken errors to our `TokenError` type.
fn map_jwt_error(error: jsonwebtoken::errors::Error) -> TokenError {
    use jsonwebtoken::errors::ErrorKind;

    match error.kind() {
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        // InvalidToken, InvalidAlgorithm, Base64, Json, Utf8 and anything newer.
        _ => TokenError::MalformedToken,
    }
}
