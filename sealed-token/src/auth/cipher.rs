//! Content encryption for token payloads.
//!
//! AES-128-CBC with PKCS#7 padding, authenticated encrypt-then-MAC with
//! HMAC-SHA-256 truncated to 16 bytes (the `A128CBC-HS256` construction).
//! The AES key is the configured 16-byte encryption key; the MAC key is
//! derived from it so a single configured key drives both halves.
//!
//! # Invariants
//! - Every call to [`seal`] draws a fresh random IV.
//! - [`open`] checks the tag in constant time before touching the ciphertext.

use aes::Aes128;
use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use crate::config::ENCRYPTION_KEY_LEN;

type HmacSha256 = Hmac<Sha256>;
type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;

/// Content encryption algorithm identifier.
pub const CONTENT_ALGORITHM: &str = "A128CBC-HS256";
/// IV size for AES-CBC.
pub const IV_LEN: usize = 16;
/// Truncated HMAC tag size.
pub const TAG_LEN: usize = 16;

const MAC_KEY_LABEL: &[u8] = b"sealed-token content mac";

/// Error returned by the content cipher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CipherError {
    /// The key is not [`ENCRYPTION_KEY_LEN`] bytes.
    InvalidKey,
    /// The IV or tag has the wrong length.
    InvalidLength,
    /// The authentication tag does not match.
    TagMismatch,
    /// The ciphertext decrypted to invalid padding.
    Padding,
}

impl std::fmt::Display for CipherError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidKey => write!(f, "content key must be {ENCRYPTION_KEY_LEN} bytes"),
            Self::InvalidLength => write!(f, "invalid IV or tag length"),
            Self::TagMismatch => write!(f, "content authentication tag mismatch"),
            Self::Padding => write!(f, "invalid ciphertext padding"),
        }
    }
}

impl std::error::Error for CipherError {}

/// Output of [`seal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    pub iv: Vec<u8>,
    pub ciphertext: Vec<u8>,
    pub tag: Vec<u8>,
}

/// Encrypt and authenticate `plaintext`, binding `aad`.
pub fn seal(key: &[u8], plaintext: &[u8], aad: &[u8]) -> Result<Sealed, CipherError> {
    let mut iv = [0u8; IV_LEN];
    rand::rng().fill_bytes(&mut iv);

    let ciphertext = Aes128CbcEnc::new_from_slices(key, &iv)
        .map_err(|_| CipherError::InvalidKey)?
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);
    let tag = compute_tag(key, aad, &iv, &ciphertext)?
        .finalize()
        .into_bytes()[..TAG_LEN]
        .to_vec();

    Ok(Sealed {
        iv: iv.to_vec(),
        ciphertext,
        tag,
    })
}

/// Verify and decrypt a sealed payload.
pub fn open(key: &[u8], sealed: &Sealed, aad: &[u8]) -> Result<Vec<u8>, CipherError> {
    if sealed.iv.len() != IV_LEN || sealed.tag.len() != TAG_LEN {
        return Err(CipherError::InvalidLength);
    }

    compute_tag(key, aad, &sealed.iv, &sealed.ciphertext)?
        .verify_truncated_left(&sealed.tag)
        .map_err(|_| CipherError::TagMismatch)?;

    Aes128CbcDec::new_from_slices(key, &sealed.iv)
        .map_err(|_| CipherError::InvalidKey)?
        .decrypt_padded_vec_mut::<Pkcs7>(&sealed.ciphertext)
        .map_err(|_| CipherError::Padding)
}

/// MAC over `aad || iv || ciphertext || bit_length(aad)` (64-bit big endian).
fn compute_tag(
    key: &[u8],
    aad: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
) -> Result<HmacSha256, CipherError> {
    if key.len() != ENCRYPTION_KEY_LEN {
        return Err(CipherError::InvalidKey);
    }
    let mac_key = derive_mac_key(key)?;
    let aad_bits = (aad.len() as u64).saturating_mul(8);

    let mut mac = HmacSha256::new_from_slice(&mac_key).map_err(|_| CipherError::InvalidKey)?;
    mac.update(aad);
    mac.update(iv);
    mac.update(ciphertext);
    mac.update(&aad_bits.to_be_bytes());
    Ok(mac)
}

fn derive_mac_key(key: &[u8]) -> Result<Vec<u8>, CipherError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| CipherError::InvalidKey)?;
    mac.update(MAC_KEY_LABEL);
    Ok(mac.finalize().into_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"0123456789abcdef";
    const AAD: &[u8] = CONTENT_ALGORITHM.as_bytes();

    #[test]
    fn test_seal_open() {
        let sealed = seal(KEY, b"hello claims", AAD).expect("seal");
        assert_eq!(sealed.iv.len(), IV_LEN);
        assert_eq!(sealed.tag.len(), TAG_LEN);
        assert_eq!(sealed.ciphertext.len() % 16, 0);

        let plaintext = open(KEY, &sealed, AAD).expect("open");
        assert_eq!(plaintext, b"hello claims");
    }

    #[test]
    fn test_fresh_iv_per_call() {
        let a = seal(KEY, b"same input", AAD).expect("seal");
        let b = seal(KEY, b"same input", AAD).expect("seal");

        assert_ne!(a.iv, b.iv);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_wrong_key_fails_tag() {
        let sealed = seal(KEY, b"secret", AAD).expect("seal");
        let result = open(b"fedcba9876543210", &sealed, AAD);
        assert_eq!(result, Err(CipherError::TagMismatch));
    }

    #[test]
    fn test_aad_is_bound() {
        let sealed = seal(KEY, b"secret", AAD).expect("seal");
        let result = open(KEY, &sealed, b"other");
        assert_eq!(result, Err(CipherError::TagMismatch));
    }

    #[test]
    fn test_tampered_ciphertext_fails_tag() {
        let mut sealed = seal(KEY, b"secret payload", AAD).expect("seal");
        sealed.ciphertext[0] ^= 0x01;
        assert_eq!(open(KEY, &sealed, AAD), Err(CipherError::TagMismatch));
    }

    #[test]
    fn test_tampered_iv_fails_tag() {
        let mut sealed = seal(KEY, b"secret payload", AAD).expect("seal");
        sealed.iv[15] ^= 0x80;
        assert_eq!(open(KEY, &sealed, AAD), Err(CipherError::TagMismatch));
    }

    #[test]
    fn test_short_tag_rejected() {
        let mut sealed = seal(KEY, b"secret", AAD).expect("seal");
        sealed.tag.truncate(8);
        assert_eq!(open(KEY, &sealed, AAD), Err(CipherError::InvalidLength));
    }

    #[test]
    fn test_bad_key_length() {
        assert_eq!(seal(b"short", b"x", AAD), Err(CipherError::InvalidKey));
    }

    #[test]
    fn test_empty_plaintext() {
        let sealed = seal(KEY, b"", AAD).expect("seal");
        assert_eq!(sealed.ciphertext.len(), 16);
        assert_eq!(open(KEY, &sealed, AAD).expect("open"), b"");
    }
}
