//! At-rest encryption for order contact fields.
//!
//! Sealed values are AES-256-GCM with a fresh random nonce per value,
//! base64-armored behind a `gl1:` version prefix. Values without the prefix
//! are legacy plaintext from before encryption was introduced and are
//! returned as-is rather than rejected.

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::RngCore;
use thiserror::Error;

/// Version prefix for sealed values.
const PREFIX: &str = "gl1:";

/// AES-GCM nonce length in bytes.
const NONCE_LEN: usize = 12;

/// Errors from sealing or opening contact fields.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The key is not exactly 32 bytes.
    #[error("contact key must be exactly {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// A prefixed value is not valid base64 / too short to hold a nonce.
    #[error("sealed value is malformed")]
    Malformed,

    /// A prefixed value failed AES-GCM authentication.
    #[error("sealed value failed authentication")]
    Authentication,

    /// Encryption itself failed (should not happen in practice).
    #[error("encryption failed")]
    Encryption,
}

/// Symmetric cipher for order contact fields.
#[derive(Clone)]
pub struct ContactCipher {
    cipher: Aes256Gcm,
}

impl ContactCipher {
    /// Required key length in bytes.
    pub const KEY_LEN: usize = 32;

    /// Create a cipher from a raw 32-byte key.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidKeyLength` for any other key size.
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        if key.len() != Self::KEY_LEN {
            return Err(CryptoError::InvalidKeyLength {
                expected: Self::KEY_LEN,
                actual: key.len(),
            });
        }
        let key = Key::<Aes256Gcm>::from_slice(key);
        Ok(Self {
            cipher: Aes256Gcm::new(key),
        })
    }

    /// Encrypt a plaintext value for storage.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::Encryption` if the underlying AEAD fails.
    pub fn seal(&self, plaintext: &str) -> Result<String, CryptoError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| CryptoError::Encryption)?;

        let mut raw = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        raw.extend_from_slice(&nonce_bytes);
        raw.extend_from_slice(&ciphertext);

        Ok(format!("{PREFIX}{}", BASE64.encode(raw)))
    }

    /// Encrypt an optional value, passing `None` through.
    ///
    /// # Errors
    ///
    /// Same as [`ContactCipher::seal`].
    pub fn seal_opt(&self, plaintext: Option<&str>) -> Result<Option<String>, CryptoError> {
        plaintext.map(|p| self.seal(p)).transpose()
    }

    /// Decrypt a stored value.
    ///
    /// Values without the `gl1:` prefix are legacy plaintext and come back
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::Malformed` for prefixed values that do not
    /// decode, and `CryptoError::Authentication` when the ciphertext fails
    /// AES-GCM verification.
    pub fn open(&self, stored: &str) -> Result<String, CryptoError> {
        let Some(armored) = stored.strip_prefix(PREFIX) else {
            return Ok(stored.to_owned());
        };

        let raw = BASE64.decode(armored).map_err(|_| CryptoError::Malformed)?;
        if raw.len() < NONCE_LEN {
            return Err(CryptoError::Malformed);
        }
        let (nonce_bytes, ciphertext) = raw.split_at(NONCE_LEN);

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| CryptoError::Authentication)?;

        String::from_utf8(plaintext).map_err(|_| CryptoError::Malformed)
    }

    /// Decrypt an optional stored value, passing `None` through.
    ///
    /// # Errors
    ///
    /// Same as [`ContactCipher::open`].
    pub fn open_opt(&self, stored: Option<&str>) -> Result<Option<String>, CryptoError> {
        stored.map(|s| self.open(s)).transpose()
    }
}

impl std::fmt::Debug for ContactCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContactCipher").finish_non_exhaustive()
    }
}
