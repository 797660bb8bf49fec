//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `GEARLOOM_DATABASE_URL` - SQLite connection string (e.g.,
//!   `sqlite://gearloom.db`)
//! - `GEARLOOM_CONTACT_KEY` - base64-encoded 32-byte key for encrypting
//!   order contact fields at rest
//!
//! ## Optional
//! - `RUST_LOG` - tracing filter (consumed by the CLI's subscriber)

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::crypto::ContactCipher;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Clone)]
pub struct StorefrontConfig {
    /// SQLite database connection URL
    pub database_url: SecretString,
    /// Contact-field encryption key (base64, 32 bytes decoded)
    pub contact_key: SecretString,
}

impl std::fmt::Debug for StorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontConfig")
            .field("database_url", &"[REDACTED]")
            .field("contact_key", &"[REDACTED]")
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads a `.env` file first if one is present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` for absent required variables and
    /// `ConfigError::InvalidEnvVar` when the contact key does not decode to
    /// 32 bytes.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let database_url = require_env("GEARLOOM_DATABASE_URL")?;
        let contact_key = require_env("GEARLOOM_CONTACT_KEY")?;

        let config = Self {
            database_url: SecretString::from(database_url),
            contact_key: SecretString::from(contact_key),
        };

        // Fail at startup, not on the first order.
        config.contact_cipher()?;

        Ok(config)
    }

    /// Build the contact-field cipher from the configured key.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the key is not valid base64
    /// or does not decode to exactly 32 bytes.
    pub fn contact_cipher(&self) -> Result<ContactCipher, ConfigError> {
        let key = BASE64.decode(self.contact_key.expose_secret()).map_err(|e| {
            ConfigError::InvalidEnvVar("GEARLOOM_CONTACT_KEY".to_owned(), e.to_string())
        })?;

        ContactCipher::new(&key).map_err(|e| {
            ConfigError::InvalidEnvVar("GEARLOOM_CONTACT_KEY".to_owned(), e.to_string())
        })
    }
}

fn require_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_owned()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_cipher_rejects_short_key() {
        let config = StorefrontConfig {
            database_url: SecretString::from("sqlite::memory:"),
            contact_key: SecretString::from(BASE64.encode([0u8; 16])),
        };
        assert!(matches!(
            config.contact_cipher(),
            Err(ConfigError::InvalidEnvVar(..))
        ));
    }

    #[test]
    fn test_contact_cipher_accepts_32_byte_key() {
        let config = StorefrontConfig {
            database_url: SecretString::from("sqlite::memory:"),
            contact_key: SecretString::from(BASE64.encode([7u8; 32])),
        };
        assert!(config.contact_cipher().is_ok());
    }
}
