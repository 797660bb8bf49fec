//! Library-level error type.
//!
//! User-facing failures (validation problems, stock conflicts, not-found,
//! invalid transitions) are not errors - they are variants of the workflow
//! outcome enums in [`crate::models`]. `StorefrontError` covers the cases
//! the caller cannot recover from locally: the database or the cipher
//! misbehaving.

use thiserror::Error;

use crate::crypto::CryptoError;
use crate::db::RepositoryError;

/// Infrastructure-level error for storefront workflows.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Database operation failed.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Contact field encryption/decryption failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Checkout draft payload could not be (de)serialized.
    #[error("draft serialization error: {0}")]
    DraftSerialization(#[from] serde_json::Error),
}

impl From<sqlx::Error> for StorefrontError {
    fn from(err: sqlx::Error) -> Self {
        StorefrontError::Repository(RepositoryError::Database(err))
    }
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;
