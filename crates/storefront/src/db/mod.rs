//! Database operations for the storefront SQLite database.
//!
//! ## Tables
//!
//! - `products` - Catalogue with live `inventory_count`
//! - `user_cart_items` - Persisted per-user carts
//! - `orders` / `order_items` - Order headers plus line-item snapshots
//! - `checkout_drafts` - Last-entered checkout form per user (encrypted)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/`, embedded via
//! [`MIGRATOR`], and run with:
//! ```bash
//! cargo run -p gearloom-cli -- migrate
//! ```

pub mod carts;
pub mod drafts;
pub mod orders;
pub mod products;

use std::str::FromStr;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::SqlitePool;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use thiserror::Error;

pub use carts::CartRepository;
pub use drafts::DraftRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!();

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate SKU).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Rejected write (e.g., negative price).
    #[error("invalid input: {0}")]
    Invalid(String),
}

/// Create a SQLite connection pool with sensible defaults.
///
/// Creates the database file if it does not exist and enforces foreign
/// keys on every connection.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url.expose_secret())?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}
