//! Shared helpers for Gearloom integration tests.
//!
//! Every test runs against its own in-memory SQLite database with the
//! storefront migrations applied, so the scenarios are hermetic and need
//! no external services.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use gearloom_core::SellerId;
use gearloom_storefront::crypto::ContactCipher;
use gearloom_storefront::db::{self, ProductRepository};
use gearloom_storefront::models::{CheckoutRequest, NewProduct, Product};

/// A fresh in-memory database with migrations applied.
///
/// A single pooled connection keeps the in-memory database alive for the
/// pool's whole lifetime.
pub async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("valid sqlite url")
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("connect to in-memory sqlite");

    db::MIGRATOR.run(&pool).await.expect("run migrations");
    pool
}

/// A cipher with a fixed test key.
#[must_use]
pub fn test_cipher() -> ContactCipher {
    ContactCipher::new(&[7u8; 32]).expect("32-byte key")
}

/// Insert a product and return it.
pub async fn insert_product(
    pool: &SqlitePool,
    name: &str,
    price: &str,
    inventory_count: i64,
    seller_id: Option<SellerId>,
) -> Product {
    ProductRepository::new(pool)
        .create(&NewProduct {
            seller_id,
            name: name.to_owned(),
            description: format!("{name} description"),
            price: Decimal::from_str(price).expect("valid price"),
            sku: None,
            inventory_count,
            image_path: None,
        })
        .await
        .expect("insert product")
}

/// A checkout form that passes validation.
#[must_use]
pub fn valid_checkout() -> CheckoutRequest {
    CheckoutRequest {
        recipient_name: "Jamie Rivera".to_owned(),
        email: "jamie@example.com".to_owned(),
        phone: Some("555-0100".to_owned()),
        address_line1: "42 Main St".to_owned(),
        address_line2: None,
        city: "Portland".to_owned(),
        postal_code: "97201".to_owned(),
        country: "US".to_owned(),
        region: "OR".to_owned(),
    }
}

/// Current inventory count for a product, read straight from the table.
pub async fn inventory_of(pool: &SqlitePool, product: &Product) -> i64 {
    let (count,): (i64,) =
        sqlx::query_as("SELECT inventory_count FROM products WHERE id = ?")
            .bind(product.id)
            .fetch_one(pool)
            .await
            .expect("product row");
    count
}
