//! Product repository.
//!
//! All stock mutations made by the checkout and cancellation workflows go
//! through [`ProductRepository::reserve_stock`] and
//! [`ProductRepository::restock`] so `inventory_count` can never be
//! observed negative. Admin edits overwrite counts directly
//! (last-write-wins) by design.

use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};

use gearloom_core::{ProductId, SellerId};

use super::RepositoryError;
use crate::models::product::{NewProduct, Product, ProductUpdate};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for product queries.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i64,
    seller_id: Option<i64>,
    name: String,
    description: String,
    price: String,
    sku: Option<String>,
    inventory_count: i64,
    image_path: Option<String>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Decimal::from_str(&row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!(
                "invalid price for product {}: {e}",
                row.id
            ))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            seller_id: row.seller_id.map(SellerId::new),
            name: row.name,
            description: row.description,
            price,
            sku: row.sku,
            inventory_count: row.inventory_count,
            image_path: row.image_path,
        })
    }
}

const PRODUCT_COLUMNS: &str =
    "id, seller_id, name, description, price, sku, inventory_count, image_path";

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails and
    /// `RepositoryError::DataCorruption` if the stored price is invalid.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Get products for the provided ids, preserving caller order.
    ///
    /// Duplicate ids are collapsed and ids that no longer resolve are
    /// silently skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails and
    /// `RepositoryError::DataCorruption` if a stored price is invalid.
    pub async fn get_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let mut ordered: Vec<ProductId> = Vec::with_capacity(ids.len());
        for &id in ids {
            if !ordered.contains(&id) {
                ordered.push(id);
            }
        }

        if ordered.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ordered.len()].join(", ");
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id IN ({placeholders})");

        let mut query = sqlx::query_as::<_, ProductRow>(&sql);
        for &id in &ordered {
            query = query.bind(id);
        }
        let rows = query.fetch_all(self.pool).await?;

        let mut lookup: HashMap<ProductId, Product> = HashMap::with_capacity(rows.len());
        for row in rows {
            let product = Product::try_from(row)?;
            lookup.insert(product.id, product);
        }

        Ok(ordered
            .into_iter()
            .filter_map(|id| lookup.remove(&id))
            .collect())
    }

    /// List all products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails and
    /// `RepositoryError::DataCorruption` if a stored price is invalid.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Create a new product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` for a negative price,
    /// `RepositoryError::Conflict` for a duplicate SKU, and
    /// `RepositoryError::Database` for other failures.
    pub async fn create(&self, input: &NewProduct) -> Result<Product, RepositoryError> {
        if input.price.is_sign_negative() {
            return Err(RepositoryError::Invalid(
                "price cannot be negative".to_owned(),
            ));
        }
        if input.inventory_count < 0 {
            return Err(RepositoryError::Invalid(
                "inventory count cannot be negative".to_owned(),
            ));
        }

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO products (seller_id, name, description, price, sku, inventory_count, image_path)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(input.seller_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price.to_string())
        .bind(&input.sku)
        .bind(input.inventory_count)
        .bind(&input.image_path)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("SKU already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        row.try_into()
    }

    /// Update a product with the provided fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist,
    /// `RepositoryError::Invalid` for a negative price or count, and
    /// `RepositoryError::Database` for other failures.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductUpdate,
    ) -> Result<Product, RepositoryError> {
        if input.price.is_some_and(|p| p.is_sign_negative()) {
            return Err(RepositoryError::Invalid(
                "price cannot be negative".to_owned(),
            ));
        }
        if input.inventory_count.is_some_and(|c| c < 0) {
            return Err(RepositoryError::Invalid(
                "inventory count cannot be negative".to_owned(),
            ));
        }

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE products
             SET name = COALESCE(?, name),
                 description = COALESCE(?, description),
                 price = COALESCE(?, price),
                 sku = COALESCE(?, sku),
                 inventory_count = COALESCE(?, inventory_count),
                 image_path = COALESCE(?, image_path)
             WHERE id = ?
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price.map(|p| p.to_string()))
        .bind(&input.sku)
        .bind(input.inventory_count)
        .bind(&input.image_path)
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Delete a product.
    ///
    /// Historic order items keep their snapshots; only cart entries cascade.
    ///
    /// # Returns
    ///
    /// Returns `true` if the product was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Overwrite a product's inventory count (admin edit).
    ///
    /// Deliberately unguarded: concurrent checkouts are not compensated
    /// for, last write wins.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist and
    /// `RepositoryError::Invalid` for a negative count.
    pub async fn set_inventory(&self, id: ProductId, count: i64) -> Result<(), RepositoryError> {
        if count < 0 {
            return Err(RepositoryError::Invalid(
                "inventory count cannot be negative".to_owned(),
            ));
        }

        let result = sqlx::query("UPDATE products SET inventory_count = ? WHERE id = ?")
            .bind(count)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    // =========================================================================
    // Stock operations
    // =========================================================================

    /// Guarded conditional decrement, run inside the checkout transaction.
    ///
    /// # Returns
    ///
    /// Returns `true` when the full quantity was reserved; `false` when
    /// stock was insufficient (including a lost race), in which case the
    /// row is untouched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn reserve_stock(
        conn: &mut SqliteConnection,
        id: ProductId,
        quantity: u32,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE products
             SET inventory_count = inventory_count - ?1
             WHERE id = ?2 AND inventory_count >= ?1",
        )
        .bind(i64::from(quantity))
        .bind(id)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Increment stock back, run inside the cancellation transaction.
    ///
    /// # Returns
    ///
    /// Returns `false` when the product row no longer exists (the caller
    /// skips the restock silently).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn restock(
        conn: &mut SqliteConnection,
        id: ProductId,
        quantity: u32,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE products SET inventory_count = inventory_count + ? WHERE id = ?",
        )
        .bind(i64::from(quantity))
        .bind(id)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
