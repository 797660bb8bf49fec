//! Persisted cart repository.
//!
//! Carts are replaced wholesale on every mutating action: the full map is
//! read, mutated in memory, and rewritten. There is no partial diffing.

use sqlx::{SqliteConnection, SqlitePool};

use gearloom_core::{ProductId, UserId};

use super::RepositoryError;
use crate::models::cart::Cart;

/// Internal row type for cart queries.
#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    product_id: i64,
    quantity: i64,
}

/// Repository for persisted user carts.
pub struct CartRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Fetch the persisted cart for a user.
    ///
    /// Entries with a non-positive quantity are excluded by construction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn fetch(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let rows = sqlx::query_as::<_, CartItemRow>(
            "SELECT product_id, quantity
             FROM user_cart_items
             WHERE user_id = ?
             ORDER BY rowid",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let mut cart = Cart::new();
        for row in rows {
            if let Ok(quantity) = u32::try_from(row.quantity)
                && quantity > 0
            {
                cart.add(ProductId::new(row.product_id), quantity);
            }
        }
        Ok(cart)
    }

    /// Replace the persisted cart for a user with the provided mapping.
    ///
    /// Deletes all prior entries, then inserts only entries with a
    /// positive quantity, in cart order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; the
    /// replacement is transactional.
    pub async fn replace(&self, user_id: UserId, cart: &Cart) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        Self::replace_in_tx(&mut tx, user_id, cart).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Replace a user's cart inside an existing transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn replace_in_tx(
        conn: &mut SqliteConnection,
        user_id: UserId,
        cart: &Cart,
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM user_cart_items WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *conn)
            .await?;

        for entry in cart.entries() {
            if entry.quantity == 0 {
                continue;
            }
            sqlx::query(
                "INSERT INTO user_cart_items (user_id, product_id, quantity) VALUES (?, ?, ?)",
            )
            .bind(user_id)
            .bind(entry.product_id)
            .bind(i64::from(entry.quantity))
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    /// Delete all persisted cart items for the user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM user_cart_items WHERE user_id = ?")
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Delete a user's cart inside an existing transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear_in_tx(
        conn: &mut SqliteConnection,
        user_id: UserId,
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM user_cart_items WHERE user_id = ?")
            .bind(user_id)
            .execute(conn)
            .await?;
        Ok(())
    }
}
