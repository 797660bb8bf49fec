//! Order repository.
//!
//! Header and item inserts take a `&mut SqliteConnection` so they only
//! ever run inside the checkout transaction - a header without its items
//! (or vice versa) is never observable. Contact fields are returned as
//! stored; decryption happens in the order service.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};

use gearloom_core::{OrderId, OrderItemId, OrderStatus, ProductId, SellerId, UserId};

use super::RepositoryError;
use crate::models::order::{ContactDetails, NewOrder, Order, OrderItem, OrderItemSnapshot};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for order header queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: i64,
    seller_id: Option<i64>,
    status: String,
    total_amount: String,
    recipient_name: String,
    email: String,
    phone: Option<String>,
    address_line1: String,
    address_line2: Option<String>,
    city: String,
    postal_code: String,
    country: String,
    region: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let total_amount = Decimal::from_str(&row.total_amount).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid total for order {}: {e}", row.id))
        })?;

        Ok(Self {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            seller_id: row.seller_id.map(SellerId::new),
            status: OrderStatus::from(row.status),
            total_amount,
            contact: ContactDetails {
                recipient_name: row.recipient_name,
                email: row.email,
                phone: row.phone,
                address_line1: row.address_line1,
                address_line2: row.address_line2,
                city: row.city,
                postal_code: row.postal_code,
                country: row.country,
                region: row.region,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
            items: Vec::new(),
        })
    }
}

/// Internal row type for order item queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i64,
    order_id: i64,
    product_id: i64,
    product_name: String,
    sku: Option<String>,
    quantity: i64,
    unit_price: String,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        let unit_price = Decimal::from_str(&row.unit_price).map_err(|e| {
            RepositoryError::DataCorruption(format!(
                "invalid unit price for order item {}: {e}",
                row.id
            ))
        })?;
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "invalid quantity for order item {}",
                row.id
            ))
        })?;

        Ok(Self {
            id: OrderItemId::new(row.id),
            order_id: OrderId::new(row.order_id),
            product_id: ProductId::new(row.product_id),
            product_name: row.product_name,
            sku: row.sku,
            quantity,
            unit_price,
        })
    }
}

const ORDER_COLUMNS: &str = "id, user_id, seller_id, status, total_amount, recipient_name, \
                             email, phone, address_line1, address_line2, city, postal_code, \
                             country, region, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, product_name, sku, quantity, unit_price";

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert an order header inside the checkout transaction.
    ///
    /// New orders are always `pending`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn insert_order(
        conn: &mut SqliteConnection,
        input: &NewOrder,
    ) -> Result<OrderId, RepositoryError> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO orders (user_id, seller_id, status, total_amount, recipient_name,
                                 email, phone, address_line1, address_line2, city,
                                 postal_code, country, region, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(input.user_id)
        .bind(input.seller_id)
        .bind(OrderStatus::Pending.as_str())
        .bind(input.total_amount.to_string())
        .bind(&input.contact.recipient_name)
        .bind(&input.contact.email)
        .bind(&input.contact.phone)
        .bind(&input.contact.address_line1)
        .bind(&input.contact.address_line2)
        .bind(&input.contact.city)
        .bind(&input.contact.postal_code)
        .bind(&input.contact.country)
        .bind(&input.contact.region)
        .bind(input.created_at)
        .bind(input.created_at)
        .fetch_one(conn)
        .await?;

        Ok(OrderId::new(id))
    }

    /// Insert line-item snapshots inside the checkout transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any insert fails.
    pub async fn insert_items(
        conn: &mut SqliteConnection,
        order_id: OrderId,
        items: &[OrderItemSnapshot],
    ) -> Result<(), RepositoryError> {
        for item in items {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, product_name, sku,
                                          quantity, unit_price)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(order_id)
            .bind(item.product_id)
            .bind(&item.product_name)
            .bind(&item.sku)
            .bind(i64::from(item.quantity))
            .bind(item.unit_price.to_string())
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    /// Get an order (with items) owned by the given user.
    ///
    /// An order owned by someone else is indistinguishable from a missing
    /// one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails and
    /// `RepositoryError::DataCorruption` for invalid stored values.
    pub async fn get_for_user(
        &self,
        order_id: OrderId,
        user_id: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ? AND user_id = ?"
        ))
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut order = Order::try_from(row)?;
        order.items = self.items(order_id).await?;
        Ok(Some(order))
    }

    /// List a user's orders (with items), newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails and
    /// `RepositoryError::DataCorruption` for invalid stored values.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ? ORDER BY id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let mut order = Order::try_from(row)?;
            order.items = self.items(order.id).await?;
            orders.push(order);
        }
        Ok(orders)
    }

    /// Get the line items for an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails and
    /// `RepositoryError::DataCorruption` for invalid stored values.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ? ORDER BY id"
        ))
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(OrderItem::try_from).collect()
    }

    /// Get an order header (no items) inside a transaction, owner-scoped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails and
    /// `RepositoryError::DataCorruption` for invalid stored values.
    pub async fn header_for_user(
        conn: &mut SqliteConnection,
        order_id: OrderId,
        user_id: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ? AND user_id = ?"
        ))
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(conn)
        .await?;

        row.map(Order::try_from).transpose()
    }

    /// Get the line items for an order inside a transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails and
    /// `RepositoryError::DataCorruption` for invalid stored values.
    pub async fn items_in_tx(
        conn: &mut SqliteConnection,
        order_id: OrderId,
    ) -> Result<Vec<OrderItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ? ORDER BY id"
        ))
        .bind(order_id)
        .fetch_all(conn)
        .await?;

        rows.into_iter().map(OrderItem::try_from).collect()
    }

    /// Set an order's status inside a transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn set_status_in_tx(
        conn: &mut SqliteConnection,
        order_id: OrderId,
        status: &OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(now)
            .bind(order_id)
            .execute(conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Set an order's status (admin surface).
    ///
    /// Never touches inventory, whatever the transition.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn update_status(
        &self,
        order_id: OrderId,
        status: &OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(now)
            .bind(order_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
