//! Order listing, hydration, and cancellation.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::instrument;

use gearloom_core::{OrderId, OrderStatus, UserId};

use crate::crypto::ContactCipher;
use crate::db::{OrderRepository, ProductRepository};
use crate::error::Result;
use crate::models::order::{CancelOutcome, Order};

/// Decrypt an order's contact fields for display.
///
/// Legacy plaintext values come back unchanged.
pub(crate) fn hydrate_order(cipher: &ContactCipher, mut order: Order) -> Result<Order> {
    let contact = &mut order.contact;
    contact.recipient_name = cipher.open(&contact.recipient_name)?;
    contact.email = cipher.open(&contact.email)?;
    contact.phone = cipher.open_opt(contact.phone.as_deref())?;
    contact.address_line1 = cipher.open(&contact.address_line1)?;
    contact.address_line2 = cipher.open_opt(contact.address_line2.as_deref())?;
    Ok(order)
}

/// Service for order retrieval and cancellation.
pub struct OrderService<'a> {
    pool: &'a SqlitePool,
    cipher: &'a ContactCipher,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool, cipher: &'a ContactCipher) -> Self {
        Self { pool, cipher }
    }

    /// A user's orders, newest first, with contact fields decrypted.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError` on database or decryption failure.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let orders = OrderRepository::new(self.pool).list_for_user(user_id).await?;
        orders
            .into_iter()
            .map(|order| hydrate_order(self.cipher, order))
            .collect()
    }

    /// One order, owner-scoped, with contact fields decrypted.
    ///
    /// Someone else's order is indistinguishable from a missing one.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError` on database or decryption failure.
    pub async fn get_for_user(
        &self,
        order_id: OrderId,
        user_id: UserId,
    ) -> Result<Option<Order>> {
        let order = OrderRepository::new(self.pool)
            .get_for_user(order_id, user_id)
            .await?;
        order.map(|o| hydrate_order(self.cipher, o)).transpose()
    }

    /// Cancel a pending order and restore its reserved stock.
    ///
    /// Only the owner may cancel, and only from status `pending` - which
    /// also makes a second cancellation impossible before any restock
    /// could double up. Each line restocks the recorded quantity; lines
    /// whose product no longer exists are skipped.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError` on database failure; the transaction
    /// rolls back and no partial restock is observable.
    #[instrument(skip(self), fields(order_id = %order_id, user_id = %user_id))]
    pub async fn cancel(&self, order_id: OrderId, user_id: UserId) -> Result<CancelOutcome> {
        let mut tx = self.pool.begin().await?;

        let Some(order) = OrderRepository::header_for_user(&mut tx, order_id, user_id).await?
        else {
            return Ok(CancelOutcome::NotFound);
        };

        if !order.status.is_cancellable() {
            return Ok(CancelOutcome::NotCancellable {
                status: order.status,
            });
        }

        OrderRepository::set_status_in_tx(&mut tx, order_id, &OrderStatus::Cancelled, Utc::now())
            .await?;

        let items = OrderRepository::items_in_tx(&mut tx, order_id).await?;
        for item in &items {
            let restocked =
                ProductRepository::restock(&mut tx, item.product_id, item.quantity).await?;
            if !restocked {
                tracing::warn!(
                    product_id = %item.product_id,
                    "product no longer exists; restock skipped"
                );
            }
        }

        tx.commit().await?;

        let cancelled = OrderRepository::new(self.pool)
            .get_for_user(order_id, user_id)
            .await?
            .ok_or(crate::db::RepositoryError::NotFound)?;
        Ok(CancelOutcome::Cancelled(hydrate_order(
            self.cipher,
            cancelled,
        )?))
    }

    /// Set an order's status (admin surface).
    ///
    /// No status transition made here touches inventory: marking an order
    /// `fulfilled` does not restock or re-reserve anything.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Repository` (`NotFound`) if the order
    /// doesn't exist.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn set_status(&self, order_id: OrderId, status: &OrderStatus) -> Result<()> {
        OrderRepository::new(self.pool)
            .update_status(order_id, status, Utc::now())
            .await?;
        Ok(())
    }
}
