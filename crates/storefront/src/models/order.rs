//! Order models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use gearloom_core::{OrderId, OrderItemId, OrderStatus, ProductId, SellerId, UserId};

/// Contact and shipping details captured at checkout.
///
/// Recipient name, email, phone, and the address lines are encrypted at
/// rest; repositories hand them back as stored, and the order service
/// decrypts when hydrating for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub recipient_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub region: String,
}

/// An order header with its line items.
///
/// Immutable once created apart from `status`; `total_amount` is a
/// snapshot and is never recomputed from the catalogue.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    /// Set only when every line item shares exactly one seller.
    pub seller_id: Option<SellerId>,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub contact: ContactDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Human-readable order reference, derived from the id.
    ///
    /// Display only - never used for lookup.
    #[must_use]
    pub fn reference(&self) -> String {
        format!("GL-{:06}", self.id.as_i64())
    }
}

/// A line-item snapshot.
///
/// Product name, SKU, and unit price are copied at order time so history
/// stays readable if the live product changes or disappears; `product_id`
/// is informational and only consulted again during cancellation restock.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub sku: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// Line-item data captured during checkout, before ids are assigned.
#[derive(Debug, Clone)]
pub struct OrderItemSnapshot {
    pub product_id: ProductId,
    pub product_name: String,
    pub sku: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// Input for persisting an order header.
///
/// Contact fields must already be sealed; new orders are always `pending`.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub seller_id: Option<SellerId>,
    pub total_amount: Decimal,
    pub contact: ContactDetails,
    pub created_at: DateTime<Utc>,
}

/// Result of a cancellation attempt.
#[derive(Debug)]
pub enum CancelOutcome {
    /// The order was pending and has been cancelled; stock is restored.
    Cancelled(Order),
    /// No such order for this user (including orders owned by others).
    NotFound,
    /// The order exists but is not in a cancellable state.
    NotCancellable {
        /// The order's current status.
        status: OrderStatus,
    },
}
