//! Checkout request and outcome types.

use core::fmt;

use serde::{Deserialize, Serialize};

use gearloom_core::ProductId;

use super::cart::Cart;
use super::order::Order;

/// The checkout form, validated field by field before any mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
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

/// A field-level validation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Form field the message belongs to (`"email"`, `"region"`, ...).
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub(crate) fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// How a cart line was adjusted during the checkout stock re-check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StockAdjustmentKind {
    /// The product is out of stock (or gone); the line was removed.
    Removed,
    /// Requested quantity exceeded stock; clamped down.
    Clamped {
        /// Stock available at re-check time.
        available: u32,
    },
    /// A concurrent checkout won the remaining stock mid-transaction.
    Contested,
}

/// One user-facing stock adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockAdjustment {
    pub product_id: ProductId,
    pub product_name: String,
    pub kind: StockAdjustmentKind,
}

impl fmt::Display for StockAdjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StockAdjustmentKind::Removed => write!(
                f,
                "{} is out of stock and was removed from your cart.",
                self.product_name
            ),
            StockAdjustmentKind::Clamped { available } => write!(
                f,
                "Only {} of {} {} available; your cart was updated.",
                available,
                self.product_name,
                if *available == 1 { "is" } else { "are" }
            ),
            StockAdjustmentKind::Contested => write!(
                f,
                "Availability of {} changed while placing your order. Please try again.",
                self.product_name
            ),
        }
    }
}

/// A stock conflict that aborted checkout.
///
/// The cart has already been persisted in its adjusted form; the caller
/// re-renders it with the messages and the user must resubmit.
#[derive(Debug, Clone)]
pub struct StockConflictReport {
    pub adjustments: Vec<StockAdjustment>,
    /// The cart as persisted after adjustment.
    pub cart: Cart,
}

impl StockConflictReport {
    /// User-facing messages, one per adjustment.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.adjustments.iter().map(ToString::to_string).collect()
    }
}

/// Result of a checkout submission.
///
/// A submission never silently ships a different order than the user saw:
/// any inventory conflict aborts with the cart adjusted for review.
#[derive(Debug)]
pub enum CheckoutOutcome {
    /// The order was created and stock reserved.
    Placed(Order),
    /// Validation failed (or the cart was empty); nothing was mutated.
    Invalid(Vec<FieldError>),
    /// Stock could not satisfy the cart; the cart was adjusted and
    /// checkout aborted.
    StockConflict(StockConflictReport),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjustment_messages() {
        let removed = StockAdjustment {
            product_id: ProductId::new(1),
            product_name: "GridWave Wi-Fi 7 Router".to_owned(),
            kind: StockAdjustmentKind::Removed,
        };
        assert_eq!(
            removed.to_string(),
            "GridWave Wi-Fi 7 Router is out of stock and was removed from your cart."
        );

        let clamped = StockAdjustment {
            product_id: ProductId::new(1),
            product_name: "GridWave Wi-Fi 7 Router".to_owned(),
            kind: StockAdjustmentKind::Clamped { available: 1 },
        };
        assert_eq!(
            clamped.to_string(),
            "Only 1 of GridWave Wi-Fi 7 Router is available; your cart was updated."
        );
    }
}
