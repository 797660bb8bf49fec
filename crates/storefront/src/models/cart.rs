//! Cart models.
//!
//! A cart is an ordered product-to-quantity mapping. Guest carts live in
//! the caller's session as a plain [`Cart`] value; logged-in users get the
//! same shape persisted through `CartRepository`. Entry order is preserved
//! so the cart page renders lines in the order they were added.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use gearloom_core::ProductId;

use super::product::Product;

/// One cart line: a product reference and a desired quantity.
///
/// Quantities are always positive; zero or negative quantities remove the
/// entry instead of being stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// An ordered product-to-quantity mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    entries: Vec<CartEntry>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Whether the cart has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Total number of units across all entries.
    #[must_use]
    pub fn unit_count(&self) -> u64 {
        self.entries.iter().map(|e| u64::from(e.quantity)).sum()
    }

    /// Entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    /// Quantity for a product, if present.
    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| e.product_id == product_id)
            .map(|e| e.quantity)
    }

    /// Add units of a product, summing with any existing quantity.
    pub fn add(&mut self, product_id: ProductId, quantity: u32) {
        if quantity == 0 {
            return;
        }
        if let Some(entry) = self.entries.iter_mut().find(|e| e.product_id == product_id) {
            entry.quantity = entry.quantity.saturating_add(quantity);
        } else {
            self.entries.push(CartEntry {
                product_id,
                quantity,
            });
        }
    }

    /// Set the quantity for a product. Zero removes the entry.
    pub fn set(&mut self, product_id: ProductId, quantity: u32) {
        if quantity == 0 {
            self.remove(product_id);
            return;
        }
        if let Some(entry) = self.entries.iter_mut().find(|e| e.product_id == product_id) {
            entry.quantity = quantity;
        } else {
            self.entries.push(CartEntry {
                product_id,
                quantity,
            });
        }
    }

    /// Remove a product. Returns whether it was present.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.product_id != product_id);
        self.entries.len() != before
    }

    /// Merge another cart into this one by summing quantities per product.
    ///
    /// Products only present in `other` are appended in `other`'s order.
    pub fn merge(&mut self, other: &Self) {
        for entry in &other.entries {
            self.add(entry.product_id, entry.quantity);
        }
    }

    /// Product ids in insertion order.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.entries.iter().map(|e| e.product_id).collect()
    }
}

impl FromIterator<(ProductId, u32)> for Cart {
    fn from_iter<I: IntoIterator<Item = (ProductId, u32)>>(iter: I) -> Self {
        let mut cart = Self::new();
        for (product_id, quantity) in iter {
            cart.add(product_id, quantity);
        }
        cart
    }
}

/// A cart line resolved against the live catalogue.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub product: Product,
    pub quantity: u32,
    /// `price * quantity` for this line.
    pub line_total: Decimal,
}

/// A cart resolved against the catalogue, with a display total.
///
/// Entries whose product no longer resolves are skipped, not errors.
#[derive(Debug, Clone, Serialize)]
pub struct CartSnapshot {
    pub lines: Vec<CartLine>,
    /// Sum of line totals, rounded to 2 decimal places.
    pub total: Decimal,
}

impl CartSnapshot {
    /// Whether no cart line resolved to a product.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_sums_quantities() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(1), 2);
        cart.add(ProductId::new(1), 3);
        assert_eq!(cart.get(ProductId::new(1)), Some(5));
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_add_zero_is_ignored() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(1), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_zero_removes() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(1), 2);
        cart.set(ProductId::new(1), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_entry_order_is_preserved() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(3), 1);
        cart.add(ProductId::new(1), 1);
        cart.add(ProductId::new(2), 1);
        assert_eq!(
            cart.product_ids(),
            vec![ProductId::new(3), ProductId::new(1), ProductId::new(2)]
        );
    }

    #[test]
    fn test_merge_sums_and_appends() {
        let mut user: Cart = [(ProductId::new(1), 2), (ProductId::new(2), 1)]
            .into_iter()
            .collect();
        let guest: Cart = [(ProductId::new(2), 3), (ProductId::new(9), 4)]
            .into_iter()
            .collect();
        user.merge(&guest);
        assert_eq!(user.get(ProductId::new(1)), Some(2));
        assert_eq!(user.get(ProductId::new(2)), Some(4));
        assert_eq!(user.get(ProductId::new(9)), Some(4));
        assert_eq!(
            user.product_ids(),
            vec![ProductId::new(1), ProductId::new(2), ProductId::new(9)]
        );
    }

    #[test]
    fn test_merge_empty_guest_is_noop() {
        let mut user: Cart = [(ProductId::new(1), 2)].into_iter().collect();
        let before = user.clone();
        user.merge(&Cart::new());
        assert_eq!(user, before);
    }
}
