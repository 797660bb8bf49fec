//! Cart service.
//!
//! Every mutating operation reads the full persisted map, mutates it in
//! memory, and rewrites it wholesale. Guest carts are plain [`Cart`]
//! values owned by the caller's session; [`CartService::merge_on_login`]
//! folds one into the persisted cart at the moment of authentication.

use rust_decimal::Decimal;
use sqlx::SqlitePool;
use tracing::instrument;

use gearloom_core::{ProductId, UserId};

use crate::db::{CartRepository, ProductRepository};
use crate::error::Result;
use crate::models::cart::{Cart, CartLine, CartSnapshot};

/// Service for persisted carts and cart display.
pub struct CartService<'a> {
    carts: CartRepository<'a>,
    products: ProductRepository<'a>,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            carts: CartRepository::new(pool),
            products: ProductRepository::new(pool),
        }
    }

    /// The user's persisted cart.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Repository` on database failure.
    pub async fn cart(&self, user_id: UserId) -> Result<Cart> {
        Ok(self.carts.fetch(user_id).await?)
    }

    /// Add units of a product to the cart, summing with any existing line.
    ///
    /// A zero quantity is coerced to one, matching the storefront's
    /// "add to cart" buttons.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Repository` on database failure.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart> {
        let mut cart = self.carts.fetch(user_id).await?;
        cart.add(product_id, quantity.max(1));
        self.carts.replace(user_id, &cart).await?;
        Ok(cart)
    }

    /// Set the quantity for a product already chosen. Zero removes it.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Repository` on database failure.
    #[instrument(skip(self))]
    pub async fn set_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart> {
        let mut cart = self.carts.fetch(user_id).await?;
        cart.set(product_id, quantity);
        self.carts.replace(user_id, &cart).await?;
        Ok(cart)
    }

    /// Remove a product from the cart.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Repository` on database failure.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, user_id: UserId, product_id: ProductId) -> Result<Cart> {
        let mut cart = self.carts.fetch(user_id).await?;
        cart.remove(product_id);
        self.carts.replace(user_id, &cart).await?;
        Ok(cart)
    }

    /// Empty the cart entirely.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Repository` on database failure.
    #[instrument(skip(self))]
    pub async fn clear(&self, user_id: UserId) -> Result<()> {
        self.carts.clear(user_id).await?;
        Ok(())
    }

    /// Merge a guest cart into the user's persisted cart at login.
    ///
    /// Quantities are summed per product and the union is persisted; the
    /// caller discards its guest representation afterwards. No stock check
    /// happens here - over-subscription is caught at checkout.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Repository` on database failure.
    #[instrument(skip(self, guest))]
    pub async fn merge_on_login(&self, user_id: UserId, guest: &Cart) -> Result<Cart> {
        let mut cart = self.carts.fetch(user_id).await?;
        if guest.is_empty() {
            return Ok(cart);
        }
        cart.merge(guest);
        self.carts.replace(user_id, &cart).await?;
        Ok(cart)
    }

    /// Resolve a cart against the live catalogue for display.
    ///
    /// Entry order is preserved; ids that no longer resolve are skipped
    /// silently. The total is rounded to 2 decimal places.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Repository` on database failure.
    pub async fn snapshot(&self, cart: &Cart) -> Result<CartSnapshot> {
        let products = self.products.get_by_ids(&cart.product_ids()).await?;

        let mut lines = Vec::with_capacity(products.len());
        let mut total = Decimal::ZERO;
        for product in products {
            let Some(quantity) = cart.get(product.id) else {
                continue;
            };
            let line_total = product.price * Decimal::from(quantity);
            total += line_total;
            lines.push(CartLine {
                product,
                quantity,
                line_total,
            });
        }

        Ok(CartSnapshot {
            lines,
            total: total.round_dp(2),
        })
    }
}
