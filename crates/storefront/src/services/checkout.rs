//! Checkout workflow.
//!
//! A submission runs: field validation, an authoritative stock re-check,
//! then one transaction covering the order header, its line-item
//! snapshots, the guarded inventory decrements, and the cart/draft
//! clearing. Any stock shortfall - found at re-check or lost to a
//! concurrent checkout mid-transaction - aborts the submission with the
//! cart adjusted for review, so a single submission never ships a
//! different order than the user saw.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use tracing::instrument;

use gearloom_core::{Email, ProductId, SellerId, UserId};

use crate::crypto::ContactCipher;
use crate::db::{CartRepository, DraftRepository, OrderRepository, ProductRepository};
use crate::db::RepositoryError;
use crate::error::Result;
use crate::models::cart::Cart;
use crate::models::checkout::{
    CheckoutOutcome, CheckoutRequest, FieldError, StockAdjustment, StockAdjustmentKind,
    StockConflictReport,
};
use crate::models::order::{ContactDetails, NewOrder, OrderItemSnapshot};
use crate::models::product::Product;

use super::orders::hydrate_order;

/// Service orchestrating checkout submissions.
pub struct CheckoutService<'a> {
    pool: &'a SqlitePool,
    cipher: &'a ContactCipher,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool, cipher: &'a ContactCipher) -> Self {
        Self { pool, cipher }
    }

    /// Place an order from the user's persisted cart.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError` only for infrastructure failures; every
    /// user-recoverable condition is a [`CheckoutOutcome`] variant. A
    /// failure inside the transaction rolls back completely - inventory is
    /// never decremented without its order.
    #[instrument(skip(self, request), fields(user_id = %user_id))]
    pub async fn place_order(
        &self,
        user_id: UserId,
        request: &CheckoutRequest,
    ) -> Result<CheckoutOutcome> {
        let carts = CartRepository::new(self.pool);
        let products = ProductRepository::new(self.pool);

        let cart = carts.fetch(user_id).await?;
        if cart.is_empty() {
            return Ok(CheckoutOutcome::Invalid(vec![FieldError::new(
                "cart",
                "Your cart is empty.",
            )]));
        }

        let errors = validate(request);
        if !errors.is_empty() {
            self.save_draft(user_id, request).await?;
            return Ok(CheckoutOutcome::Invalid(errors));
        }

        // Authoritative re-check against live stock, not the figures the
        // cart page was rendered with.
        let lookup = self.resolve_products(&cart, &products).await?;
        let (adjusted, adjustments) = reconcile(&cart, &lookup);
        if !adjustments.is_empty() {
            carts.replace(user_id, &adjusted).await?;
            self.save_draft(user_id, request).await?;
            return Ok(CheckoutOutcome::StockConflict(StockConflictReport {
                adjustments,
                cart: adjusted,
            }));
        }

        let items = build_snapshots(&cart, &lookup);
        let total: Decimal = items
            .iter()
            .map(|i| i.unit_price * Decimal::from(i.quantity))
            .sum();

        let new_order = NewOrder {
            user_id,
            seller_id: single_seller(&cart, &lookup),
            total_amount: total.round_dp(2),
            contact: self.seal_contact(request)?,
            created_at: Utc::now(),
        };

        let mut tx = self.pool.begin().await?;
        let order_id = OrderRepository::insert_order(&mut tx, &new_order).await?;
        OrderRepository::insert_items(&mut tx, order_id, &items).await?;

        for item in &items {
            let reserved =
                ProductRepository::reserve_stock(&mut tx, item.product_id, item.quantity).await?;
            if !reserved {
                tx.rollback().await?;
                return self
                    .reservation_conflict(user_id, request, &cart, item.product_id)
                    .await;
            }
        }

        CartRepository::clear_in_tx(&mut tx, user_id).await?;
        DraftRepository::clear_in_tx(&mut tx, user_id).await?;
        tx.commit().await?;

        let order = OrderRepository::new(self.pool)
            .get_for_user(order_id, user_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        Ok(CheckoutOutcome::Placed(hydrate_order(self.cipher, order)?))
    }

    /// Persist the checkout form as an encrypted draft.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError` if serialization, sealing, or the write
    /// fails.
    pub async fn save_draft(&self, user_id: UserId, request: &CheckoutRequest) -> Result<()> {
        let payload = self.cipher.seal(&serde_json::to_string(request)?)?;
        DraftRepository::new(self.pool)
            .save(user_id, &payload, Utc::now())
            .await?;
        Ok(())
    }

    /// Load the user's saved checkout form, if any.
    ///
    /// An unreadable draft is treated as absent, not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Repository` on database failure.
    pub async fn load_draft(&self, user_id: UserId) -> Result<Option<CheckoutRequest>> {
        let Some(payload) = DraftRepository::new(self.pool).load(user_id).await? else {
            return Ok(None);
        };

        let opened = match self.cipher.open(&payload) {
            Ok(opened) => opened,
            Err(e) => {
                tracing::warn!(%user_id, "discarding unreadable checkout draft: {e}");
                return Ok(None);
            }
        };
        match serde_json::from_str(&opened) {
            Ok(request) => Ok(Some(request)),
            Err(e) => {
                tracing::warn!(%user_id, "discarding malformed checkout draft: {e}");
                Ok(None)
            }
        }
    }

    async fn resolve_products(
        &self,
        cart: &Cart,
        products: &ProductRepository<'_>,
    ) -> Result<HashMap<ProductId, Product>> {
        let resolved = products.get_by_ids(&cart.product_ids()).await?;
        Ok(resolved.into_iter().map(|p| (p.id, p)).collect())
    }

    /// A guarded decrement lost its race after the re-check passed. Same
    /// user-facing contract as the re-check: adjust the cart to current
    /// stock and abort.
    async fn reservation_conflict(
        &self,
        user_id: UserId,
        request: &CheckoutRequest,
        cart: &Cart,
        contested: ProductId,
    ) -> Result<CheckoutOutcome> {
        let carts = CartRepository::new(self.pool);
        let products = ProductRepository::new(self.pool);

        let lookup = self.resolve_products(cart, &products).await?;
        let (adjusted, mut adjustments) = reconcile(cart, &lookup);

        if adjustments.is_empty() {
            // Stock recovered between the failed reservation and this
            // re-read (e.g., a cancellation landed). Leave the cart alone
            // and ask for a resubmit.
            let product_name = lookup.get(&contested).map_or_else(
                || "An item in your cart".to_owned(),
                |p| p.name.clone(),
            );
            adjustments.push(StockAdjustment {
                product_id: contested,
                product_name,
                kind: StockAdjustmentKind::Contested,
            });
            self.save_draft(user_id, request).await?;
            return Ok(CheckoutOutcome::StockConflict(StockConflictReport {
                adjustments,
                cart: cart.clone(),
            }));
        }

        carts.replace(user_id, &adjusted).await?;
        self.save_draft(user_id, request).await?;
        Ok(CheckoutOutcome::StockConflict(StockConflictReport {
            adjustments,
            cart: adjusted,
        }))
    }

    fn seal_contact(&self, request: &CheckoutRequest) -> Result<ContactDetails> {
        let phone = request
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty());
        let address_line2 = request
            .address_line2
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty());

        Ok(ContactDetails {
            recipient_name: self.cipher.seal(request.recipient_name.trim())?,
            email: self.cipher.seal(request.email.trim())?,
            phone: self.cipher.seal_opt(phone)?,
            address_line1: self.cipher.seal(request.address_line1.trim())?,
            address_line2: self.cipher.seal_opt(address_line2)?,
            city: request.city.trim().to_owned(),
            postal_code: request.postal_code.trim().to_owned(),
            country: request.country.trim().to_owned(),
            region: request.region.trim().to_owned(),
        })
    }
}

/// Validate the checkout form field by field. No mutation happens before
/// this passes.
#[must_use]
pub fn validate(request: &CheckoutRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if request.recipient_name.trim().is_empty() {
        errors.push(FieldError::new(
            "recipient_name",
            "Recipient name is required.",
        ));
    }

    let email = request.email.trim();
    if email.is_empty() {
        errors.push(FieldError::new("email", "Email is required."));
    } else if Email::parse(email).is_err() {
        errors.push(FieldError::new("email", "Enter a valid email address."));
    }

    if request.address_line1.trim().is_empty() {
        errors.push(FieldError::new("address_line1", "Address is required."));
    }
    if request.city.trim().is_empty() {
        errors.push(FieldError::new("city", "City is required."));
    }
    if request.postal_code.trim().is_empty() {
        errors.push(FieldError::new("postal_code", "Postal code is required."));
    }

    let country = request.country.trim();
    if country.is_empty() {
        errors.push(FieldError::new("country", "Country is required."));
    }

    let region = request.region.trim();
    if region.is_empty() {
        errors.push(FieldError::new("region", "Region is required."));
    } else if !country.is_empty() && !super::regions::is_valid_region(country, region) {
        errors.push(FieldError::new(
            "region",
            "Select a region that matches the chosen country.",
        ));
    }

    errors
}

/// Apply the re-check policy: drop lines with no stock, clamp lines with
/// too little. Returns the adjusted cart and the adjustments made.
fn reconcile(
    cart: &Cart,
    lookup: &HashMap<ProductId, Product>,
) -> (Cart, Vec<StockAdjustment>) {
    let mut adjusted = Cart::new();
    let mut adjustments = Vec::new();

    for entry in cart.entries() {
        let Some(product) = lookup.get(&entry.product_id) else {
            adjustments.push(StockAdjustment {
                product_id: entry.product_id,
                product_name: "An unavailable item".to_owned(),
                kind: StockAdjustmentKind::Removed,
            });
            continue;
        };

        let available = u32::try_from(product.inventory_count).unwrap_or(0);
        if available == 0 {
            adjustments.push(StockAdjustment {
                product_id: product.id,
                product_name: product.name.clone(),
                kind: StockAdjustmentKind::Removed,
            });
        } else if available < entry.quantity {
            adjusted.set(product.id, available);
            adjustments.push(StockAdjustment {
                product_id: product.id,
                product_name: product.name.clone(),
                kind: StockAdjustmentKind::Clamped { available },
            });
        } else {
            adjusted.set(product.id, entry.quantity);
        }
    }

    (adjusted, adjustments)
}

/// Build immutable line-item snapshots from the reconciled cart.
fn build_snapshots(
    cart: &Cart,
    lookup: &HashMap<ProductId, Product>,
) -> Vec<OrderItemSnapshot> {
    cart.entries()
        .iter()
        .filter_map(|entry| {
            lookup.get(&entry.product_id).map(|product| OrderItemSnapshot {
                product_id: product.id,
                product_name: product.name.clone(),
                sku: product.sku.clone(),
                quantity: entry.quantity,
                unit_price: product.price,
            })
        })
        .collect()
}

/// The order's seller, only when every line shares exactly one.
fn single_seller(cart: &Cart, lookup: &HashMap<ProductId, Product>) -> Option<SellerId> {
    let sellers: HashSet<Option<SellerId>> = cart
        .entries()
        .iter()
        .filter_map(|entry| lookup.get(&entry.product_id))
        .map(|product| product.seller_id)
        .collect();

    if sellers.len() == 1 {
        sellers.into_iter().next().flatten()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> CheckoutRequest {
        CheckoutRequest {
            recipient_name: "Jamie Rivera".to_owned(),
            email: "jamie@example.com".to_owned(),
            phone: None,
            address_line1: "42 Main St".to_owned(),
            address_line2: None,
            city: "Portland".to_owned(),
            postal_code: "97201".to_owned(),
            country: "US".to_owned(),
            region: "OR".to_owned(),
        }
    }

    #[test]
    fn test_valid_request_passes() {
        assert!(validate(&valid_request()).is_empty());
    }

    #[test]
    fn test_missing_fields_are_reported_per_field() {
        let errors = validate(&CheckoutRequest::default());
        let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "recipient_name",
                "email",
                "address_line1",
                "city",
                "postal_code",
                "country",
                "region"
            ]
        );
    }

    #[test]
    fn test_bad_email_is_rejected() {
        let mut request = valid_request();
        request.email = "jamie@localhost".to_owned();
        let errors = validate(&request);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.first().map(|e| e.field), Some("email"));
    }

    #[test]
    fn test_region_must_match_country() {
        let mut request = valid_request();
        request.region = "QC".to_owned();
        let errors = validate(&request);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.first().map(|e| e.field), Some("region"));
    }

    #[test]
    fn test_free_text_region_for_unknown_country() {
        let mut request = valid_request();
        request.country = "NZ".to_owned();
        request.region = "Otago".to_owned();
        assert!(validate(&request).is_empty());
    }

    #[test]
    fn test_reconcile_clamps_and_drops() {
        let product = |id: i64, stock: i64| Product {
            id: ProductId::new(id),
            seller_id: None,
            name: format!("Product {id}"),
            description: String::new(),
            price: Decimal::new(1000, 2),
            sku: None,
            inventory_count: stock,
            image_path: None,
        };

        let cart: Cart = [
            (ProductId::new(1), 5),
            (ProductId::new(2), 2),
            (ProductId::new(3), 1),
        ]
        .into_iter()
        .collect();
        let lookup: HashMap<ProductId, Product> = [product(1, 2), product(2, 2), product(3, 0)]
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let (adjusted, adjustments) = reconcile(&cart, &lookup);
        assert_eq!(adjusted.get(ProductId::new(1)), Some(2));
        assert_eq!(adjusted.get(ProductId::new(2)), Some(2));
        assert_eq!(adjusted.get(ProductId::new(3)), None);
        assert_eq!(adjustments.len(), 2);
    }

    #[test]
    fn test_single_seller_attribution() {
        let product = |id: i64, seller: Option<i64>| Product {
            id: ProductId::new(id),
            seller_id: seller.map(SellerId::new),
            name: format!("Product {id}"),
            description: String::new(),
            price: Decimal::ONE,
            sku: None,
            inventory_count: 10,
            image_path: None,
        };

        let cart: Cart = [(ProductId::new(1), 1), (ProductId::new(2), 1)]
            .into_iter()
            .collect();

        let same: HashMap<ProductId, Product> = [product(1, Some(7)), product(2, Some(7))]
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        assert_eq!(single_seller(&cart, &same), Some(SellerId::new(7)));

        let mixed: HashMap<ProductId, Product> = [product(1, Some(7)), product(2, Some(8))]
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        assert_eq!(single_seller(&cart, &mixed), None);

        let unattributed: HashMap<ProductId, Product> = [product(1, None), product(2, None)]
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        assert_eq!(single_seller(&cart, &unattributed), None);
    }
}
