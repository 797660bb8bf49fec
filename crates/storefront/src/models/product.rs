//! Product catalogue models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use gearloom_core::{ProductId, SellerId};

/// A catalogue product.
///
/// `inventory_count` is the live stock figure and the single source of
/// truth for availability. It is mutated by admin/seller edits and by the
/// checkout and cancellation workflows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    /// Selling user, when the product belongs to a marketplace seller.
    pub seller_id: Option<SellerId>,
    pub name: String,
    pub description: String,
    /// Unit price; never negative.
    pub price: Decimal,
    pub sku: Option<String>,
    pub inventory_count: i64,
    pub image_path: Option<String>,
}

impl Product {
    /// Whether any stock is available.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.inventory_count > 0
    }
}

/// Input for creating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub seller_id: Option<SellerId>,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub sku: Option<String>,
    pub inventory_count: i64,
    pub image_path: Option<String>,
}

/// Partial update for a product; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub sku: Option<String>,
    pub inventory_count: Option<i64>,
    pub image_path: Option<String>,
}
