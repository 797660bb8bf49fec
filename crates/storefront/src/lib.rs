//! Gearloom Storefront - cart, checkout, and order/inventory workflows.
//!
//! This crate is the commerce engine behind the public storefront. The web
//! layer, admin screens, and authentication live elsewhere and call into it
//! with a resolved user id.
//!
//! # Architecture
//!
//! - SQLite (via sqlx) as the system of record for products, carts, and orders
//! - Repositories in [`db`], domain models in [`models`], workflows in
//!   [`services`]
//! - Order contact fields are encrypted at rest ([`crypto`])
//!
//! # Invariants
//!
//! - `inventory_count` never goes negative: every workflow decrement runs
//!   through a guarded conditional update inside the checkout transaction
//! - A checkout either creates the order and reserves all of its stock, or
//!   leaves no trace; a cancellation restores exactly what was reserved

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
