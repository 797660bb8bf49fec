//! End-to-end checkout scenarios.

use std::str::FromStr;

use rust_decimal::Decimal;

use gearloom_core::{OrderStatus, SellerId, UserId};
use gearloom_integration_tests::{
    inventory_of, insert_product, test_cipher, test_pool, valid_checkout,
};
use gearloom_storefront::db::ProductRepository;
use gearloom_storefront::models::{CheckoutOutcome, ProductUpdate, StockAdjustmentKind};
use gearloom_storefront::services::{CartService, CheckoutService, OrderService};

const USER: UserId = UserId::new(1);

#[tokio::test]
async fn happy_path_reserves_stock_and_creates_pending_order() {
    let pool = test_pool().await;
    let cipher = test_cipher();
    let product = insert_product(&pool, "GridWave Wi-Fi 7 Router", "289.00", 5, None).await;

    let carts = CartService::new(&pool);
    carts.add_item(USER, product.id, 3).await.expect("add to cart");

    let outcome = CheckoutService::new(&pool, &cipher)
        .place_order(USER, &valid_checkout())
        .await
        .expect("place order");

    let order = match outcome {
        CheckoutOutcome::Placed(order) => order,
        other => panic!("expected Placed, got {other:?}"),
    };

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_amount, Decimal::from_str("867.00").expect("decimal"));
    assert_eq!(order.items.len(), 1);
    let item = order.items.first().expect("one line item");
    assert_eq!(item.quantity, 3);
    assert_eq!(item.product_name, "GridWave Wi-Fi 7 Router");
    assert_eq!(item.unit_price, Decimal::from_str("289.00").expect("decimal"));

    // Stock reserved, cart emptied.
    assert_eq!(inventory_of(&pool, &product).await, 2);
    assert!(carts.cart(USER).await.expect("cart").is_empty());

    // Contact fields decrypted for display.
    assert_eq!(order.contact.email, "jamie@example.com");
    assert_eq!(order.reference(), format!("GL-{:06}", order.id.as_i64()));
}

#[tokio::test]
async fn partial_stock_clamps_cart_and_aborts() {
    let pool = test_pool().await;
    let cipher = test_cipher();
    let product = insert_product(&pool, "QuantumBlade NVMe SSD 2TB", "199.00", 2, None).await;

    let carts = CartService::new(&pool);
    carts.add_item(USER, product.id, 5).await.expect("add to cart");

    let outcome = CheckoutService::new(&pool, &cipher)
        .place_order(USER, &valid_checkout())
        .await
        .expect("place order");

    let report = match outcome {
        CheckoutOutcome::StockConflict(report) => report,
        other => panic!("expected StockConflict, got {other:?}"),
    };

    assert_eq!(report.adjustments.len(), 1);
    let adjustment = report.adjustments.first().expect("one adjustment");
    assert_eq!(
        adjustment.kind,
        StockAdjustmentKind::Clamped { available: 2 }
    );

    // Cart persisted in adjusted form; no order; stock untouched.
    assert_eq!(report.cart.get(product.id), Some(2));
    assert_eq!(
        carts.cart(USER).await.expect("cart").get(product.id),
        Some(2)
    );
    assert!(
        OrderService::new(&pool, &cipher)
            .list_for_user(USER)
            .await
            .expect("orders")
            .is_empty()
    );
    assert_eq!(inventory_of(&pool, &product).await, 2);
}

#[tokio::test]
async fn out_of_stock_line_is_dropped() {
    let pool = test_pool().await;
    let cipher = test_cipher();
    let in_stock = insert_product(&pool, "IonCore Thermal Paste X9", "11.00", 10, None).await;
    let sold_out = insert_product(&pool, "VoltStack Portable Power Deck", "649.00", 0, None).await;

    let carts = CartService::new(&pool);
    carts.add_item(USER, in_stock.id, 1).await.expect("add");
    carts.add_item(USER, sold_out.id, 1).await.expect("add");

    let outcome = CheckoutService::new(&pool, &cipher)
        .place_order(USER, &valid_checkout())
        .await
        .expect("place order");

    let report = match outcome {
        CheckoutOutcome::StockConflict(report) => report,
        other => panic!("expected StockConflict, got {other:?}"),
    };

    assert_eq!(report.adjustments.len(), 1);
    let adjustment = report.adjustments.first().expect("one adjustment");
    assert_eq!(adjustment.kind, StockAdjustmentKind::Removed);
    assert_eq!(adjustment.product_id, sold_out.id);

    let persisted = carts.cart(USER).await.expect("cart");
    assert_eq!(persisted.get(in_stock.id), Some(1));
    assert_eq!(persisted.get(sold_out.id), None);

    // Resubmitting the adjusted cart succeeds.
    let outcome = CheckoutService::new(&pool, &cipher)
        .place_order(USER, &valid_checkout())
        .await
        .expect("place order");
    assert!(matches!(outcome, CheckoutOutcome::Placed(_)));
    assert_eq!(inventory_of(&pool, &in_stock).await, 9);
}

#[tokio::test]
async fn validation_failure_mutates_nothing_and_saves_draft() {
    let pool = test_pool().await;
    let cipher = test_cipher();
    let product = insert_product(&pool, "OptiMesh 140mm PWM Fan", "44.00", 5, None).await;

    let carts = CartService::new(&pool);
    carts.add_item(USER, product.id, 2).await.expect("add");

    let mut request = valid_checkout();
    request.email = "not-an-email".to_owned();

    let checkout = CheckoutService::new(&pool, &cipher);
    let outcome = checkout
        .place_order(USER, &request)
        .await
        .expect("place order");

    let errors = match outcome {
        CheckoutOutcome::Invalid(errors) => errors,
        other => panic!("expected Invalid, got {other:?}"),
    };
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.first().map(|e| e.field), Some("email"));

    // No order, no stock movement, cart intact.
    assert_eq!(inventory_of(&pool, &product).await, 5);
    assert_eq!(carts.cart(USER).await.expect("cart").get(product.id), Some(2));

    // The form survives for the resubmit.
    let draft = checkout
        .load_draft(USER)
        .await
        .expect("load draft")
        .expect("draft saved");
    assert_eq!(draft.email, "not-an-email");
}

#[tokio::test]
async fn region_mismatch_is_rejected() {
    let pool = test_pool().await;
    let cipher = test_cipher();
    let product = insert_product(&pool, "LumenStrip Addressable LED Kit", "59.00", 5, None).await;
    CartService::new(&pool)
        .add_item(USER, product.id, 1)
        .await
        .expect("add");

    let mut request = valid_checkout();
    request.region = "QC".to_owned();

    let outcome = CheckoutService::new(&pool, &cipher)
        .place_order(USER, &request)
        .await
        .expect("place order");

    let errors = match outcome {
        CheckoutOutcome::Invalid(errors) => errors,
        other => panic!("expected Invalid, got {other:?}"),
    };
    assert_eq!(errors.first().map(|e| e.field), Some("region"));
}

#[tokio::test]
async fn empty_cart_is_a_rejected_precondition() {
    let pool = test_pool().await;
    let cipher = test_cipher();

    let outcome = CheckoutService::new(&pool, &cipher)
        .place_order(USER, &valid_checkout())
        .await
        .expect("place order");

    let errors = match outcome {
        CheckoutOutcome::Invalid(errors) => errors,
        other => panic!("expected Invalid, got {other:?}"),
    };
    assert_eq!(errors.first().map(|e| e.field), Some("cart"));
}

#[tokio::test]
async fn single_seller_cart_is_attributed_mixed_is_not() {
    let pool = test_pool().await;
    let cipher = test_cipher();
    let seller = SellerId::new(9);
    let a = insert_product(&pool, "CarbonWeave Filament", "96.00", 10, Some(seller)).await;
    let b = insert_product(&pool, "NovaPulse Engraver", "349.00", 10, Some(seller)).await;
    let c = insert_product(&pool, "House Brand Cable", "22.00", 10, Some(SellerId::new(4))).await;

    let carts = CartService::new(&pool);
    let checkout = CheckoutService::new(&pool, &cipher);

    carts.add_item(USER, a.id, 1).await.expect("add");
    carts.add_item(USER, b.id, 1).await.expect("add");
    let CheckoutOutcome::Placed(single) = checkout
        .place_order(USER, &valid_checkout())
        .await
        .expect("place order")
    else {
        panic!("expected Placed");
    };
    assert_eq!(single.seller_id, Some(seller));

    let other = UserId::new(2);
    carts.add_item(other, a.id, 1).await.expect("add");
    carts.add_item(other, c.id, 1).await.expect("add");
    let CheckoutOutcome::Placed(mixed) = checkout
        .place_order(other, &valid_checkout())
        .await
        .expect("place order")
    else {
        panic!("expected Placed");
    };
    assert_eq!(mixed.seller_id, None);
}

#[tokio::test]
async fn order_snapshots_survive_catalog_edits() {
    let pool = test_pool().await;
    let cipher = test_cipher();
    let product = insert_product(&pool, "SymphonyIQ Studio Interface", "259.00", 5, None).await;

    CartService::new(&pool)
        .add_item(USER, product.id, 1)
        .await
        .expect("add");
    let CheckoutOutcome::Placed(order) = CheckoutService::new(&pool, &cipher)
        .place_order(USER, &valid_checkout())
        .await
        .expect("place order")
    else {
        panic!("expected Placed");
    };

    ProductRepository::new(&pool)
        .update(
            product.id,
            &ProductUpdate {
                name: Some("Renamed Interface".to_owned()),
                price: Some(Decimal::from_str("999.00").expect("decimal")),
                ..ProductUpdate::default()
            },
        )
        .await
        .expect("update product");

    let reloaded = OrderService::new(&pool, &cipher)
        .get_for_user(order.id, USER)
        .await
        .expect("get order")
        .expect("order exists");
    let item = reloaded.items.first().expect("line item");
    assert_eq!(item.product_name, "SymphonyIQ Studio Interface");
    assert_eq!(item.unit_price, Decimal::from_str("259.00").expect("decimal"));
}

#[tokio::test]
async fn contact_fields_are_encrypted_at_rest() {
    let pool = test_pool().await;
    let cipher = test_cipher();
    let product = insert_product(&pool, "AetherGrid Relay Hub", "189.00", 5, None).await;

    CartService::new(&pool)
        .add_item(USER, product.id, 1)
        .await
        .expect("add");
    let CheckoutOutcome::Placed(order) = CheckoutService::new(&pool, &cipher)
        .place_order(USER, &valid_checkout())
        .await
        .expect("place order")
    else {
        panic!("expected Placed");
    };

    let (stored_email, stored_name): (String, String) =
        sqlx::query_as("SELECT email, recipient_name FROM orders WHERE id = ?")
            .bind(order.id)
            .fetch_one(&pool)
            .await
            .expect("order row");
    assert!(stored_email.starts_with("gl1:"));
    assert!(stored_name.starts_with("gl1:"));
    assert_ne!(stored_email, "jamie@example.com");

    // Hydration decrypts.
    assert_eq!(order.contact.email, "jamie@example.com");
    assert_eq!(order.contact.recipient_name, "Jamie Rivera");
}
