mod common;

use common::TestApp;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use storefront_api::{entities::product, errors::ServiceError, services::carts::AddItemInput};
use uuid::Uuid;

fn add_input(product_id: Uuid, quantity: i32) -> AddItemInput {
    AddItemInput {
        product_id,
        quantity,
        design_path: None,
        custom_type: None,
        custom_size: None,
    }
}

#[tokio::test]
async fn get_or_create_is_unique_per_session() {
    let app = TestApp::new().await;
    let carts = &app.state.services.carts;

    let first = carts.get_or_create("session-a").await.unwrap();
    let again = carts.get_or_create("session-a").await.unwrap();
    let other = carts.get_or_create("session-b").await.unwrap();

    assert_eq!(first.id, again.id);
    assert_ne!(first.id, other.id);
    assert_eq!(first.tax_percent, dec!(11));
    assert_eq!(first.grand_total, dec!(0));
}

#[tokio::test]
async fn adding_same_product_merges_into_one_line() {
    let app = TestApp::new().await;
    let carts = &app.state.services.carts;
    let product_id = app.seed_product(dec!(75000), 10, dec!(1)).await;

    carts
        .add_item("session-1", add_input(product_id, 2))
        .await
        .unwrap();
    carts
        .add_item("session-1", add_input(product_id, 3))
        .await
        .unwrap();

    let view = carts.get_cart("session-1").await.unwrap();
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].quantity, 5);
    assert_eq!(view.items[0].base_total, dec!(375000));
}

#[tokio::test]
async fn totals_match_the_reference_scenario() {
    // 75000 × 2 + 40000 × 1 at 11% tax
    let app = TestApp::new().await;
    let carts = &app.state.services.carts;
    let shirt = app.seed_product(dec!(75000), 10, dec!(1)).await;
    let mug = app.seed_product(dec!(40000), 10, dec!(1)).await;

    carts.add_item("s", add_input(shirt, 2)).await.unwrap();
    let cart = carts.add_item("s", add_input(mug, 1)).await.unwrap();

    assert_eq!(cart.base_total, dec!(190000));
    assert_eq!(cart.tax_amount, dec!(20900));
    assert_eq!(cart.discount_amount, dec!(0));
    assert_eq!(cart.grand_total, dec!(210900));
}

#[tokio::test]
async fn grand_total_includes_shipping_fee() {
    let app = TestApp::new().await;
    let carts = &app.state.services.carts;
    let product_id = app.seed_product(dec!(100000), 5, dec!(1)).await;

    carts.add_item("s", add_input(product_id, 1)).await.unwrap();
    let cart = carts.apply_shipping_fee("s", dec!(18000)).await.unwrap();

    // 100000 + 11000 tax + 18000 shipping
    assert_eq!(cart.shipping_fee, dec!(18000));
    assert_eq!(cart.grand_total, dec!(129000));
}

#[tokio::test]
async fn stock_is_enforced_on_add() {
    let app = TestApp::new().await;
    let carts = &app.state.services.carts;
    let product_id = app.seed_product(dec!(50000), 3, dec!(1)).await;

    let err = carts
        .add_item("s", add_input(product_id, 4))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InsufficientStock(_)));

    let missing = carts
        .add_item("s", add_input(Uuid::new_v4(), 1))
        .await
        .unwrap_err();
    assert!(matches!(missing, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn update_quantity_resnapshots_from_current_price() {
    let app = TestApp::new().await;
    let carts = &app.state.services.carts;
    let product_id = app.seed_product(dec!(10000), 10, dec!(1)).await;

    let cart = carts.add_item("s", add_input(product_id, 1)).await.unwrap();
    let view = carts.get_cart("s").await.unwrap();
    let item_id = view.items[0].id;
    assert_eq!(cart.base_total, dec!(10000));

    // Reprice the product; the line must pick up the new price.
    let existing = product::Entity::find_by_id(product_id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    let mut repriced: product::ActiveModel = existing.into();
    repriced.price = Set(dec!(12000));
    repriced.update(&*app.state.db).await.unwrap();

    let cart = carts.update_item_quantity("s", item_id, 3).await.unwrap();
    assert_eq!(cart.base_total, dec!(36000));
    assert_eq!(cart.tax_amount, dec!(3960));

    let view = carts.get_cart("s").await.unwrap();
    assert_eq!(view.items[0].base_price, dec!(12000));
    assert_eq!(
        view.items[0].sub_total,
        dec!(3) * (dec!(12000) + dec!(1320))
    );
}

#[tokio::test]
async fn zero_quantity_update_is_rejected() {
    let app = TestApp::new().await;
    let carts = &app.state.services.carts;
    let product_id = app.seed_product(dec!(10000), 10, dec!(1)).await;

    carts.add_item("s", add_input(product_id, 1)).await.unwrap();
    let view = carts.get_cart("s").await.unwrap();

    let err = carts
        .update_item_quantity("s", view.items[0].id, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn removing_missing_item_is_a_noop_success() {
    let app = TestApp::new().await;
    let carts = &app.state.services.carts;
    let product_id = app.seed_product(dec!(10000), 10, dec!(1)).await;

    carts.add_item("s", add_input(product_id, 2)).await.unwrap();
    let before = carts.get_cart("s").await.unwrap();

    let cart = carts.remove_item("s", Uuid::new_v4()).await.unwrap();
    assert_eq!(cart.grand_total, before.cart.grand_total);

    let view = carts.get_cart("s").await.unwrap();
    assert_eq!(view.items.len(), 1);
}

#[tokio::test]
async fn removing_from_a_session_without_a_cart_succeeds() {
    let app = TestApp::new().await;
    let carts = &app.state.services.carts;

    let cart = carts
        .remove_item("session-never-seen", Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(cart.grand_total, dec!(0));
    assert!(cart.base_total.is_zero());
}

#[tokio::test]
async fn remove_then_totals_drop_to_zero() {
    let app = TestApp::new().await;
    let carts = &app.state.services.carts;
    let product_id = app.seed_product(dec!(10000), 10, dec!(1)).await;

    carts.add_item("s", add_input(product_id, 2)).await.unwrap();
    let view = carts.get_cart("s").await.unwrap();

    let cart = carts.remove_item("s", view.items[0].id).await.unwrap();
    assert_eq!(cart.base_total, dec!(0));
    assert_eq!(cart.grand_total, dec!(0));
}

#[tokio::test]
async fn clear_is_idempotent_and_deletes_the_cart() {
    let app = TestApp::new().await;
    let carts = &app.state.services.carts;
    let product_id = app.seed_product(dec!(10000), 10, dec!(1)).await;

    carts.add_item("s", add_input(product_id, 1)).await.unwrap();
    carts.clear("s").await.unwrap();
    carts.clear("s").await.unwrap();

    let view = carts.get_cart("s").await.unwrap();
    assert!(view.items.is_empty());
    assert_eq!(view.cart.grand_total, dec!(0));
}

#[tokio::test]
async fn total_weight_uses_ceiled_product_weight() {
    let app = TestApp::new().await;
    let carts = &app.state.services.carts;
    let light = app.seed_product(dec!(10000), 10, dec!(0.3)).await;
    let heavy = app.seed_product(dec!(20000), 10, dec!(2.5)).await;

    carts.add_item("s", add_input(light, 2)).await.unwrap();
    carts.add_item("s", add_input(heavy, 1)).await.unwrap();

    let view = carts.get_cart("s").await.unwrap();
    // 2 × ceil(0.3) + 1 × ceil(2.5) = 2 + 3
    assert_eq!(view.total_weight, 5);
}
