mod common;

use common::TestApp;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;
use storefront_api::{
    entities::{order, order_customer, order_item},
    errors::ServiceError,
    services::{carts::AddItemInput, checkout::CheckoutInput},
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn checkout_input(selection: &str) -> CheckoutInput {
    CheckoutInput {
        destination_city_id: "39".to_string(),
        destination_province_id: "5".to_string(),
        address: "Jl. Malioboro 1".to_string(),
        phone: "+62811111111".to_string(),
        post_code: "55213".to_string(),
        shipping_selection: selection.to_string(),
    }
}

async fn mock_shipping_rates(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/calculate/domestic-cost"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": { "message": "OK", "code": 200, "status": "success" },
            "data": [
                {
                    "name": "Jalur Nugraha Ekakurir (JNE)",
                    "code": "jne",
                    "service": "REG",
                    "description": "Layanan Reguler",
                    "cost": 18000,
                    "etd": "2-3 day"
                },
                {
                    "name": "Jalur Nugraha Ekakurir (JNE)",
                    "code": "jne",
                    "service": "YES",
                    "description": "Yakin Esok Sampai",
                    "cost": 30000,
                    "etd": "1 day"
                }
            ]
        })))
        .mount(server)
        .await;
}

async fn mock_gateway_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/transactions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "token": "snap-token-123",
            "redirect_url": "https://gateway.test/pay/snap-token-123"
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn checkout_creates_a_full_order_snapshot() {
    let gateway = MockServer::start().await;
    let shipping = MockServer::start().await;
    mock_gateway_token(&gateway).await;
    mock_shipping_rates(&shipping).await;

    let app = TestApp::with_endpoints(&gateway.uri(), &shipping.uri()).await;
    let customer = app.seed_user().await;
    let product_id = app.seed_product(dec!(75000), 10, dec!(1)).await;

    app.state
        .services
        .carts
        .add_item(
            "session-co",
            AddItemInput {
                product_id,
                quantity: 2,
                design_path: None,
                custom_type: None,
                custom_size: None,
            },
        )
        .await
        .unwrap();

    let order = app
        .state
        .services
        .checkout
        .create_order(&customer, "session-co", checkout_input("jne-reg"))
        .await
        .unwrap();

    // base 150000, tax 16500, shipping 18000
    assert_eq!(order.base_total, dec!(150000));
    assert_eq!(order.tax_amount, dec!(16500));
    assert_eq!(order.shipping_cost, dec!(18000));
    assert_eq!(order.grand_total, dec!(184500));
    assert_eq!(order.payment_status, order::PaymentStatus::Unpaid);
    assert_eq!(order.fulfillment_status, order::FulfillmentStatus::Pending);
    assert_eq!(order.payment_token.as_deref(), Some("snap-token-123"));
    assert_eq!(order.shipping_courier, "jne");
    assert!(order.shipping_service.starts_with("REG"));
    assert!(order.order_number.contains("/ORDER/"));
    assert!(order.payment_due > order.order_date);

    let items = order_item::Entity::find()
        .filter(order_item::Column::OrderId.eq(order.id))
        .all(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 2);
    assert_eq!(items[0].base_price, dec!(75000));
    assert_eq!(items[0].weight, dec!(1));

    let snapshot = order_customer::Entity::find()
        .filter(order_customer::Column::OrderId.eq(order.id))
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.city_id, "39");
    assert_eq!(snapshot.email, customer.email);
}

#[tokio::test]
async fn legacy_label_selection_still_resolves() {
    let gateway = MockServer::start().await;
    let shipping = MockServer::start().await;
    mock_gateway_token(&gateway).await;
    mock_shipping_rates(&shipping).await;

    let app = TestApp::with_endpoints(&gateway.uri(), &shipping.uri()).await;
    let customer = app.seed_user().await;
    let product_id = app.seed_product(dec!(50000), 10, dec!(1)).await;

    app.state
        .services
        .carts
        .add_item(
            "session-legacy",
            AddItemInput {
                product_id,
                quantity: 1,
                design_path: None,
                custom_type: None,
                custom_size: None,
            },
        )
        .await
        .unwrap();

    let order = app
        .state
        .services
        .checkout
        .create_order(
            &customer,
            "session-legacy",
            checkout_input("jne YES (Yakin Esok Sampai) - Rp30.000"),
        )
        .await
        .unwrap();

    assert_eq!(order.shipping_cost, dec!(30000));
}

#[tokio::test]
async fn gateway_rejection_leaves_no_order_row() {
    let gateway = MockServer::start().await;
    let shipping = MockServer::start().await;
    mock_shipping_rates(&shipping).await;
    Mock::given(method("POST"))
        .and(path("/transactions"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&gateway)
        .await;

    let app = TestApp::with_endpoints(&gateway.uri(), &shipping.uri()).await;
    let customer = app.seed_user().await;
    let product_id = app.seed_product(dec!(50000), 10, dec!(1)).await;

    app.state
        .services
        .carts
        .add_item(
            "session-fail",
            AddItemInput {
                product_id,
                quantity: 1,
                design_path: None,
                custom_type: None,
                custom_size: None,
            },
        )
        .await
        .unwrap();

    let err = app
        .state
        .services
        .checkout
        .create_order(&customer, "session-fail", checkout_input("jne-reg"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::PaymentFailed(_)));

    let orders = order::Entity::find().count(&*app.state.db).await.unwrap();
    assert_eq!(orders, 0);
}

#[tokio::test]
async fn order_numbers_come_from_a_durable_sequence() {
    let gateway = MockServer::start().await;
    let shipping = MockServer::start().await;
    mock_gateway_token(&gateway).await;
    mock_shipping_rates(&shipping).await;

    let app = TestApp::with_endpoints(&gateway.uri(), &shipping.uri()).await;
    let customer = app.seed_user().await;
    let product_id = app.seed_product(dec!(50000), 100, dec!(1)).await;

    let mut orders = Vec::new();
    for session in ["seq-1", "seq-2"] {
        app.state
            .services
            .carts
            .add_item(
                session,
                AddItemInput {
                    product_id,
                    quantity: 1,
                    design_path: None,
                    custom_type: None,
                    custom_size: None,
                },
            )
            .await
            .unwrap();
        let order = app
            .state
            .services
            .checkout
            .create_order(&customer, session, checkout_input("jne-reg"))
            .await
            .unwrap();
        orders.push(order);
    }

    assert!(orders[0].order_number.starts_with("1/ORDER/"));
    assert!(orders[1].order_number.starts_with("2/ORDER/"));

    // Deleting an order must not let a later one reuse its number.
    order_item::Entity::delete_many()
        .filter(order_item::Column::OrderId.eq(orders[0].id))
        .exec(&*app.state.db)
        .await
        .unwrap();
    order_customer::Entity::delete_many()
        .filter(order_customer::Column::OrderId.eq(orders[0].id))
        .exec(&*app.state.db)
        .await
        .unwrap();
    order::Entity::delete_by_id(orders[0].id)
        .exec(&*app.state.db)
        .await
        .unwrap();

    app.state
        .services
        .carts
        .add_item(
            "seq-3",
            AddItemInput {
                product_id,
                quantity: 1,
                design_path: None,
                custom_type: None,
                custom_size: None,
            },
        )
        .await
        .unwrap();
    let third = app
        .state
        .services
        .checkout
        .create_order(&customer, "seq-3", checkout_input("jne-reg"))
        .await
        .unwrap();

    assert!(third.order_number.starts_with("3/ORDER/"));
}

#[tokio::test]
async fn empty_cart_cannot_check_out() {
    let app = TestApp::new().await;
    let customer = app.seed_user().await;

    let err = app
        .state
        .services
        .checkout
        .create_order(&customer, "session-empty", checkout_input("jne-reg"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn unknown_shipping_selection_is_rejected() {
    let gateway = MockServer::start().await;
    let shipping = MockServer::start().await;
    mock_gateway_token(&gateway).await;
    mock_shipping_rates(&shipping).await;

    let app = TestApp::with_endpoints(&gateway.uri(), &shipping.uri()).await;
    let customer = app.seed_user().await;
    let product_id = app.seed_product(dec!(50000), 10, dec!(1)).await;

    app.state
        .services
        .carts
        .add_item(
            "session-badopt",
            AddItemInput {
                product_id,
                quantity: 1,
                design_path: None,
                custom_type: None,
                custom_size: None,
            },
        )
        .await
        .unwrap();

    let err = app
        .state
        .services
        .checkout
        .create_order(&customer, "session-badopt", checkout_input("sicepat-best"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    let orders = order::Entity::find().count(&*app.state.db).await.unwrap();
    assert_eq!(orders, 0);
}
