use std::sync::Arc;

use rust_decimal_macros::dec;
use storefront_api::{
    clients::rajaongkir::{RajaOngkirClient, RateParams},
    config::ShippingConfig,
    errors::ServiceError,
    services::shipping::ShippingService,
};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn shipping_config(base_url: &str) -> ShippingConfig {
    ShippingConfig {
        base_url: base_url.to_string(),
        api_key: "test-api-key".to_string(),
        origin_city_id: "501".to_string(),
        couriers: "jne".to_string(),
    }
}

fn client(server: &MockServer) -> RajaOngkirClient {
    RajaOngkirClient::new(&shipping_config(&server.uri())).unwrap()
}

#[tokio::test]
async fn provinces_unwraps_the_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/destination/province"))
        .and(header("Key", "test-api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": { "message": "OK", "code": 200, "status": "success" },
            "data": [
                { "id": 5, "name": "DI Yogyakarta" },
                { "id": 6, "name": "DKI Jakarta" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provinces = client(&server).provinces().await.unwrap();
    assert_eq!(provinces.len(), 2);
    assert_eq!(provinces[0].id, 5);
    assert_eq!(provinces[0].name, "DI Yogyakarta");

    // Handlers return these rows as JSON bodies.
    let body = serde_json::to_value(&provinces).unwrap();
    assert_eq!(body[0]["name"], "DI Yogyakarta");
}

#[tokio::test]
async fn provider_error_meta_surfaces_as_external_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/destination/province"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": { "message": "Invalid key", "code": 401, "status": "error" },
            "data": []
        })))
        .mount(&server)
        .await;

    let err = client(&server).provinces().await.unwrap_err();
    assert!(matches!(err, ServiceError::ExternalServiceError(msg) if msg.contains("Invalid key")));
}

#[tokio::test]
async fn domestic_cost_posts_a_form_encoded_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/calculate/domestic-cost"))
        .and(header("Key", "test-api-key"))
        .and(header(
            "content-type",
            "application/x-www-form-urlencoded",
        ))
        .and(body_string_contains("origin=501"))
        .and(body_string_contains("destination=39"))
        .and(body_string_contains("weight=3"))
        .and(body_string_contains("courier=jne"))
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
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let rates = client(&server)
        .domestic_cost(&RateParams {
            origin: "501".to_string(),
            destination: "39".to_string(),
            weight: 3,
            courier: "jne".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(rates.len(), 1);
    assert_eq!(rates[0].cost, 18000);
    assert_eq!(rates[0].service, "REG");
}

#[tokio::test]
async fn options_map_rate_rows_to_selectable_offers() {
    let server = MockServer::start().await;
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
        .mount(&server)
        .await;

    let config = shipping_config(&server.uri());
    let service = ShippingService::new(Arc::new(RajaOngkirClient::new(&config).unwrap()), &config);

    let options = service.options("39", 3).await.unwrap();
    assert_eq!(options.len(), 2);
    assert_eq!(options[0].id, "jne-reg");
    assert_eq!(options[0].service, "REG (Layanan Reguler)");
    assert_eq!(options[0].fee, dec!(18000));
    assert_eq!(options[1].id, "jne-yes");
}

#[tokio::test]
async fn options_reject_bad_destination_and_weight() {
    let server = MockServer::start().await;
    let config = shipping_config(&server.uri());
    let service = ShippingService::new(Arc::new(RajaOngkirClient::new(&config).unwrap()), &config);

    let err = service.options("", 3).await.unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    let err = service.options("39", 0).await.unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}
