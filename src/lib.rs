pub mod clients;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod pricing;
pub mod services;
pub mod session;

use axum::{routing::get, Json, Router};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};

use crate::clients::{midtrans::MidtransClient, rajaongkir::RajaOngkirClient};
use crate::services::{
    carts::CartService, catalog::CatalogService, checkout::CheckoutService,
    housekeeping::HousekeepingService, payments::PaymentReconciliationService,
    shipping::ShippingService,
};
use crate::session::{InMemorySessionStore, SessionStore};

/// Service registry shared by all handlers.
#[derive(Clone)]
pub struct AppServices {
    pub carts: CartService,
    pub catalog: CatalogService,
    pub checkout: CheckoutService,
    pub payments: PaymentReconciliationService,
    pub shipping: ShippingService,
    pub housekeeping: HousekeepingService,
}

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub session_store: Arc<dyn SessionStore>,
    pub services: AppServices,
}

impl AppState {
    /// Wires the clients and services from configuration.
    pub fn build(
        config: config::AppConfig,
        db: Arc<DatabaseConnection>,
        event_sender: events::EventSender,
    ) -> Result<Self, errors::ServiceError> {
        let event_sender_arc = Arc::new(event_sender.clone());

        let gateway = Arc::new(MidtransClient::new(&config.payment)?);
        let rate_client = Arc::new(RajaOngkirClient::new(&config.shipping)?);

        let carts = CartService::new(
            db.clone(),
            event_sender_arc.clone(),
            rust_decimal::Decimal::from(config.default_tax_percent),
        );
        let catalog = CatalogService::new(db.clone(), config.upload_dir.clone());
        let shipping = ShippingService::new(rate_client, &config.shipping);
        let housekeeping = HousekeepingService::new(
            db.clone(),
            config.upload_dir.clone(),
            config.design_dir.clone(),
            config.sweep_min_age_hours,
        );
        let checkout = CheckoutService::new(
            db.clone(),
            event_sender_arc.clone(),
            gateway,
            shipping.clone(),
            carts.clone(),
            housekeeping.clone(),
            config.payment.payment_due_days,
        );
        let payments = PaymentReconciliationService::new(
            db.clone(),
            event_sender_arc,
            config.payment.server_key.clone(),
        );

        Ok(Self {
            db,
            config,
            event_sender,
            session_store: Arc::new(InMemorySessionStore::new()),
            services: AppServices {
                carts,
                catalog,
                checkout,
                payments,
                shipping,
                housekeeping,
            },
        })
    }
}

/// Common response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// Versioned API routes.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .nest("/products", handlers::products::products_routes())
        .nest("/cart", handlers::carts::carts_routes())
        .nest("/shipping", handlers::shipping::shipping_routes())
        .nest("/checkout", handlers::checkout::checkout_routes())
        .nest("/orders", handlers::orders::orders_routes())
        .nest("/payments", handlers::payment_webhooks::payment_webhook_routes())
        .nest("/customers", handlers::customers::customers_routes())
}

/// Builds the full application router with middleware layers applied.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(api_status))
        .nest("/api/v1", api_v1_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(CompressionLayer::new())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn api_status() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
