use std::sync::Arc;

use axum::Router;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use storefront_api::{
    config::{AppConfig, PaymentConfig, ShippingConfig},
    db,
    entities::{product, user},
    events::{self, EventSender},
    AppState,
};
use tempfile::TempDir;
use tokio::sync::mpsc;
use uuid::Uuid;

pub const TEST_SERVER_KEY: &str = "test-server-key";

/// Test harness: application state over a fresh SQLite database in a
/// temporary directory, with external endpoints pointed wherever the test
/// needs them (usually a wiremock server).
pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    _event_task: tokio::task::JoinHandle<()>,
    _tmp: TempDir,
}

impl TestApp {
    #[allow(dead_code)]
    pub async fn new() -> Self {
        Self::with_endpoints("http://127.0.0.1:1", "http://127.0.0.1:1").await
    }

    /// Construct a test application whose gateway and shipping clients call
    /// the given base URLs.
    pub async fn with_endpoints(payment_base: &str, shipping_base: &str) -> Self {
        let tmp = TempDir::new().expect("failed to create temp dir");
        let db_file = tmp.path().join("storefront_test.db");

        let cfg = AppConfig {
            database_url: format!("sqlite://{}?mode=rwc", db_file.display()),
            host: "127.0.0.1".to_string(),
            port: 18_080,
            environment: "test".to_string(),
            log_level: "warn".to_string(),
            log_json: false,
            auto_migrate: true,
            db_max_connections: 1,
            default_tax_percent: 11,
            upload_dir: tmp.path().join("uploads").display().to_string(),
            design_dir: tmp.path().join("designs").display().to_string(),
            sweep_interval_secs: 3600,
            sweep_min_age_hours: 0,
            payment: PaymentConfig {
                base_url: payment_base.to_string(),
                server_key: TEST_SERVER_KEY.to_string(),
                payment_due_days: 7,
            },
            shipping: ShippingConfig {
                base_url: shipping_base.to_string(),
                api_key: "test-api-key".to_string(),
                origin_city_id: "501".to_string(),
                couriers: "jne".to_string(),
            },
        };

        let pool = db::establish_connection_with_config(&db::DbConfig {
            url: cfg.database_url.clone(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        })
        .await
        .expect("failed to create test database");

        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_tx, event_rx) = mpsc::channel(1024);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state =
            AppState::build(cfg, Arc::new(pool), event_sender).expect("failed to build app state");
        let router = storefront_api::app(state.clone());

        Self {
            state,
            router,
            _event_task: event_task,
            _tmp: tmp,
        }
    }

    /// Inserts a catalog product and returns its id.
    pub async fn seed_product(&self, price: Decimal, stock: i32, weight: Decimal) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();

        product::ActiveModel {
            id: Set(id),
            sku: Set(format!("SKU-{}", &id.simple().to_string()[..8])),
            name: Set("Test Product".to_string()),
            slug: Set(format!("test-product-{}", id)),
            price: Set(price),
            stock: Set(stock),
            weight: Set(weight),
            short_description: Set(None),
            description: Set(None),
            is_temporary: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed product");

        id
    }

    /// Inserts a customer profile and returns the model.
    #[allow(dead_code)]
    pub async fn seed_user(&self) -> user::Model {
        let id = Uuid::new_v4();
        let now = Utc::now();

        user::ActiveModel {
            id: Set(id),
            first_name: Set("Ada".to_string()),
            last_name: Set("Lovelace".to_string()),
            email: Set(format!("ada-{}@example.com", id)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed user")
    }
}
