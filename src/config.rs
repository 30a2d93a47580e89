use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::info;
use validator::{Validate, ValidationError, ValidationErrors};

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_TAX_PERCENT: u32 = 11;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 3600;

/// Payment gateway (Midtrans-compatible) configuration.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct PaymentConfig {
    /// Base URL of the Snap-style transaction API
    pub base_url: String,

    /// Server key used for Basic auth and callback signatures
    #[validate(length(min = 1))]
    pub server_key: String,

    /// Days until an unpaid order's payment is due
    #[serde(default = "default_payment_due_days")]
    pub payment_due_days: i64,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            base_url: "https://app.sandbox.midtrans.com/snap/v1".to_string(),
            server_key: String::new(),
            payment_due_days: default_payment_due_days(),
        }
    }
}

/// Shipping rate provider (RajaOngkir-compatible) configuration.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ShippingConfig {
    /// Base URL of the rate provider API
    pub base_url: String,

    /// API key sent in the `Key` request header
    #[validate(length(min = 1))]
    pub api_key: String,

    /// Origin city id used for every rate quote
    pub origin_city_id: String,

    /// Courier codes offered at checkout, colon separated (e.g. "jne:sicepat")
    #[serde(default = "default_couriers")]
    pub couriers: String,
}

impl Default for ShippingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://rajaongkir.komerce.id/api/v1".to_string(),
            api_key: String::new(),
            origin_city_id: String::new(),
            couriers: default_couriers(),
        }
    }
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// Maximum database connections in the pool
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// Tax percentage applied when a product carries none of its own
    #[serde(default = "default_tax_percent")]
    #[validate(custom = "validate_tax_percent")]
    pub default_tax_percent: u32,

    /// Directory where uploaded custom design files land before checkout
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,

    /// Directory design files are moved to once an order is placed
    #[serde(default = "default_design_dir")]
    pub design_dir: String,

    /// Seconds between housekeeping sweeps for orphaned custom products
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Minimum age in hours before an orphaned custom product is swept
    #[serde(default = "default_sweep_min_age")]
    pub sweep_min_age_hours: i64,

    /// Payment gateway settings
    #[serde(default)]
    #[validate]
    pub payment: PaymentConfig,

    /// Shipping rate provider settings
    #[serde(default)]
    #[validate]
    pub shipping: ShippingConfig,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_tax_percent() -> u32 {
    DEFAULT_TAX_PERCENT
}

fn default_payment_due_days() -> i64 {
    7
}

fn default_couriers() -> String {
    "jne".to_string()
}

fn default_upload_dir() -> String {
    "uploads".to_string()
}

fn default_design_dir() -> String {
    "designs".to_string()
}

fn default_sweep_interval() -> u64 {
    DEFAULT_SWEEP_INTERVAL_SECS
}

fn default_sweep_min_age() -> i64 {
    24
}

fn validate_tax_percent(percent: u32) -> Result<(), ValidationError> {
    if percent > 100 {
        let mut err = ValidationError::new("default_tax_percent");
        err.message = Some("default_tax_percent must be between 0 and 100".into());
        return Err(err);
    }
    Ok(())
}

impl AppConfig {
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationErrors),
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let default_directive = format!("storefront_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Default config (config/default.toml)
/// 2. Environment-specific config (config/{env}.toml)
/// 3. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());

    let mut builder = Config::builder()
        .add_source(File::from(Path::new(CONFIG_DIR).join("default")).required(false));

    let env_file = Path::new(CONFIG_DIR).join(&run_env);
    builder = builder.add_source(File::from(env_file).required(false));

    let settings = builder
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = settings.try_deserialize()?;
    app_config.validate()?;

    info!(
        environment = %app_config.environment,
        port = app_config.port,
        "configuration loaded"
    );

    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig {
            database_url: "sqlite::memory:".to_string(),
            host: "127.0.0.1".to_string(),
            port: default_port(),
            environment: default_environment(),
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: true,
            db_max_connections: default_db_max_connections(),
            default_tax_percent: default_tax_percent(),
            upload_dir: default_upload_dir(),
            design_dir: default_design_dir(),
            sweep_interval_secs: default_sweep_interval(),
            sweep_min_age_hours: default_sweep_min_age(),
            payment: PaymentConfig {
                server_key: "test-server-key".to_string(),
                ..Default::default()
            },
            shipping: ShippingConfig {
                api_key: "test-api-key".to_string(),
                origin_city_id: "501".to_string(),
                ..Default::default()
            },
        }
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = base_config();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.default_tax_percent, 11);
        assert_eq!(cfg.payment.payment_due_days, 7);
    }

    #[test]
    fn tax_percent_over_100_is_rejected() {
        let mut cfg = base_config();
        cfg.default_tax_percent = 120;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn server_addr_joins_host_and_port() {
        let cfg = base_config();
        assert_eq!(cfg.server_addr(), "127.0.0.1:8080");
    }
}
