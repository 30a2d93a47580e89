//! HTTP client for the RajaOngkir-style shipping rate API.
//!
//! All calls carry the API key in the `Key` header and a bounded timeout;
//! transport failures and non-200 `meta.code` responses surface as
//! `ExternalServiceError`.

use crate::config::ShippingConfig;
use crate::errors::ServiceError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{instrument, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Deserialize)]
pub struct Meta {
    pub message: String,
    pub code: i32,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Province {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct City {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub zip_code: String,
}

/// One courier service row from the domestic-cost endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RateResult {
    pub name: String,
    pub code: String,
    pub service: String,
    pub description: String,
    pub cost: i64,
    pub etd: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RateParams {
    pub origin: String,
    pub destination: String,
    /// Total shipment weight in grams
    pub weight: i64,
    pub courier: String,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    meta: Meta,
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Clone)]
pub struct RajaOngkirClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RajaOngkirClient {
    pub fn new(config: &ShippingConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                ServiceError::InternalError(format!("failed to build http client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    #[instrument(skip(self))]
    pub async fn provinces(&self) -> Result<Vec<Province>, ServiceError> {
        let url = format!("{}/destination/province", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Key", &self.api_key)
            .send()
            .await
            .map_err(|e| transport_error("province lookup", e))?;

        unwrap_envelope(response.json::<Envelope<Province>>().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("invalid province response: {}", e))
        })?)
    }

    #[instrument(skip(self))]
    pub async fn cities(&self, province_id: &str) -> Result<Vec<City>, ServiceError> {
        let url = format!("{}/destination/city/{}", self.base_url, province_id);
        let response = self
            .client
            .get(&url)
            .header("Key", &self.api_key)
            .send()
            .await
            .map_err(|e| transport_error("city lookup", e))?;

        unwrap_envelope(response.json::<Envelope<City>>().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("invalid city response: {}", e))
        })?)
    }

    /// Quotes domestic shipping costs. The upstream endpoint takes a
    /// form-encoded body, not JSON.
    #[instrument(skip(self))]
    pub async fn domestic_cost(&self, params: &RateParams) -> Result<Vec<RateResult>, ServiceError> {
        let url = format!("{}/calculate/domestic-cost", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Key", &self.api_key)
            .form(params)
            .send()
            .await
            .map_err(|e| transport_error("rate quote", e))?;

        unwrap_envelope(response.json::<Envelope<RateResult>>().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("invalid rate response: {}", e))
        })?)
    }
}

fn unwrap_envelope<T>(envelope: Envelope<T>) -> Result<Vec<T>, ServiceError> {
    if envelope.meta.code != 200 {
        warn!(
            code = envelope.meta.code,
            status = %envelope.meta.status,
            "shipping provider returned an error"
        );
        return Err(ServiceError::ExternalServiceError(format!(
            "shipping provider error: {} ({})",
            envelope.meta.message, envelope.meta.code
        )));
    }
    Ok(envelope.data)
}

fn transport_error(what: &str, err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        ServiceError::ExternalServiceError(format!("{} timed out", what))
    } else {
        ServiceError::ExternalServiceError(format!("{} failed: {}", what, err))
    }
}
