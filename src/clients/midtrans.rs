//! HTTP client for the Snap-style payment gateway.
//!
//! Checkout calls `create_transaction` before any order row is persisted;
//! the returned token is the only gateway artifact stored on the order.

use crate::config::PaymentConfig;
use crate::errors::ServiceError;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{instrument, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Serialize)]
pub struct TransactionDetails {
    pub order_id: String,
    /// Integer minor units, truncated from the decimal grand total
    pub gross_amount: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapRequest {
    pub transaction_details: TransactionDetails,
    pub customer_details: CustomerDetails,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapResponse {
    pub token: String,
    #[serde(default)]
    pub redirect_url: String,
}

#[derive(Clone)]
pub struct MidtransClient {
    client: reqwest::Client,
    base_url: String,
    server_key: String,
}

impl MidtransClient {
    pub fn new(config: &PaymentConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                ServiceError::InternalError(format!("failed to build http client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            server_key: config.server_key.clone(),
        })
    }

    /// Creates a gateway transaction and returns the opaque payment token.
    #[instrument(skip(self, request), fields(order_id = %request.transaction_details.order_id))]
    pub async fn create_transaction(
        &self,
        request: &SnapRequest,
    ) -> Result<SnapResponse, ServiceError> {
        let url = format!("{}/transactions", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.basic_auth())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ServiceError::ExternalServiceError("payment gateway timed out".to_string())
                } else {
                    ServiceError::ExternalServiceError(format!("payment gateway error: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, %body, "gateway rejected transaction");
            return Err(ServiceError::PaymentFailed(format!(
                "gateway rejected transaction ({})",
                status
            )));
        }

        response.json::<SnapResponse>().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("invalid gateway response: {}", e))
        })
    }

    // Snap auth is HTTP Basic with the server key as username and no password.
    fn basic_auth(&self) -> String {
        let encoded =
            base64::engine::general_purpose::STANDARD.encode(format!("{}:", self.server_key));
        format!("Basic {}", encoded)
    }
}
