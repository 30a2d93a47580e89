use crate::{
    entities::{order, payment},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{document_number, next_document_sequence},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, QuerySelect, Set, TransactionTrait,
};
use serde::Deserialize;
use sha2::{Digest, Sha512};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Gateway notification payload. Unknown fields are retained only through the
/// raw JSON kept for the audit row.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayNotification {
    pub order_id: String,
    pub status_code: String,
    pub gross_amount: String,
    pub signature_key: String,
    pub transaction_status: String,
    #[serde(default)]
    pub fraud_status: Option<String>,
    #[serde(default)]
    pub transaction_id: String,
    #[serde(default)]
    pub payment_type: String,
}

/// Exhaustive gateway transaction statuses. Anything else is an error, never
/// a silent bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayStatus {
    Capture,
    Settlement,
    Pending,
    Deny,
    Expire,
    Cancel,
}

impl FromStr for GatewayStatus {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "capture" => Ok(Self::Capture),
            "settlement" => Ok(Self::Settlement),
            "pending" => Ok(Self::Pending),
            "deny" => Ok(Self::Deny),
            "expire" => Ok(Self::Expire),
            "cancel" => Ok(Self::Cancel),
            other => Err(ServiceError::UnknownGatewayStatus(other.to_string())),
        }
    }
}

/// Result of processing one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    Processed {
        order_id: Uuid,
        payment_status: order::PaymentStatus,
    },
    /// The order was already paid; acknowledged so the gateway stops retrying
    AlreadyProcessed { order_id: Uuid },
}

/// Signature-verified, idempotent webhook processing.
#[derive(Clone)]
pub struct PaymentReconciliationService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    server_key: String,
}

impl PaymentReconciliationService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        server_key: String,
    ) -> Self {
        Self {
            db,
            event_sender,
            server_key,
        }
    }

    /// Processes a raw gateway notification.
    ///
    /// The signature is verified before any database access; duplicate
    /// settlements serialize on the locked order row and report
    /// `AlreadyProcessed` instead of transitioning twice.
    #[instrument(skip(self, raw))]
    pub async fn handle_notification(
        &self,
        raw: serde_json::Value,
    ) -> Result<NotificationOutcome, ServiceError> {
        let notification: GatewayNotification = serde_json::from_value(raw.clone())
            .map_err(|e| ServiceError::BadRequest(format!("malformed notification: {}", e)))?;

        if !self.signature_valid(&notification) {
            warn!(order_id = %notification.order_id, "notification signature mismatch");
            return Err(ServiceError::Unauthorized(
                "invalid notification signature".to_string(),
            ));
        }

        let order_id = Uuid::parse_str(&notification.order_id).map_err(|_| {
            ServiceError::NotFound(format!("Order {} not found", notification.order_id))
        })?;

        let txn = self.db.begin().await?;

        let existing = order::Entity::find_by_id(order_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        // Paid is terminal; re-checked under the row lock so concurrent
        // duplicates serialize.
        if existing.payment_status == order::PaymentStatus::Paid {
            txn.commit().await?;
            return Ok(NotificationOutcome::AlreadyProcessed { order_id });
        }

        let status = GatewayStatus::from_str(&notification.transaction_status)?;

        // Audit row for every accepted notification, success or not.
        let amount = Decimal::from_str(&notification.gross_amount).map_err(|_| {
            ServiceError::BadRequest(format!(
                "invalid gross amount: {}",
                notification.gross_amount
            ))
        })?;
        let sequence = next_document_sequence(&txn, "PAYMENT").await?;
        let now = Utc::now();

        let audit = payment::ActiveModel {
            id: Set(Uuid::new_v4()),
            number: Set(document_number(sequence, "PAYMENT", now)),
            order_id: Set(order_id),
            amount: Set(amount),
            transaction_id: Set(notification.transaction_id.clone()),
            transaction_status: Set(notification.transaction_status.clone()),
            payment_type: Set(notification.payment_type.clone()),
            payload: Set(raw),
            created_at: Set(now),
        };
        audit.insert(&txn).await?;

        let fraud_accepted = notification.fraud_status.as_deref() == Some("accept");
        let success = matches!(status, GatewayStatus::Settlement)
            || (matches!(status, GatewayStatus::Capture) && fraud_accepted);

        let payment_status = if success {
            order::PaymentStatus::Paid
        } else {
            match status {
                GatewayStatus::Pending | GatewayStatus::Capture => order::PaymentStatus::Pending,
                GatewayStatus::Deny => order::PaymentStatus::Failed,
                GatewayStatus::Expire => order::PaymentStatus::Expired,
                GatewayStatus::Cancel => order::PaymentStatus::Canceled,
                GatewayStatus::Settlement => unreachable!(),
            }
        };

        let mut updated: order::ActiveModel = existing.into();
        updated.payment_status = Set(payment_status);
        if success {
            updated.fulfillment_status = Set(order::FulfillmentStatus::Received);
        }
        updated.updated_at = Set(now);
        updated.update(&txn).await?;

        txn.commit().await?;

        if success {
            self.event_sender.send_or_log(Event::OrderPaid(order_id)).await;
            info!(%order_id, "order marked paid");
        } else {
            self.event_sender
                .send_or_log(Event::OrderPaymentFailed {
                    order_id,
                    status: notification.transaction_status.clone(),
                })
                .await;
        }

        Ok(NotificationOutcome::Processed {
            order_id,
            payment_status,
        })
    }

    /// `sha512(order_id + status_code + gross_amount + server_key)`, hex
    /// encoded, compared in constant time.
    fn signature_valid(&self, notification: &GatewayNotification) -> bool {
        let expected = compute_signature(
            &notification.order_id,
            &notification.status_code,
            &notification.gross_amount,
            &self.server_key,
        );
        constant_time_eq(expected.as_bytes(), notification.signature_key.as_bytes())
    }
}

pub fn compute_signature(
    order_id: &str,
    status_code: &str,
    gross_amount: &str,
    server_key: &str,
) -> String {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(server_key.as_bytes());
    hex::encode(hasher.finalize())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_statuses_parse() {
        assert_eq!(
            GatewayStatus::from_str("settlement").unwrap(),
            GatewayStatus::Settlement
        );
        assert_eq!(
            GatewayStatus::from_str("capture").unwrap(),
            GatewayStatus::Capture
        );
    }

    #[test]
    fn unknown_status_is_an_error() {
        let err = GatewayStatus::from_str("hold").unwrap_err();
        assert!(matches!(err, ServiceError::UnknownGatewayStatus(s) if s == "hold"));
    }

    #[test]
    fn signature_covers_all_four_fields() {
        let sig = compute_signature("order-1", "200", "210900.00", "server-key");
        assert_eq!(sig.len(), 128);
        assert_ne!(
            sig,
            compute_signature("order-1", "200", "210901.00", "server-key")
        );
        assert_ne!(
            sig,
            compute_signature("order-1", "201", "210900.00", "server-key")
        );
    }

    #[test]
    fn constant_time_eq_basics() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}
