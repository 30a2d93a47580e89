use crate::{errors::ServiceError, services::payments::NotificationOutcome, AppState};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json, Router, routing::post};
use serde_json::{json, Value};
use tracing::info;

pub fn payment_webhook_routes() -> Router<AppState> {
    Router::new().route("/notification", post(payment_notification))
}

/// Receives asynchronous gateway notifications.
///
/// Returns 200 for both processed and already-processed notifications so the
/// gateway stops retrying; 400/403/404/422 signal malformed payloads, bad
/// signatures, unknown orders and unknown statuses respectively.
async fn payment_notification(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ServiceError> {
    let outcome = state.services.payments.handle_notification(payload).await?;

    let body = match outcome {
        NotificationOutcome::Processed {
            order_id,
            payment_status,
        } => {
            json!({
                "order_id": order_id,
                "payment_status": payment_status,
            })
        }
        NotificationOutcome::AlreadyProcessed { order_id } => {
            info!(%order_id, "duplicate notification acknowledged");
            json!({
                "order_id": order_id,
                "message": "already processed",
            })
        }
    };

    Ok((StatusCode::OK, Json(body)))
}
