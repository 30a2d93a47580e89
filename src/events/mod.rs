use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

/// Events emitted by the storefront services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    CartItemAdded { cart_id: Uuid, product_id: Uuid },
    CartItemRemoved { cart_id: Uuid, item_id: Uuid },
    CartCleared { cart_id: Uuid },
    OrderCreated(Uuid),
    OrderPaid(Uuid),
    OrderPaymentFailed { order_id: Uuid, status: String },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of propagating a closed-receiver
    /// failure. Event delivery never fails the emitting operation.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            tracing::warn!("event dropped: {}", e);
        }
    }
}

/// Processes incoming events until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrderCreated(order_id) => {
                info!(%order_id, "order created");
            }
            Event::OrderPaid(order_id) => {
                info!(%order_id, "order paid");
            }
            Event::OrderPaymentFailed { order_id, status } => {
                info!(%order_id, %status, "order payment did not complete");
            }
            other => {
                debug!(event = ?other, "event received");
            }
        }
    }

    info!("Event processing loop stopped");
}
