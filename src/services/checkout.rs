use crate::{
    clients::midtrans::{CustomerDetails, MidtransClient, SnapRequest, TransactionDetails},
    entities::{order, order_customer, order_item, product, user},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        carts::{CartService, CartView},
        document_number, next_document_sequence,
        housekeeping::HousekeepingService,
        shipping::ShippingService,
    },
};
use chrono::{Duration, Utc};
use rust_decimal::prelude::ToPrimitive;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Builds the immutable order snapshot at checkout.
///
/// The gateway transaction is created before anything is persisted, so a
/// rejected payment leaves no order row. Order, items and the customer
/// snapshot commit in one transaction; housekeeping runs after the commit
/// and never fails the checkout.
#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    gateway: Arc<MidtransClient>,
    shipping: ShippingService,
    carts: CartService,
    housekeeping: HousekeepingService,
    payment_due_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutInput {
    pub destination_city_id: String,
    pub destination_province_id: String,
    pub address: String,
    pub phone: String,
    pub post_code: String,
    /// Shipping option id, or a legacy service label
    pub shipping_selection: String,
}

impl CheckoutService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        gateway: Arc<MidtransClient>,
        shipping: ShippingService,
        carts: CartService,
        housekeeping: HousekeepingService,
        payment_due_days: i64,
    ) -> Self {
        Self {
            db,
            event_sender,
            gateway,
            shipping,
            carts,
            housekeeping,
            payment_due_days,
        }
    }

    /// Creates an order from the session's cart.
    ///
    /// On success the caller clears the cart; the returned order carries the
    /// gateway payment token.
    #[instrument(skip(self, customer, input), fields(user_id = %customer.id))]
    pub async fn create_order(
        &self,
        customer: &user::Model,
        session_id: &str,
        input: CheckoutInput,
    ) -> Result<order::Model, ServiceError> {
        if input.destination_city_id.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "destination city must not be empty".to_string(),
            ));
        }

        let view = self.carts.get_cart(session_id).await?;
        if view.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "cart is empty".to_string(),
            ));
        }

        // Resolve the shipping selection against a freshly quoted list so a
        // stale fee cannot be replayed.
        let options = self
            .shipping
            .options(&input.destination_city_id, view.total_weight)
            .await?;
        let selected = ShippingService::select(&options, &input.shipping_selection)?;

        let shipping_cost = selected.fee;
        let shipping_courier = selected
            .id
            .split('-')
            .next()
            .unwrap_or_default()
            .to_string();

        let cart = &view.cart;
        let grand_total =
            cart.base_total + cart.tax_amount - cart.discount_amount + shipping_cost;

        let order_id = Uuid::new_v4();
        let gross_amount = grand_total.trunc().to_i64().ok_or_else(|| {
            ServiceError::InternalError("grand total out of range".to_string())
        })?;

        // Gateway first: a declined transaction must leave no order row.
        let snap = self
            .gateway
            .create_transaction(&SnapRequest {
                transaction_details: TransactionDetails {
                    order_id: order_id.to_string(),
                    gross_amount,
                },
                customer_details: CustomerDetails {
                    first_name: customer.first_name.clone(),
                    last_name: customer.last_name.clone(),
                    email: customer.email.clone(),
                },
            })
            .await?;

        let product_ids: Vec<Uuid> = view.items.iter().map(|i| i.product_id).collect();

        let txn = self.db.begin().await?;

        let sequence = next_document_sequence(&txn, "ORDER").await?;
        let now = Utc::now();

        let new_order = order::ActiveModel {
            id: Set(order_id),
            order_number: Set(document_number(sequence, "ORDER", now)),
            user_id: Set(customer.id),
            payment_status: Set(order::PaymentStatus::Unpaid),
            fulfillment_status: Set(order::FulfillmentStatus::Pending),
            order_date: Set(now),
            payment_due: Set(now + Duration::days(self.payment_due_days)),
            base_total: Set(cart.base_total),
            tax_amount: Set(cart.tax_amount),
            tax_percent: Set(cart.tax_percent),
            discount_amount: Set(cart.discount_amount),
            discount_percent: Set(cart.discount_percent),
            shipping_cost: Set(shipping_cost),
            shipping_courier: Set(shipping_courier),
            shipping_service: Set(selected.service.clone()),
            grand_total: Set(grand_total),
            payment_token: Set(Some(snap.token.clone())),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = new_order.insert(&txn).await?;

        let products = product::Entity::find()
            .filter(product::Column::Id.is_in(product_ids))
            .all(&txn)
            .await?;

        for item in &view.items {
            let weight = products
                .iter()
                .find(|p| p.id == item.product_id)
                .map(|p| p.weight)
                .unwrap_or_default();

            let order_item = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(item.product_id),
                sku: Set(item.sku.clone()),
                name: Set(item.name.clone()),
                weight: Set(weight),
                quantity: Set(item.quantity),
                base_price: Set(item.base_price),
                base_total: Set(item.base_total),
                tax_percent: Set(item.tax_percent),
                tax_amount: Set(item.tax_amount),
                discount_percent: Set(item.discount_percent),
                discount_amount: Set(item.discount_amount),
                sub_total: Set(item.sub_total),
                design_path: Set(item.design_path.clone()),
                custom_type: Set(item.custom_type.clone()),
                custom_size: Set(item.custom_size.clone()),
                created_at: Set(now),
            };
            order_item.insert(&txn).await?;
        }

        let customer_snapshot = order_customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            user_id: Set(customer.id),
            first_name: Set(customer.first_name.clone()),
            last_name: Set(customer.last_name.clone()),
            email: Set(customer.email.clone()),
            phone: Set(input.phone.clone()),
            city_id: Set(input.destination_city_id.clone()),
            province_id: Set(input.destination_province_id.clone()),
            address: Set(input.address.clone()),
            post_code: Set(input.post_code.clone()),
            created_at: Set(now),
        };
        customer_snapshot.insert(&txn).await?;

        txn.commit().await?;

        self.run_housekeeping(order_id, &view).await;

        self.event_sender.send_or_log(Event::OrderCreated(order_id)).await;
        info!(%order_id, order_number = %created.order_number, "order created");

        Ok(created)
    }

    // Post-commit: relocate staged design files, then sweep orphaned
    // temporary products. Failures are logged, never propagated.
    async fn run_housekeeping(&self, order_id: Uuid, view: &CartView) {
        let design_paths: Vec<String> = view
            .items
            .iter()
            .filter_map(|i| i.design_path.clone())
            .collect();

        if let Err(e) = self
            .housekeeping
            .relocate_design_files(order_id, &design_paths)
            .await
        {
            warn!(%order_id, "design relocation failed: {}", e);
        }

        if let Err(e) = self.housekeeping.sweep_temporary_products().await {
            warn!(%order_id, "temporary product sweep failed: {}", e);
        }
    }
}
