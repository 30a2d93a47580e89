use crate::{
    entities::{cart, cart_item, product},
    errors::ServiceError,
    events::{Event, EventSender},
    pricing,
};
use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Session-keyed shopping cart service.
///
/// Line items are snapshots of the product at add time; every mutation
/// recalculates the persisted aggregate totals inside the same transaction.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    default_tax_percent: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddItemInput {
    pub product_id: Uuid,
    pub quantity: i32,
    #[serde(default)]
    pub design_path: Option<String>,
    #[serde(default)]
    pub custom_type: Option<String>,
    #[serde(default)]
    pub custom_size: Option<String>,
}

/// Cart plus its lines and the derived shipment weight.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub cart: cart::Model,
    pub items: Vec<cart_item::Model>,
    /// `Σ quantity × ceil(product.weight)`; not persisted
    pub total_weight: i64,
}

impl CartService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        default_tax_percent: Decimal,
    ) -> Self {
        Self {
            db,
            event_sender,
            default_tax_percent,
        }
    }

    /// Returns the session's cart, creating a zero-total cart if none exists.
    #[instrument(skip(self))]
    pub async fn get_or_create(&self, session_id: &str) -> Result<cart::Model, ServiceError> {
        self.get_or_create_on(&*self.db, session_id).await
    }

    async fn get_or_create_on<C: ConnectionTrait>(
        &self,
        conn: &C,
        session_id: &str,
    ) -> Result<cart::Model, ServiceError> {
        if let Some(existing) = cart::Entity::find()
            .filter(cart::Column::SessionId.eq(session_id))
            .one(conn)
            .await?
        {
            return Ok(existing);
        }

        let now = Utc::now();
        let fresh = cart::ActiveModel {
            id: Set(Uuid::new_v4()),
            session_id: Set(session_id.to_string()),
            base_total: Set(Decimal::ZERO),
            tax_amount: Set(Decimal::ZERO),
            tax_percent: Set(self.default_tax_percent),
            discount_amount: Set(Decimal::ZERO),
            discount_percent: Set(Decimal::ZERO),
            shipping_fee: Set(Decimal::ZERO),
            grand_total: Set(Decimal::ZERO),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(fresh.insert(conn).await?)
    }

    /// Adds a product to the session's cart.
    ///
    /// A line for the same product is merged: quantities are summed and the
    /// price snapshot is refreshed from the current product. Stock is checked
    /// against the incoming quantity.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        session_id: &str,
        input: AddItemInput,
    ) -> Result<cart::Model, ServiceError> {
        if input.quantity < 1 {
            return Err(ServiceError::ValidationError(
                "quantity must be at least 1".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let cart = self.get_or_create_on(&txn, session_id).await?;

        let product = product::Entity::find_by_id(input.product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", input.product_id))
            })?;

        if input.quantity > product.stock {
            return Err(ServiceError::InsufficientStock(format!(
                "requested {} of {}, {} in stock",
                input.quantity, product.name, product.stock
            )));
        }

        let existing = cart_item::Entity::find()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .filter(cart_item::Column::ProductId.eq(input.product_id))
            .one(&txn)
            .await?;

        if let Some(item) = existing {
            let quantity = item.quantity + input.quantity;
            let snapshot = LineSnapshot::from_product(&product, quantity, cart.tax_percent)?;

            let mut item: cart_item::ActiveModel = item.into();
            item.quantity = Set(quantity);
            snapshot.apply(&mut item);
            item.update(&txn).await?;
        } else {
            let quantity = input.quantity;
            let snapshot = LineSnapshot::from_product(&product, quantity, cart.tax_percent)?;
            let now = Utc::now();

            let item = cart_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                cart_id: Set(cart.id),
                product_id: Set(product.id),
                sku: Set(product.sku.clone()),
                name: Set(product.name.clone()),
                quantity: Set(quantity),
                base_price: Set(snapshot.base_price),
                base_total: Set(snapshot.base_total),
                tax_percent: Set(snapshot.tax_percent),
                tax_amount: Set(snapshot.tax_amount),
                discount_percent: Set(Decimal::ZERO),
                discount_amount: Set(Decimal::ZERO),
                sub_total: Set(snapshot.sub_total),
                design_path: Set(input.design_path),
                custom_type: Set(input.custom_type),
                custom_size: Set(input.custom_size),
                created_at: Set(now),
                updated_at: Set(now),
            };

            item.insert(&txn).await?;
        }

        let updated = self.recalculate(&txn, cart.id, None).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemAdded {
                cart_id: cart.id,
                product_id: input.product_id,
            })
            .await;

        info!(
            "Added product {} x{} to cart {}",
            input.product_id, input.quantity, cart.id
        );
        Ok(updated)
    }

    /// Sets a line's quantity, re-snapshotting the price from a fresh product
    /// lookup. Quantities below 1 are rejected; removal has its own endpoint.
    #[instrument(skip(self))]
    pub async fn update_item_quantity(
        &self,
        session_id: &str,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<cart::Model, ServiceError> {
        if quantity < 1 {
            return Err(ServiceError::ValidationError(
                "quantity must be at least 1".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let cart = self.find_cart(&txn, session_id).await?;

        let item = cart_item::Entity::find_by_id(item_id)
            .filter(cart_item::Column::CartId.eq(cart.id))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart item {} not found", item_id)))?;

        let product = product::Entity::find_by_id(item.product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", item.product_id))
            })?;

        if quantity > product.stock {
            return Err(ServiceError::InsufficientStock(format!(
                "requested {} of {}, {} in stock",
                quantity, product.name, product.stock
            )));
        }

        let snapshot = LineSnapshot::from_product(&product, quantity, cart.tax_percent)?;
        let mut item: cart_item::ActiveModel = item.into();
        item.quantity = Set(quantity);
        snapshot.apply(&mut item);
        item.update(&txn).await?;

        let updated = self.recalculate(&txn, cart.id, None).await?;
        txn.commit().await?;

        Ok(updated)
    }

    /// Removes a line from the cart. Removing an absent item, or removing
    /// from a session that has no cart yet, is a no-op success.
    #[instrument(skip(self))]
    pub async fn remove_item(
        &self,
        session_id: &str,
        item_id: Uuid,
    ) -> Result<cart::Model, ServiceError> {
        let txn = self.db.begin().await?;

        let cart = self.get_or_create_on(&txn, session_id).await?;

        cart_item::Entity::delete_many()
            .filter(cart_item::Column::Id.eq(item_id))
            .filter(cart_item::Column::CartId.eq(cart.id))
            .exec(&txn)
            .await?;

        let updated = self.recalculate(&txn, cart.id, None).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemRemoved {
                cart_id: cart.id,
                item_id,
            })
            .await;

        Ok(updated)
    }

    /// Stores the selected shipping fee and refreshes the grand total.
    #[instrument(skip(self))]
    pub async fn apply_shipping_fee(
        &self,
        session_id: &str,
        fee: Decimal,
    ) -> Result<cart::Model, ServiceError> {
        if fee.is_sign_negative() {
            return Err(ServiceError::ValidationError(
                "shipping fee must not be negative".to_string(),
            ));
        }

        let txn = self.db.begin().await?;
        let cart = self.find_cart(&txn, session_id).await?;
        let updated = self.recalculate(&txn, cart.id, Some(fee)).await?;
        txn.commit().await?;

        Ok(updated)
    }

    /// Deletes the cart and its items. Clearing an absent cart is a no-op.
    #[instrument(skip(self))]
    pub async fn clear(&self, session_id: &str) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let Some(cart) = cart::Entity::find()
            .filter(cart::Column::SessionId.eq(session_id))
            .one(&txn)
            .await?
        else {
            return Ok(());
        };

        cart_item::Entity::delete_many()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .exec(&txn)
            .await?;
        cart::Entity::delete_by_id(cart.id).exec(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartCleared { cart_id: cart.id })
            .await;

        Ok(())
    }

    /// Returns the cart with its items and the derived shipment weight,
    /// creating an empty cart for new sessions.
    #[instrument(skip(self))]
    pub async fn get_cart(&self, session_id: &str) -> Result<CartView, ServiceError> {
        let cart = self.get_or_create(session_id).await?;

        let items = cart_item::Entity::find()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .all(&*self.db)
            .await?;

        let total_weight = self.total_weight(&items).await?;

        Ok(CartView {
            cart,
            items,
            total_weight,
        })
    }

    /// Shipment weight for a set of lines: `Σ quantity × ceil(weight)`.
    async fn total_weight(&self, items: &[cart_item::Model]) -> Result<i64, ServiceError> {
        if items.is_empty() {
            return Ok(0);
        }

        let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
        let products = product::Entity::find()
            .filter(product::Column::Id.is_in(product_ids))
            .all(&*self.db)
            .await?;

        let mut total = 0i64;
        for item in items {
            let weight = products
                .iter()
                .find(|p| p.id == item.product_id)
                .map(|p| p.weight.ceil().to_i64().unwrap_or(0))
                .unwrap_or(0);
            total += i64::from(item.quantity) * weight;
        }

        Ok(total)
    }

    /// Recalculates and persists the cart's aggregate totals from its lines.
    /// Runs inside the caller's transaction.
    ///
    /// `grand_total = Σ sub_total + shipping_fee`.
    pub async fn recalculate(
        &self,
        txn: &DatabaseTransaction,
        cart_id: Uuid,
        shipping_fee: Option<Decimal>,
    ) -> Result<cart::Model, ServiceError> {
        let cart = cart::Entity::find_by_id(cart_id)
            .one(txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart {} not found", cart_id)))?;

        let items = cart_item::Entity::find()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .all(txn)
            .await?;

        let mut base_total = Decimal::ZERO;
        let mut tax_amount = Decimal::ZERO;
        let mut discount_amount = Decimal::ZERO;
        let mut sub_total = Decimal::ZERO;

        for item in &items {
            let qty = Decimal::from(item.quantity);
            base_total += item.base_total;
            tax_amount += item.tax_amount * qty;
            discount_amount += item.discount_amount * qty;
            sub_total += item.sub_total;
        }

        let shipping_fee = shipping_fee.unwrap_or(cart.shipping_fee);
        let grand_total = sub_total + shipping_fee;

        let mut cart: cart::ActiveModel = cart.into();
        cart.base_total = Set(base_total);
        cart.tax_amount = Set(tax_amount);
        cart.discount_amount = Set(discount_amount);
        cart.shipping_fee = Set(shipping_fee);
        cart.grand_total = Set(grand_total);
        cart.updated_at = Set(Utc::now());

        Ok(cart.update(txn).await?)
    }

    async fn find_cart(
        &self,
        txn: &DatabaseTransaction,
        session_id: &str,
    ) -> Result<cart::Model, ServiceError> {
        cart::Entity::find()
            .filter(cart::Column::SessionId.eq(session_id))
            .one(txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Cart for session {} not found", session_id))
            })
    }
}

/// Price snapshot derived from the current product row.
struct LineSnapshot {
    base_price: Decimal,
    base_total: Decimal,
    tax_percent: Decimal,
    tax_amount: Decimal,
    sub_total: Decimal,
}

impl LineSnapshot {
    fn from_product(
        product: &product::Model,
        quantity: i32,
        tax_percent: Decimal,
    ) -> Result<Self, ServiceError> {
        let tax_amount = pricing::tax_amount(product.price, tax_percent)?;
        let base_total = pricing::line_base_total(product.price, quantity)?;
        let sub_total = pricing::line_subtotal(quantity, product.price, tax_amount, Decimal::ZERO)?;

        Ok(Self {
            base_price: product.price,
            base_total,
            tax_percent,
            tax_amount,
            sub_total,
        })
    }

    fn apply(&self, item: &mut cart_item::ActiveModel) {
        item.base_price = Set(self.base_price);
        item.base_total = Set(self.base_total);
        item.tax_percent = Set(self.tax_percent);
        item.tax_amount = Set(self.tax_amount);
        item.sub_total = Set(self.sub_total);
        item.updated_at = Set(Utc::now());
    }
}
