use crate::handlers::common::success_response;
use crate::{
    entities::{order, order_customer, order_item},
    errors::ServiceError,
    AppState,
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use uuid::Uuid;

pub fn orders_routes() -> Router<AppState> {
    Router::new()
        .route("/:id", get(get_order))
        .route("/by-user/:user_id", get(list_orders_for_user))
}

#[derive(Serialize)]
struct OrderDetailResponse {
    #[serde(flatten)]
    order: order::Model,
    items: Vec<order_item::Model>,
    customer: Option<order_customer::Model>,
}

async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = order::Entity::find_by_id(id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;

    let items = order_item::Entity::find()
        .filter(order_item::Column::OrderId.eq(id))
        .all(&*state.db)
        .await?;

    let customer = order_customer::Entity::find()
        .filter(order_customer::Column::OrderId.eq(id))
        .one(&*state.db)
        .await?;

    Ok(success_response(OrderDetailResponse {
        order,
        items,
        customer,
    }))
}

async fn list_orders_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let orders = order::Entity::find()
        .filter(order::Column::UserId.eq(user_id))
        .order_by_desc(order::Column::OrderDate)
        .all(&*state.db)
        .await?;

    Ok(success_response(orders))
}
