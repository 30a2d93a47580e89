use crate::handlers::common::{created_response, session_id};
use crate::{
    entities::user, errors::ServiceError, services::checkout::CheckoutInput, AppState,
};
use axum::{
    extract::State, http::HeaderMap, response::IntoResponse, routing::post, Json, Router,
};
use sea_orm::EntityTrait;
use serde::Deserialize;
use uuid::Uuid;

pub fn checkout_routes() -> Router<AppState> {
    Router::new().route("/", post(checkout))
}

#[derive(Debug, Deserialize)]
struct CheckoutRequest {
    user_id: Uuid,
    destination_city_id: String,
    destination_province_id: String,
    address: String,
    phone: String,
    post_code: String,
    /// Shipping option id, or a legacy service label
    shipping_selection: String,
}

/// Places an order from the session's cart. The cart is cleared only after
/// the order is committed.
async fn checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let sid = session_id(&headers)?;

    let customer = user::Entity::find_by_id(payload.user_id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", payload.user_id)))?;

    let order = state
        .services
        .checkout
        .create_order(
            &customer,
            &sid,
            CheckoutInput {
                destination_city_id: payload.destination_city_id,
                destination_province_id: payload.destination_province_id,
                address: payload.address,
                phone: payload.phone,
                post_code: payload.post_code,
                shipping_selection: payload.shipping_selection,
            },
        )
        .await?;

    state.services.carts.clear(&sid).await?;

    Ok(created_response(order))
}
