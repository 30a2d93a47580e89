use crate::handlers::common::{no_content_response, session_id, success_response};
use crate::{
    errors::ServiceError,
    services::{carts::AddItemInput, catalog::CustomProductInput},
    session::SessionData,
    AppState,
};
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

pub fn carts_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart))
        .route("/", delete(clear_cart))
        .route("/items", post(add_item))
        .route("/items/custom", post(add_custom_item))
        .route("/items/:item_id", put(update_item_quantity))
        .route("/items/:item_id", delete(remove_item))
}

#[derive(Debug, Deserialize)]
struct AddItemRequest {
    product_id: Uuid,
    quantity: i32,
}

#[derive(Debug, Deserialize)]
struct UpdateQuantityRequest {
    quantity: i32,
}

#[derive(Debug, Deserialize)]
struct AddCustomItemRequest {
    #[serde(rename = "type")]
    custom_type: String,
    size: String,
    quantity: i32,
    base_price: Decimal,
    custom_fee: Decimal,
    #[serde(default)]
    design: Option<String>,
}

async fn get_cart(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ServiceError> {
    let sid = session_id(&headers)?;
    touch_session(&state, &sid).await;

    let view = state.services.carts.get_cart(&sid).await?;
    Ok(success_response(view))
}

async fn add_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<AddItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let sid = session_id(&headers)?;
    touch_session(&state, &sid).await;

    let cart = state
        .services
        .carts
        .add_item(
            &sid,
            AddItemInput {
                product_id: payload.product_id,
                quantity: payload.quantity,
                design_path: None,
                custom_type: None,
                custom_size: None,
            },
        )
        .await?;

    Ok(success_response(cart))
}

/// Creates a temporary custom product from the submitted design and adds it
/// to the cart in one step.
async fn add_custom_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<AddCustomItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let sid = session_id(&headers)?;
    touch_session(&state, &sid).await;

    let custom = state
        .services
        .catalog
        .create_custom_product(CustomProductInput {
            custom_type: payload.custom_type.clone(),
            custom_size: payload.size.clone(),
            base_price: payload.base_price,
            custom_fee: payload.custom_fee,
            design: payload.design,
        })
        .await?;

    let cart = state
        .services
        .carts
        .add_item(
            &sid,
            AddItemInput {
                product_id: custom.product.id,
                quantity: payload.quantity,
                design_path: custom.design_path,
                custom_type: Some(payload.custom_type),
                custom_size: Some(payload.size),
            },
        )
        .await?;

    Ok(success_response(cart))
}

async fn update_item_quantity(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<UpdateQuantityRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let sid = session_id(&headers)?;

    let cart = state
        .services
        .carts
        .update_item_quantity(&sid, item_id, payload.quantity)
        .await?;

    Ok(success_response(cart))
}

async fn remove_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let sid = session_id(&headers)?;

    let cart = state.services.carts.remove_item(&sid, item_id).await?;
    Ok(success_response(cart))
}

async fn clear_cart(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ServiceError> {
    let sid = session_id(&headers)?;

    state.services.carts.clear(&sid).await?;
    Ok(no_content_response())
}

async fn touch_session(state: &AppState, sid: &str) {
    if state.session_store.load(sid).await.is_none() {
        state
            .session_store
            .store(sid, SessionData::anonymous())
            .await;
    }
}
