use crate::handlers::common::{session_id, success_response};
use crate::{
    errors::ServiceError,
    services::shipping::{ShippingOption, ShippingService},
    AppState,
};
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

pub fn shipping_routes() -> Router<AppState> {
    Router::new()
        .route("/provinces", get(list_provinces))
        .route("/cities/:province_id", get(list_cities))
        .route("/options", post(quote_options))
        .route("/select", post(select_option))
}

#[derive(Debug, Deserialize)]
struct QuoteRequest {
    destination_city_id: String,
}

#[derive(Debug, Deserialize)]
struct SelectRequest {
    destination_city_id: String,
    /// Option id, or a legacy service label
    selection: String,
}

async fn list_provinces(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let provinces = state.services.shipping.provinces().await?;
    Ok(success_response(provinces))
}

async fn list_cities(
    State(state): State<AppState>,
    Path(province_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let cities = state.services.shipping.cities(&province_id).await?;
    Ok(success_response(cities))
}

/// Quotes shipping options for the session's cart weight.
async fn quote_options(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<QuoteRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let sid = session_id(&headers)?;
    let view = state.services.carts.get_cart(&sid).await?;

    let options: Vec<ShippingOption> = state
        .services
        .shipping
        .options(&payload.destination_city_id, view.total_weight)
        .await?;

    Ok(success_response(options))
}

/// Applies a selected option's fee to the cart so the grand total reflects it
/// before checkout.
async fn select_option(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<SelectRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let sid = session_id(&headers)?;
    let view = state.services.carts.get_cart(&sid).await?;

    let options = state
        .services
        .shipping
        .options(&payload.destination_city_id, view.total_weight)
        .await?;
    let selected = ShippingService::select(&options, &payload.selection)?.clone();

    let cart = state
        .services
        .carts
        .apply_shipping_fee(&sid, selected.fee)
        .await?;

    Ok(success_response(serde_json::json!({
        "selected": selected,
        "cart": cart,
    })))
}
