use crate::handlers::common::{success_response, PaginationMeta, PaginationParams};
use crate::{
    entities::{product, product_image},
    errors::ServiceError,
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Serialize;

pub fn products_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/:slug", get(get_product))
}

#[derive(Serialize)]
struct ProductListResponse {
    products: Vec<product::Model>,
    meta: PaginationMeta,
}

#[derive(Serialize)]
struct ProductDetailResponse {
    #[serde(flatten)]
    product: product::Model,
    images: Vec<product_image::Model>,
}

async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = state
        .services
        .catalog
        .list_products(params.page, params.per_page)
        .await?;

    Ok(success_response(ProductListResponse {
        meta: PaginationMeta::new(page.page, page.per_page, page.total),
        products: page.products,
    }))
}

async fn get_product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.catalog.find_by_slug(&slug).await?;
    let images = state.services.catalog.images(product.id).await?;

    Ok(success_response(ProductDetailResponse { product, images }))
}
