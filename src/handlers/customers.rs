use crate::handlers::common::{created_response, success_response};
use crate::{entities::user, errors::ServiceError, AppState};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use uuid::Uuid;

pub fn customers_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_customer))
        .route("/:id", get(get_customer))
        .route("/:id", put(update_customer))
}

#[derive(Debug, Deserialize)]
struct CustomerRequest {
    first_name: String,
    last_name: String,
    email: String,
}

async fn create_customer(
    State(state): State<AppState>,
    Json(payload): Json<CustomerRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    if payload.email.trim().is_empty() || !payload.email.contains('@') {
        return Err(ServiceError::ValidationError(
            "a valid email is required".to_string(),
        ));
    }

    let taken = user::Entity::find()
        .filter(user::Column::Email.eq(payload.email.clone()))
        .one(&*state.db)
        .await?;
    if taken.is_some() {
        return Err(ServiceError::Conflict(format!(
            "email {} is already registered",
            payload.email
        )));
    }

    let now = Utc::now();
    let created = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        first_name: Set(payload.first_name),
        last_name: Set(payload.last_name),
        email: Set(payload.email),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&*state.db)
    .await?;

    Ok(created_response(created))
}

async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let customer = user::Entity::find_by_id(id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", id)))?;

    Ok(success_response(customer))
}

async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CustomerRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let existing = user::Entity::find_by_id(id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", id)))?;

    let mut model: user::ActiveModel = existing.into();
    model.first_name = Set(payload.first_name);
    model.last_name = Set(payload.last_name);
    model.email = Set(payload.email);
    model.updated_at = Set(Utc::now());

    let updated = model.update(&*state.db).await?;
    Ok(success_response(updated))
}
