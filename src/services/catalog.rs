use crate::{
    entities::{product, product_image},
    errors::ServiceError,
};
use base64::Engine;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;

/// Slug prefix marking ad-hoc custom products.
pub const CUSTOM_SLUG_PREFIX: &str = "custom-";

const CUSTOM_STOCK: i32 = 9999;

#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
    upload_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomProductInput {
    /// Product type label, e.g. "t-shirt"
    pub custom_type: String,
    pub custom_size: String,
    pub base_price: Decimal,
    pub custom_fee: Decimal,
    /// Optional `data:` URL carrying the design image
    #[serde(default)]
    pub design: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CustomProduct {
    pub product: product::Model,
    pub design_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProductPage {
    pub products: Vec<product::Model>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>, upload_dir: String) -> Self {
        Self { db, upload_dir }
    }

    /// Lists catalog products, newest first. Temporary custom products are
    /// excluded.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<ProductPage, ServiceError> {
        let per_page = per_page.clamp(1, 100);
        let page = page.max(1);

        let paginator = product::Entity::find()
            .filter(product::Column::IsTemporary.eq(false))
            .order_by_desc(product::Column::CreatedAt)
            .paginate(&*self.db, per_page);

        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page - 1).await?;

        Ok(ProductPage {
            products,
            total,
            page,
            per_page,
        })
    }

    #[instrument(skip(self))]
    pub async fn find_by_slug(&self, slug: &str) -> Result<product::Model, ServiceError> {
        product::Entity::find()
            .filter(product::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", slug)))
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: Uuid) -> Result<product::Model, ServiceError> {
        product::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn images(&self, product_id: Uuid) -> Result<Vec<product_image::Model>, ServiceError> {
        Ok(product_image::Entity::find()
            .filter(product_image::Column::ProductId.eq(product_id))
            .all(&*self.db)
            .await?)
    }

    /// Creates a temporary product backing a custom cart line.
    ///
    /// The product carries `base_price + custom_fee` as its price, effectively
    /// unlimited stock and zero weight. A `data:` URL design image is decoded
    /// into the staging upload directory and recorded as a product image; a
    /// broken design payload is logged and skipped, never a hard failure.
    #[instrument(skip(self, input), fields(custom_type = %input.custom_type))]
    pub async fn create_custom_product(
        &self,
        input: CustomProductInput,
    ) -> Result<CustomProduct, ServiceError> {
        if input.base_price.is_sign_negative() || input.custom_fee.is_sign_negative() {
            return Err(ServiceError::ValidationError(
                "price must not be negative".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let product_id = Uuid::new_v4();
        let now = Utc::now();

        let model = product::ActiveModel {
            id: Set(product_id),
            sku: Set(format!("CUSTOM-{}", &product_id.simple().to_string()[..8])),
            name: Set(format!("Custom - {}", input.custom_type)),
            slug: Set(format!("{}{}", CUSTOM_SLUG_PREFIX, Uuid::new_v4())),
            price: Set(input.base_price + input.custom_fee),
            stock: Set(CUSTOM_STOCK),
            weight: Set(Decimal::ZERO),
            short_description: Set(None),
            description: Set(None),
            is_temporary: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = model.insert(&txn).await?;

        let design_path = match input.design.as_deref() {
            Some(design) if design.starts_with("data:") => {
                match self.write_design_image(product_id, design).await {
                    Ok(path) => {
                        let image = product_image::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            product_id: Set(product_id),
                            path: Set(path.clone()),
                            created_at: Set(now),
                        };
                        image.insert(&txn).await?;
                        Some(path)
                    }
                    Err(e) => {
                        warn!(%product_id, "failed to store design image: {}", e);
                        None
                    }
                }
            }
            _ => None,
        };

        txn.commit().await?;

        Ok(CustomProduct {
            product: created,
            design_path,
        })
    }

    async fn write_design_image(
        &self,
        product_id: Uuid,
        data_url: &str,
    ) -> Result<String, ServiceError> {
        let encoded = data_url
            .split_once(',')
            .map(|(_, raw)| raw)
            .ok_or_else(|| ServiceError::ValidationError("malformed data url".to_string()))?;

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| ServiceError::ValidationError(format!("invalid design image: {}", e)))?;

        let dir = Path::new(&self.upload_dir).join("custom");
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| ServiceError::InternalError(format!("failed to create {:?}: {}", dir, e)))?;

        let filename = format!("{}.png", product_id);
        let path = dir.join(&filename);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| ServiceError::InternalError(format!("failed to write design: {}", e)))?;

        Ok(format!("custom/{}", filename))
    }
}
