use crate::{
    entities::{cart_item, product, product_image},
    errors::ServiceError,
    services::catalog::CUSTOM_SLUG_PREFIX,
};
use chrono::{Duration, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, TransactionTrait,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Post-checkout and periodic cleanup.
///
/// Everything here is idempotent and advisory: a failed sweep or file move is
/// logged and retried on the next pass, never surfaced to the request that
/// triggered it.
#[derive(Clone)]
pub struct HousekeepingService {
    db: Arc<DatabaseConnection>,
    upload_dir: String,
    design_dir: String,
    min_age_hours: i64,
}

impl HousekeepingService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        upload_dir: String,
        design_dir: String,
        min_age_hours: i64,
    ) -> Self {
        Self {
            db,
            upload_dir,
            design_dir,
            min_age_hours,
        }
    }

    /// Moves staged design uploads into the order's design directory.
    /// Already-moved or missing sources are skipped.
    #[instrument(skip(self, design_paths))]
    pub async fn relocate_design_files(
        &self,
        order_id: Uuid,
        design_paths: &[String],
    ) -> Result<(), ServiceError> {
        if design_paths.is_empty() {
            return Ok(());
        }

        let target_dir = Path::new(&self.design_dir).join(order_id.to_string());
        tokio::fs::create_dir_all(&target_dir).await.map_err(|e| {
            ServiceError::InternalError(format!("failed to create {:?}: {}", target_dir, e))
        })?;

        for rel in design_paths {
            let source = Path::new(&self.upload_dir).join(rel);
            if !source.exists() {
                continue;
            }

            let file_name = match source.file_name() {
                Some(name) => name.to_owned(),
                None => continue,
            };
            let target = target_dir.join(file_name);

            if let Err(e) = tokio::fs::rename(&source, &target).await {
                warn!(?source, ?target, "failed to relocate design file: {}", e);
            }
        }

        Ok(())
    }

    /// Deletes temporary custom products no cart references anymore, along
    /// with their image rows. Order lines hold full snapshots, so removing
    /// the product never touches placed orders.
    #[instrument(skip(self))]
    pub async fn sweep_temporary_products(&self) -> Result<u64, ServiceError> {
        let cutoff = Utc::now() - Duration::hours(self.min_age_hours);

        let candidates = product::Entity::find()
            .filter(product::Column::IsTemporary.eq(true))
            .filter(product::Column::Slug.starts_with(CUSTOM_SLUG_PREFIX))
            .filter(product::Column::CreatedAt.lt(cutoff))
            .all(&*self.db)
            .await?;

        let mut swept = 0u64;
        for candidate in candidates {
            let in_use = cart_item::Entity::find()
                .filter(cart_item::Column::ProductId.eq(candidate.id))
                .count(&*self.db)
                .await?;
            if in_use > 0 {
                continue;
            }

            let txn = self.db.begin().await?;
            product_image::Entity::delete_many()
                .filter(product_image::Column::ProductId.eq(candidate.id))
                .exec(&txn)
                .await?;
            product::Entity::delete_by_id(candidate.id).exec(&txn).await?;
            txn.commit().await?;

            swept += 1;
        }

        if swept > 0 {
            info!(swept, "swept orphaned temporary products");
        }

        Ok(swept)
    }

    /// Periodic sweep loop, spawned at startup.
    pub async fn run_sweep_loop(self, interval_secs: u64) {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            if let Err(e) = self.sweep_temporary_products().await {
                warn!("temporary product sweep failed: {}", e);
            }
        }
    }
}
