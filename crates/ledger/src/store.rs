use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crossdock_core::OrgId;
use crossdock_locations::LocationId;
use crossdock_products::ProductId;

use crate::record::{StockKey, StockRow};

/// Storage failure at the stock persistence seam.
///
/// These are **infrastructure errors**; domain failures (validation,
/// transitions) never originate here.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Org-scoped stock row storage.
///
/// The schema is outside this core's control: the store is allowed to hold
/// multiple physical rows per logical key, and makes no uniqueness promises.
/// Callers (the [`crate::StockLedger`]) own reconciliation.
#[async_trait]
pub trait StockStore: Send + Sync {
    /// Append one physical row. Never merges with existing rows.
    async fn insert(&self, row: StockRow) -> Result<(), StoreError>;

    /// All physical rows for one logical key (possibly several).
    async fn rows_for_key(&self, org_id: OrgId, key: StockKey) -> Result<Vec<StockRow>, StoreError>;

    /// All physical rows for a location, across products.
    async fn rows_for_location(
        &self,
        org_id: OrgId,
        location_id: LocationId,
    ) -> Result<Vec<StockRow>, StoreError>;

    /// All physical rows for a product, across locations.
    async fn rows_for_product(
        &self,
        org_id: OrgId,
        product_id: ProductId,
    ) -> Result<Vec<StockRow>, StoreError>;

    /// Delete rows by physical id; returns how many existed and were removed.
    async fn delete_rows(&self, org_id: OrgId, row_ids: &[Uuid]) -> Result<usize, StoreError>;
}

#[async_trait]
impl<S> StockStore for Arc<S>
where
    S: StockStore + ?Sized,
{
    async fn insert(&self, row: StockRow) -> Result<(), StoreError> {
        (**self).insert(row).await
    }

    async fn rows_for_key(&self, org_id: OrgId, key: StockKey) -> Result<Vec<StockRow>, StoreError> {
        (**self).rows_for_key(org_id, key).await
    }

    async fn rows_for_location(
        &self,
        org_id: OrgId,
        location_id: LocationId,
    ) -> Result<Vec<StockRow>, StoreError> {
        (**self).rows_for_location(org_id, location_id).await
    }

    async fn rows_for_product(
        &self,
        org_id: OrgId,
        product_id: ProductId,
    ) -> Result<Vec<StockRow>, StoreError> {
        (**self).rows_for_product(org_id, product_id).await
    }

    async fn delete_rows(&self, org_id: OrgId, row_ids: &[Uuid]) -> Result<usize, StoreError> {
        (**self).delete_rows(org_id, row_ids).await
    }
}
