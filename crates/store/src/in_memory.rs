use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use crossdock_core::OrgId;
use crossdock_ledger::{StockKey, StockRow, StockStore, StoreError};
use crossdock_locations::LocationId;
use crossdock_products::ProductId;
use crossdock_transfers::{Transfer, TransferId, TransferStore};

/// In-memory stock rows.
///
/// Mirrors the persistent layout: a flat bag of rows where several rows may
/// share one logical (location, product) key. Intended for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryStockStore {
    rows: RwLock<Vec<StockRow>>,
}

impl InMemoryStockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total physical row count, duplicates included.
    pub fn row_count(&self) -> usize {
        self.rows.read().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl StockStore for InMemoryStockStore {
    async fn insert(&self, row: StockRow) -> Result<(), StoreError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        rows.push(row);
        Ok(())
    }

    async fn rows_for_key(&self, org_id: OrgId, key: StockKey) -> Result<Vec<StockRow>, StoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        Ok(rows
            .iter()
            .filter(|r| r.org_id == org_id && r.key() == key)
            .cloned()
            .collect())
    }

    async fn rows_for_location(
        &self,
        org_id: OrgId,
        location_id: LocationId,
    ) -> Result<Vec<StockRow>, StoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        Ok(rows
            .iter()
            .filter(|r| r.org_id == org_id && r.location_id == location_id)
            .cloned()
            .collect())
    }

    async fn rows_for_product(
        &self,
        org_id: OrgId,
        product_id: ProductId,
    ) -> Result<Vec<StockRow>, StoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        Ok(rows
            .iter()
            .filter(|r| r.org_id == org_id && r.product_id == product_id)
            .cloned()
            .collect())
    }

    async fn delete_rows(&self, org_id: OrgId, row_ids: &[Uuid]) -> Result<usize, StoreError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        let before = rows.len();
        rows.retain(|r| !(r.org_id == org_id && row_ids.contains(&r.row_id)));
        Ok(before - rows.len())
    }
}

/// In-memory transfer storage, keyed by transfer id.
#[derive(Debug, Default)]
pub struct InMemoryTransferStore {
    inner: RwLock<HashMap<TransferId, Transfer>>,
}

impl InMemoryTransferStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransferStore for InMemoryTransferStore {
    async fn insert(&self, transfer: Transfer) -> Result<(), StoreError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        inner.insert(transfer.id, transfer);
        Ok(())
    }

    async fn update(&self, transfer: Transfer) -> Result<(), StoreError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        match inner.get_mut(&transfer.id) {
            Some(slot) => {
                *slot = transfer;
                Ok(())
            }
            None => Err(StoreError::backend("update of unknown transfer")),
        }
    }

    async fn get(&self, org_id: OrgId, id: TransferId) -> Result<Option<Transfer>, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        Ok(inner.get(&id).filter(|t| t.org_id == org_id).cloned())
    }

    async fn list(
        &self,
        org_id: OrgId,
        location: Option<LocationId>,
    ) -> Result<Vec<Transfer>, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        let mut out: Vec<_> = inner
            .values()
            .filter(|t| t.org_id == org_id)
            .filter(|t| location.is_none_or(|l| t.source == l || t.destination == l))
            .cloned()
            .collect();
        // Deterministic listing order: creation time, then id.
        out.sort_by_key(|t| (t.created_at, *t.id.0.as_uuid()));
        Ok(out)
    }
}
