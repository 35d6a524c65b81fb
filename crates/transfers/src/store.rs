use std::sync::Arc;

use async_trait::async_trait;

use crossdock_core::OrgId;
use crossdock_ledger::StoreError;
use crossdock_locations::LocationId;

use crate::transfer::{Transfer, TransferId};

/// Org-scoped transfer storage.
///
/// Transfers are append-and-update only; there is deliberately no delete —
/// cancellation is a status.
#[async_trait]
pub trait TransferStore: Send + Sync {
    async fn insert(&self, transfer: Transfer) -> Result<(), StoreError>;

    /// Replace the stored transfer with the same id.
    async fn update(&self, transfer: Transfer) -> Result<(), StoreError>;

    async fn get(&self, org_id: OrgId, id: TransferId) -> Result<Option<Transfer>, StoreError>;

    /// All transfers for the org; `location` filters to transfers touching
    /// that location as source or destination.
    async fn list(
        &self,
        org_id: OrgId,
        location: Option<LocationId>,
    ) -> Result<Vec<Transfer>, StoreError>;
}

#[async_trait]
impl<T> TransferStore for Arc<T>
where
    T: TransferStore + ?Sized,
{
    async fn insert(&self, transfer: Transfer) -> Result<(), StoreError> {
        (**self).insert(transfer).await
    }

    async fn update(&self, transfer: Transfer) -> Result<(), StoreError> {
        (**self).update(transfer).await
    }

    async fn get(&self, org_id: OrgId, id: TransferId) -> Result<Option<Transfer>, StoreError> {
        (**self).get(org_id, id).await
    }

    async fn list(
        &self,
        org_id: OrgId,
        location: Option<LocationId>,
    ) -> Result<Vec<Transfer>, StoreError> {
        (**self).list(org_id, location).await
    }
}
