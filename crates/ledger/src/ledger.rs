use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crossdock_core::OrgId;
use crossdock_locations::LocationId;
use crossdock_products::ProductId;

use crate::record::{reconcile, StockKey, StockRow};
use crate::store::{StockStore, StoreError};

/// How an adjustment combines with the current reconciled quantity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustMode {
    Add,
    Subtract,
    Set,
}

impl AdjustMode {
    fn apply(self, current: i64, amount: i64) -> i64 {
        match self {
            AdjustMode::Add => current + amount,
            AdjustMode::Subtract => current - amount,
            AdjustMode::Set => amount,
        }
    }
}

/// Outcome of a duplicate cleanup pass.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    /// Stale rows removed.
    pub deleted: usize,
    /// Logical keys whose duplicates were collapsed to one row.
    pub written: usize,
}

/// The stock ledger.
///
/// Stateless between calls (no caches); every read reconciles whatever rows
/// the store currently holds, so independent UI surfaces stay consistent by
/// re-fetching.
#[derive(Debug, Clone)]
pub struct StockLedger<S> {
    store: S,
}

impl<S: StockStore> StockLedger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Reconciled quantity for one (location, product) key.
    ///
    /// Absence means zero stock — a missing key is not an error.
    pub async fn quantity(
        &self,
        org_id: OrgId,
        location_id: LocationId,
        product_id: ProductId,
    ) -> Result<i64, StoreError> {
        let rows = self
            .store
            .rows_for_key(org_id, StockKey::new(location_id, product_id))
            .await?;
        Ok(reconcile::winner(&rows).map(|r| r.quantity).unwrap_or(0))
    }

    /// Reconciled quantities for every product at one location.
    ///
    /// One store round trip; each logical key is reconciled independently.
    pub async fn location_stock(
        &self,
        org_id: OrgId,
        location_id: LocationId,
    ) -> Result<BTreeMap<ProductId, i64>, StoreError> {
        let rows = self.store.rows_for_location(org_id, location_id).await?;
        Ok(reconcile::winners(rows)
            .into_values()
            .map(|r| (r.product_id, r.quantity))
            .collect())
    }

    /// Reconciled rows (with timestamps) for every product at one location.
    pub async fn location_rows(
        &self,
        org_id: OrgId,
        location_id: LocationId,
    ) -> Result<Vec<StockRow>, StoreError> {
        let rows = self.store.rows_for_location(org_id, location_id).await?;
        Ok(reconcile::winners(rows).into_values().collect())
    }

    /// Atomically-intended adjustment of one logical key.
    ///
    /// Reads the reconciled quantity, combines it with `amount` per `mode`,
    /// and appends a fresh row stamped `at`. Returns the new quantity, which
    /// may be negative — oversell is surfaced to the caller as a warning, not
    /// rejected here.
    ///
    /// This is a read-then-write sequence over the store, not a storage-level
    /// increment: two racing adjusters can lose an update. The whole exchange
    /// lives behind this one method so a storage-side atomic increment or an
    /// optimistic retry on stale `last_updated` can be substituted without
    /// touching any caller.
    pub async fn adjust(
        &self,
        org_id: OrgId,
        location_id: LocationId,
        product_id: ProductId,
        amount: i64,
        mode: AdjustMode,
        at: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        let current = self.quantity(org_id, location_id, product_id).await?;
        let next = mode.apply(current, amount);

        self.store
            .insert(StockRow::new(org_id, location_id, product_id, next, at))
            .await?;

        if next < 0 {
            tracing::warn!(
                %location_id,
                %product_id,
                quantity = next,
                "stock adjusted below zero (oversell)"
            );
        }

        Ok(next)
    }

    /// Administrative cleanup: collapse duplicate rows per logical key.
    ///
    /// Idempotent. Deletes every row except the reconciliation winner for each
    /// key, so quantities are untouched — only the row count shrinks.
    pub async fn reconcile_duplicates(
        &self,
        org_id: OrgId,
        location_id: LocationId,
    ) -> Result<CleanupReport, StoreError> {
        let rows = self.store.rows_for_location(org_id, location_id).await?;

        let keep = reconcile::winners(rows.clone());
        let stale: Vec<_> = rows
            .iter()
            .filter(|r| keep.get(&r.key()).map(|w| w.row_id) != Some(r.row_id))
            .map(|r| r.row_id)
            .collect();

        let collapsed_keys = {
            let mut counts: BTreeMap<StockKey, usize> = BTreeMap::new();
            for r in &rows {
                *counts.entry(r.key()).or_default() += 1;
            }
            counts.values().filter(|&&n| n > 1).count()
        };

        let deleted = if stale.is_empty() {
            0
        } else {
            self.store.delete_rows(org_id, &stale).await?
        };

        let report = CleanupReport {
            deleted,
            written: collapsed_keys,
        };
        tracing::info!(%location_id, deleted = report.deleted, written = report.written, "stock duplicate cleanup");
        Ok(report)
    }

    /// Product-deletion cascade: remove every row for `product_id` across
    /// locations. The only path besides cleanup that hard-deletes stock rows.
    pub async fn purge_product(
        &self,
        org_id: OrgId,
        product_id: ProductId,
    ) -> Result<usize, StoreError> {
        let rows = self.store.rows_for_product(org_id, product_id).await?;
        if rows.is_empty() {
            return Ok(0);
        }
        let ids: Vec<_> = rows.iter().map(|r| r.row_id).collect();
        self.store.delete_rows(org_id, &ids).await
    }
}
