use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crossdock_core::OrgId;
use crossdock_locations::LocationId;
use crossdock_products::ProductId;

/// Logical key of a stock record: one quantity per (location, product).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StockKey {
    pub location_id: LocationId,
    pub product_id: ProductId,
}

impl StockKey {
    pub fn new(location_id: LocationId, product_id: ProductId) -> Self {
        Self {
            location_id,
            product_id,
        }
    }
}

/// One physical stock row.
///
/// The store may hold several rows for the same [`StockKey`] (retried or racing
/// writes); readers must reconcile. `quantity` may be negative — oversell is a
/// warning for the caller, never a storage-level rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRow {
    /// Physical row identity (UUIDv7, used as the reconciliation tiebreak).
    pub row_id: Uuid,
    pub org_id: OrgId,
    pub location_id: LocationId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub last_updated: DateTime<Utc>,
}

impl StockRow {
    pub fn new(
        org_id: OrgId,
        location_id: LocationId,
        product_id: ProductId,
        quantity: i64,
        last_updated: DateTime<Utc>,
    ) -> Self {
        Self {
            row_id: Uuid::now_v7(),
            org_id,
            location_id,
            product_id,
            quantity,
            last_updated,
        }
    }

    pub fn key(&self) -> StockKey {
        StockKey::new(self.location_id, self.product_id)
    }
}

/// Reconciliation: pick the authoritative row among duplicates.
///
/// Latest `last_updated` wins; ties break on greatest `row_id` (v7 uuids are
/// time-ordered, so the order is stable across repeated reads).
pub mod reconcile {
    use std::collections::BTreeMap;

    use super::{StockKey, StockRow};

    /// `true` if `candidate` beats `incumbent` for the same logical key.
    fn beats(candidate: &StockRow, incumbent: &StockRow) -> bool {
        (candidate.last_updated, candidate.row_id) > (incumbent.last_updated, incumbent.row_id)
    }

    /// Authoritative row among duplicates for one logical key.
    pub fn winner(rows: &[StockRow]) -> Option<&StockRow> {
        rows.iter().reduce(|best, row| if beats(row, best) { row } else { best })
    }

    /// Group rows by logical key and reconcile each group independently.
    pub fn winners(rows: Vec<StockRow>) -> BTreeMap<StockKey, StockRow> {
        let mut out: BTreeMap<StockKey, StockRow> = BTreeMap::new();
        for row in rows {
            match out.get_mut(&row.key()) {
                Some(best) => {
                    if beats(&row, best) {
                        *best = row;
                    }
                }
                None => {
                    out.insert(row.key(), row);
                }
            }
        }
        out
    }
}
