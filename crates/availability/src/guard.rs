use serde::{Deserialize, Serialize};
use thiserror::Error;

use crossdock_core::OrgId;
use crossdock_ledger::{StockLedger, StockStore, StoreError};
use crossdock_locations::LocationId;
use crossdock_products::ProductId;

/// Why a debit was not plainly allowed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DebitError {
    /// Hard block: available is nonzero but short of the request.
    #[error("insufficient stock: requested {requested}, available {available}")]
    Insufficient { requested: i64, available: i64 },

    /// Soft, confirmable: quantity is exactly zero, which may simply mean the
    /// key was never initialized. Proceed by overriding.
    #[error("no recorded stock for this product at this location; confirm to proceed")]
    ZeroStockUnconfirmed { requested: i64 },
}

/// Decision for one requested debit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum DebitDecision {
    /// Satisfiable; `remaining` is the figure stock-consuming UIs display
    /// (available minus this request minus what the session already holds).
    Allowed { remaining: i64 },

    /// Quantity is exactly 0: allowed, but tagged as a confirmable warning.
    ZeroStock { requested: i64 },

    /// Nonzero but insufficient: cannot be bypassed.
    Blocked { requested: i64, available: i64 },
}

impl DebitDecision {
    /// `true` unless the debit is hard-blocked.
    pub fn allowed(&self) -> bool {
        !matches!(self, DebitDecision::Blocked { .. })
    }

    pub fn is_soft_warning(&self) -> bool {
        matches!(self, DebitDecision::ZeroStock { .. })
    }

    pub fn reason(&self) -> Option<String> {
        match self {
            DebitDecision::Allowed { .. } => None,
            DebitDecision::ZeroStock { requested } => Some(
                DebitError::ZeroStockUnconfirmed {
                    requested: *requested,
                }
                .to_string(),
            ),
            DebitDecision::Blocked {
                requested,
                available,
            } => Some(
                DebitError::Insufficient {
                    requested: *requested,
                    available: *available,
                }
                .to_string(),
            ),
        }
    }

    /// Collapse to a result: hard blocks always fail; the zero-stock warning
    /// fails only when the caller has not explicitly overridden it.
    pub fn ensure(&self, override_zero_stock: bool) -> Result<(), DebitError> {
        match self {
            DebitDecision::Allowed { .. } => Ok(()),
            DebitDecision::ZeroStock { requested } => {
                if override_zero_stock {
                    Ok(())
                } else {
                    Err(DebitError::ZeroStockUnconfirmed {
                        requested: *requested,
                    })
                }
            }
            DebitDecision::Blocked {
                requested,
                available,
            } => Err(DebitError::Insufficient {
                requested: *requested,
                available: *available,
            }),
        }
    }
}

/// The availability guard. Holds no state of its own; every answer comes from
/// a fresh reconciled ledger read.
#[derive(Debug, Clone)]
pub struct AvailabilityGuard<S> {
    ledger: StockLedger<S>,
}

impl<S: StockStore> AvailabilityGuard<S> {
    pub fn new(ledger: StockLedger<S>) -> Self {
        Self { ledger }
    }

    /// Current reconciled quantity.
    pub async fn available(
        &self,
        org_id: OrgId,
        location_id: LocationId,
        product_id: ProductId,
    ) -> Result<i64, StoreError> {
        self.ledger.quantity(org_id, location_id, product_id).await
    }

    /// Decide whether `requested` more units can be debited, on top of
    /// whatever the caller's session has already reserved.
    pub async fn check_debit(
        &self,
        org_id: OrgId,
        location_id: LocationId,
        product_id: ProductId,
        requested: i64,
        reserved_in_session: i64,
    ) -> Result<DebitDecision, StoreError> {
        let available = self.available(org_id, location_id, product_id).await?;
        let total = requested + reserved_in_session;

        if available == 0 {
            return Ok(DebitDecision::ZeroStock { requested });
        }
        if total > available {
            return Ok(DebitDecision::Blocked {
                requested: total,
                available,
            });
        }
        Ok(DebitDecision::Allowed {
            remaining: available - total,
        })
    }
}
