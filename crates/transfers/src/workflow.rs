use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crossdock_access::Actor;
use crossdock_availability::{AvailabilityGuard, DebitError};
use crossdock_core::{DomainError, EntityId, OrgId};
use crossdock_ledger::{AdjustMode, StockLedger, StockStore, StoreError};
use crossdock_locations::LocationId;
use crossdock_products::ProductId;

use crate::store::TransferStore;
use crate::transfer::{Transfer, TransferId, TransferItem, TransferStatus};

/// Request to create a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransfer {
    pub org_id: OrgId,
    pub source: LocationId,
    pub destination: LocationId,
    pub items: Vec<NewTransferItem>,
    pub reason: Option<String>,
    pub requires_approval: bool,
    /// Confirms the zero-stock warning for items whose source quantity is 0.
    pub override_zero_stock: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransferItem {
    pub product_id: ProductId,
    pub requested: i64,
    pub unit_cost: u64,
}

/// Per-item receipt quantity supplied by the receiving side.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReceivedItem {
    pub product_id: ProductId,
    pub received: i64,
}

/// Result of one item's ledger application during a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemOutcome {
    pub product_id: ProductId,
    /// Quantity debited or credited.
    pub amount: i64,
    /// Reconciled quantity after the adjustment, when it succeeded.
    pub new_quantity: Option<i64>,
    pub error: Option<String>,
}

impl ItemOutcome {
    pub fn ok(&self) -> bool {
        self.error.is_none()
    }

    /// The adjustment landed but drove the balance negative.
    pub fn oversold(&self) -> bool {
        self.new_quantity.is_some_and(|q| q < 0)
    }
}

/// A transfer after a transition, with what each item's application did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferUpdate {
    pub transfer: Transfer,
    pub outcomes: Vec<ItemOutcome>,
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("debit check failed for product {product_id}: {source}")]
    Debit {
        product_id: ProductId,
        #[source]
        source: DebitError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    /// One or more items failed to apply. Applied items stay applied (no
    /// rollback); re-invoking the same transition retries only the remainder.
    #[error("transfer {transfer_id}: {applied} of {attempted} items applied; retry to apply the rest")]
    PartialApplication {
        transfer_id: TransferId,
        applied: usize,
        attempted: usize,
        outcomes: Vec<ItemOutcome>,
    },
}

/// Drives transfer transitions and their ledger side effects.
///
/// There is no transaction spanning the items of a transfer: each item's
/// debit/credit is an independent ledger adjustment (see
/// [`WorkflowError::PartialApplication`]). All item application funnels
/// through one routine per direction so a transactional store could be
/// substituted without changing this public contract.
#[derive(Debug, Clone)]
pub struct TransferWorkflow<S, T> {
    ledger: StockLedger<S>,
    guard: AvailabilityGuard<S>,
    transfers: T,
}

impl<S, T> TransferWorkflow<S, T>
where
    S: StockStore + Clone,
    T: TransferStore,
{
    pub fn new(stock: S, transfers: T) -> Self {
        Self {
            ledger: StockLedger::new(stock.clone()),
            guard: AvailabilityGuard::new(StockLedger::new(stock)),
            transfers,
        }
    }

    /// Create a `pending` transfer.
    ///
    /// Each item is checked against current source availability: zero stock
    /// is a confirmable warning (bypassed via `override_zero_stock`), a
    /// nonzero shortfall is a hard block. The check is advisory — it is run
    /// again in spirit at approval, where shortfalls become oversell
    /// warnings instead of blocks.
    pub async fn create(&self, req: NewTransfer, at: DateTime<Utc>) -> Result<Transfer, WorkflowError> {
        let items = req
            .items
            .iter()
            .map(|i| TransferItem::new(i.product_id, i.requested, i.unit_cost))
            .collect();

        let transfer = Transfer::new(
            TransferId::new(EntityId::new()),
            req.org_id,
            req.source,
            req.destination,
            items,
            req.reason,
            req.requires_approval,
            at,
        )?;

        for item in &transfer.items {
            let decision = self
                .guard
                .check_debit(req.org_id, req.source, item.product_id, item.requested, 0)
                .await?;
            if decision.is_soft_warning() {
                tracing::warn!(
                    transfer_id = %transfer.id,
                    product_id = %item.product_id,
                    "transfer item entered against zero recorded stock"
                );
            }
            decision
                .ensure(req.override_zero_stock)
                .map_err(|source| WorkflowError::Debit {
                    product_id: item.product_id,
                    source,
                })?;
        }

        self.transfers.insert(transfer.clone()).await?;
        tracing::info!(transfer_id = %transfer.id, source = %transfer.source, destination = %transfer.destination, "transfer created");
        Ok(transfer)
    }

    pub async fn get(&self, org_id: OrgId, id: TransferId) -> Result<Transfer, WorkflowError> {
        self.load(org_id, id).await
    }

    pub async fn list(
        &self,
        org_id: OrgId,
        location: Option<LocationId>,
    ) -> Result<Vec<Transfer>, WorkflowError> {
        Ok(self.transfers.list(org_id, location).await?)
    }

    /// `pending -> approved`: debit the source for every item.
    ///
    /// A shortfall that appeared since creation does not block — the balance
    /// goes negative and is surfaced through the item outcome (oversell).
    pub async fn approve(
        &self,
        org_id: OrgId,
        id: TransferId,
        actor: &Actor,
        at: DateTime<Utc>,
    ) -> Result<TransferUpdate, WorkflowError> {
        let mut transfer = self.load(org_id, id).await?;
        transfer.ensure_can_approve(actor)?;

        let outcomes = self.apply_debits(&mut transfer, at).await;
        self.settle(transfer, outcomes, TransferStatus::Approved, at, |t| {
            t.fully_debited()
        })
        .await
    }

    /// `approved -> in_transit`: visibility marker only, no stock effect.
    pub async fn mark_in_transit(
        &self,
        org_id: OrgId,
        id: TransferId,
        actor: &Actor,
        at: DateTime<Utc>,
    ) -> Result<Transfer, WorkflowError> {
        let mut transfer = self.load(org_id, id).await?;
        transfer.ensure_can_mark_in_transit(actor)?;
        transfer.advance(TransferStatus::InTransit, at);
        self.transfers.update(transfer.clone()).await?;
        tracing::info!(transfer_id = %transfer.id, "transfer in transit");
        Ok(transfer)
    }

    /// `in_transit -> received`: credit the destination for every item by its
    /// received quantity (default: requested). Terminal and irreversible;
    /// the only transition that increases destination stock.
    pub async fn receive(
        &self,
        org_id: OrgId,
        id: TransferId,
        actor: &Actor,
        items: Vec<ReceivedItem>,
        notes: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<TransferUpdate, WorkflowError> {
        let mut transfer = self.load(org_id, id).await?;
        transfer.ensure_can_receive(actor)?;

        let quantities: Vec<_> = items.iter().map(|i| (i.product_id, i.received)).collect();
        transfer.record_receipt(&quantities)?;
        if notes.is_some() {
            transfer.notes = notes;
        }

        let outcomes = self.apply_credits(&mut transfer, at).await;
        self.settle(transfer, outcomes, TransferStatus::Received, at, |t| {
            t.fully_credited()
        })
        .await
    }

    /// `pending -> cancelled`: terminal; nothing has moved yet, so there is
    /// no ledger effect.
    pub async fn cancel(
        &self,
        org_id: OrgId,
        id: TransferId,
        actor: &Actor,
        at: DateTime<Utc>,
    ) -> Result<Transfer, WorkflowError> {
        let mut transfer = self.load(org_id, id).await?;
        transfer.ensure_can_cancel(actor)?;
        transfer.advance(TransferStatus::Cancelled, at);
        self.transfers.update(transfer.clone()).await?;
        tracing::info!(transfer_id = %transfer.id, "transfer cancelled");
        Ok(transfer)
    }

    async fn load(&self, org_id: OrgId, id: TransferId) -> Result<Transfer, WorkflowError> {
        self.transfers
            .get(org_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found().into())
    }

    /// Apply the source debit for every item that has not been debited yet.
    /// A failed item never blocks the ones after it.
    async fn apply_debits(&self, transfer: &mut Transfer, at: DateTime<Utc>) -> Vec<ItemOutcome> {
        let org_id = transfer.org_id;
        let source = transfer.source;

        let mut outcomes = Vec::new();
        for item in transfer.items.iter_mut().filter(|i| !i.debited) {
            let result = self
                .ledger
                .adjust(
                    org_id,
                    source,
                    item.product_id,
                    item.requested,
                    AdjustMode::Subtract,
                    at,
                )
                .await;

            outcomes.push(match result {
                Ok(new_quantity) => {
                    item.debited = true;
                    ItemOutcome {
                        product_id: item.product_id,
                        amount: item.requested,
                        new_quantity: Some(new_quantity),
                        error: None,
                    }
                }
                Err(e) => ItemOutcome {
                    product_id: item.product_id,
                    amount: item.requested,
                    new_quantity: None,
                    error: Some(e.to_string()),
                },
            });
        }
        outcomes
    }

    /// Apply the destination credit for every item not yet credited.
    async fn apply_credits(&self, transfer: &mut Transfer, at: DateTime<Utc>) -> Vec<ItemOutcome> {
        let org_id = transfer.org_id;
        let destination = transfer.destination;

        let mut outcomes = Vec::new();
        for item in transfer.items.iter_mut().filter(|i| !i.credited) {
            let amount = item.received_or_requested();
            let result = self
                .ledger
                .adjust(
                    org_id,
                    destination,
                    item.product_id,
                    amount,
                    AdjustMode::Add,
                    at,
                )
                .await;

            outcomes.push(match result {
                Ok(new_quantity) => {
                    item.credited = true;
                    ItemOutcome {
                        product_id: item.product_id,
                        amount,
                        new_quantity: Some(new_quantity),
                        error: None,
                    }
                }
                Err(e) => ItemOutcome {
                    product_id: item.product_id,
                    amount,
                    new_quantity: None,
                    error: Some(e.to_string()),
                },
            });
        }
        outcomes
    }

    /// Persist item markers, then either advance the status (everything
    /// applied) or report the partial application for retry.
    async fn settle(
        &self,
        mut transfer: Transfer,
        outcomes: Vec<ItemOutcome>,
        next: TransferStatus,
        at: DateTime<Utc>,
        done: impl Fn(&Transfer) -> bool,
    ) -> Result<TransferUpdate, WorkflowError> {
        if done(&transfer) {
            transfer.advance(next, at);
            self.transfers.update(transfer.clone()).await?;

            for o in outcomes.iter().filter(|o| o.oversold()) {
                tracing::warn!(
                    transfer_id = %transfer.id,
                    product_id = %o.product_id,
                    quantity = o.new_quantity,
                    "transfer application drove stock negative"
                );
            }
            tracing::info!(transfer_id = %transfer.id, status = %transfer.status, "transfer transitioned");
            return Ok(TransferUpdate { transfer, outcomes });
        }

        // Keep the markers of what did land; status stays put for retry.
        self.transfers.update(transfer.clone()).await?;
        let applied = outcomes.iter().filter(|o| o.ok()).count();
        let attempted = outcomes.len();
        tracing::warn!(
            transfer_id = %transfer.id,
            applied,
            attempted,
            "transfer item application incomplete"
        );
        Err(WorkflowError::PartialApplication {
            transfer_id: transfer.id,
            applied,
            attempted,
            outcomes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::{Arc, RwLock};
    use uuid::Uuid;

    use crossdock_access::ActorRole;
    use crossdock_core::UserId;
    use crossdock_ledger::{StockKey, StockRow};

    /// In-memory stock rows with per-product write-failure injection.
    #[derive(Default)]
    struct MemStock {
        rows: RwLock<Vec<StockRow>>,
        fail_writes_for: RwLock<HashSet<ProductId>>,
    }

    impl MemStock {
        fn fail_writes_for(&self, product_id: ProductId) {
            self.fail_writes_for.write().unwrap().insert(product_id);
        }

        fn heal(&self) {
            self.fail_writes_for.write().unwrap().clear();
        }
    }

    #[async_trait]
    impl StockStore for MemStock {
        async fn insert(&self, row: StockRow) -> Result<(), StoreError> {
            if self.fail_writes_for.read().unwrap().contains(&row.product_id) {
                return Err(StoreError::backend("injected write failure"));
            }
            self.rows.write().unwrap().push(row);
            Ok(())
        }

        async fn rows_for_key(&self, org_id: OrgId, key: StockKey) -> Result<Vec<StockRow>, StoreError> {
            Ok(self
                .rows
                .read()
                .unwrap()
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
            Ok(self
                .rows
                .read()
                .unwrap()
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
            Ok(self
                .rows
                .read()
                .unwrap()
                .iter()
                .filter(|r| r.org_id == org_id && r.product_id == product_id)
                .cloned()
                .collect())
        }

        async fn delete_rows(&self, org_id: OrgId, row_ids: &[Uuid]) -> Result<usize, StoreError> {
            let mut rows = self.rows.write().unwrap();
            let before = rows.len();
            rows.retain(|r| !(r.org_id == org_id && row_ids.contains(&r.row_id)));
            Ok(before - rows.len())
        }
    }

    #[derive(Default)]
    struct MemTransfers {
        inner: RwLock<Vec<Transfer>>,
    }

    #[async_trait]
    impl TransferStore for MemTransfers {
        async fn insert(&self, transfer: Transfer) -> Result<(), StoreError> {
            self.inner.write().unwrap().push(transfer);
            Ok(())
        }

        async fn update(&self, transfer: Transfer) -> Result<(), StoreError> {
            let mut inner = self.inner.write().unwrap();
            match inner.iter_mut().find(|t| t.id == transfer.id) {
                Some(slot) => {
                    *slot = transfer;
                    Ok(())
                }
                None => Err(StoreError::backend("no such transfer")),
            }
        }

        async fn get(&self, org_id: OrgId, id: TransferId) -> Result<Option<Transfer>, StoreError> {
            Ok(self
                .inner
                .read()
                .unwrap()
                .iter()
                .find(|t| t.org_id == org_id && t.id == id)
                .cloned())
        }

        async fn list(
            &self,
            org_id: OrgId,
            location: Option<LocationId>,
        ) -> Result<Vec<Transfer>, StoreError> {
            Ok(self
                .inner
                .read()
                .unwrap()
                .iter()
                .filter(|t| t.org_id == org_id)
                .filter(|t| {
                    location.is_none_or(|l| t.source == l || t.destination == l)
                })
                .cloned()
                .collect())
        }
    }

    struct Fixture {
        stock: Arc<MemStock>,
        workflow: TransferWorkflow<Arc<MemStock>, Arc<MemTransfers>>,
        ledger: StockLedger<Arc<MemStock>>,
        org: OrgId,
        source: LocationId,
        destination: LocationId,
        admin: Actor,
    }

    fn fixture() -> Fixture {
        let stock = Arc::new(MemStock::default());
        let transfers = Arc::new(MemTransfers::default());
        Fixture {
            stock: stock.clone(),
            workflow: TransferWorkflow::new(stock.clone(), transfers),
            ledger: StockLedger::new(stock),
            org: OrgId::new(),
            source: LocationId::new(EntityId::new()),
            destination: LocationId::new(EntityId::new()),
            admin: Actor::new(UserId::new(), ActorRole::Admin, vec![]),
        }
    }

    async fn seed(f: &Fixture, product: ProductId, quantity: i64) {
        f.ledger
            .adjust(f.org, f.source, product, quantity, AdjustMode::Set, Utc::now())
            .await
            .unwrap();
    }

    fn request(f: &Fixture, items: Vec<NewTransferItem>) -> NewTransfer {
        NewTransfer {
            org_id: f.org,
            source: f.source,
            destination: f.destination,
            items,
            reason: Some("restock".to_string()),
            requires_approval: true,
            override_zero_stock: false,
        }
    }

    fn one_item(product: ProductId, requested: i64) -> Vec<NewTransferItem> {
        vec![NewTransferItem {
            product_id: product,
            requested,
            unit_cost: 500,
        }]
    }

    #[tokio::test]
    async fn full_lifecycle_moves_stock_between_locations() {
        let f = fixture();
        let product = ProductId::new(EntityId::new());
        seed(&f, product, 20).await;

        let t = f
            .workflow
            .create(request(&f, one_item(product, 5)), Utc::now())
            .await
            .unwrap();
        assert_eq!(t.status, TransferStatus::Pending);
        assert_eq!(f.ledger.quantity(f.org, f.source, product).await.unwrap(), 20);

        let update = f
            .workflow
            .approve(f.org, t.id, &f.admin, Utc::now())
            .await
            .unwrap();
        assert_eq!(update.transfer.status, TransferStatus::Approved);
        assert_eq!(f.ledger.quantity(f.org, f.source, product).await.unwrap(), 15);
        assert_eq!(
            f.ledger.quantity(f.org, f.destination, product).await.unwrap(),
            0
        );

        let t = f
            .workflow
            .mark_in_transit(f.org, update.transfer.id, &f.admin, Utc::now())
            .await
            .unwrap();
        assert_eq!(t.status, TransferStatus::InTransit);
        // No stock movement on the transit marker.
        assert_eq!(f.ledger.quantity(f.org, f.source, product).await.unwrap(), 15);

        let update = f
            .workflow
            .receive(f.org, t.id, &f.admin, vec![], None, Utc::now())
            .await
            .unwrap();
        assert_eq!(update.transfer.status, TransferStatus::Received);
        assert_eq!(f.ledger.quantity(f.org, f.source, product).await.unwrap(), 15);
        assert_eq!(
            f.ledger.quantity(f.org, f.destination, product).await.unwrap(),
            5
        );
    }

    #[tokio::test]
    async fn partial_receipt_credits_the_received_quantity() {
        let f = fixture();
        let product = ProductId::new(EntityId::new());
        seed(&f, product, 10).await;

        let t = f
            .workflow
            .create(request(&f, one_item(product, 8)), Utc::now())
            .await
            .unwrap();
        f.workflow.approve(f.org, t.id, &f.admin, Utc::now()).await.unwrap();
        f.workflow
            .mark_in_transit(f.org, t.id, &f.admin, Utc::now())
            .await
            .unwrap();

        let update = f
            .workflow
            .receive(
                f.org,
                t.id,
                &f.admin,
                vec![ReceivedItem {
                    product_id: product,
                    received: 6,
                }],
                Some("two units damaged in transit".to_string()),
                Utc::now(),
            )
            .await
            .unwrap();

        assert_eq!(update.transfer.items[0].received, Some(6));
        assert_eq!(
            f.ledger.quantity(f.org, f.destination, product).await.unwrap(),
            6
        );
        assert_eq!(f.ledger.quantity(f.org, f.source, product).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn receive_on_pending_fails_and_moves_nothing() {
        let f = fixture();
        let product = ProductId::new(EntityId::new());
        seed(&f, product, 20).await;

        let t = f
            .workflow
            .create(request(&f, one_item(product, 5)), Utc::now())
            .await
            .unwrap();

        let err = f
            .workflow
            .receive(f.org, t.id, &f.admin, vec![], None, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Domain(DomainError::InvalidTransition(_))
        ));
        assert_eq!(f.ledger.quantity(f.org, f.source, product).await.unwrap(), 20);
        assert_eq!(
            f.ledger.quantity(f.org, f.destination, product).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn cancel_is_terminal_and_leaves_stock_unchanged() {
        let f = fixture();
        let product = ProductId::new(EntityId::new());
        seed(&f, product, 20).await;

        let t = f
            .workflow
            .create(request(&f, one_item(product, 5)), Utc::now())
            .await
            .unwrap();
        let t = f.workflow.cancel(f.org, t.id, &f.admin, Utc::now()).await.unwrap();
        assert_eq!(t.status, TransferStatus::Cancelled);
        assert_eq!(f.ledger.quantity(f.org, f.source, product).await.unwrap(), 20);

        let err = f
            .workflow
            .approve(f.org, t.id, &f.admin, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Domain(DomainError::InvalidTransition(_))
        ));
    }

    #[tokio::test]
    async fn creation_blocks_hard_shortfall_but_oversell_at_approval_proceeds() {
        let f = fixture();
        let product = ProductId::new(EntityId::new());
        seed(&f, product, 3).await;

        // Entry-time: nonzero but short is a hard block.
        let err = f
            .workflow
            .create(request(&f, one_item(product, 5)), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Debit {
                source: DebitError::Insufficient { .. },
                ..
            }
        ));

        // A transfer created while stock was sufficient still approves after
        // the stock drained; the balance just goes negative.
        let t = f
            .workflow
            .create(request(&f, one_item(product, 3)), Utc::now())
            .await
            .unwrap();
        f.ledger
            .adjust(f.org, f.source, product, 2, AdjustMode::Subtract, Utc::now())
            .await
            .unwrap();

        let update = f
            .workflow
            .approve(f.org, t.id, &f.admin, Utc::now())
            .await
            .unwrap();
        assert_eq!(update.transfer.status, TransferStatus::Approved);
        assert!(update.outcomes[0].oversold());
        assert_eq!(f.ledger.quantity(f.org, f.source, product).await.unwrap(), -2);
    }

    #[tokio::test]
    async fn zero_stock_item_requires_explicit_override() {
        let f = fixture();
        let product = ProductId::new(EntityId::new());

        let err = f
            .workflow
            .create(request(&f, one_item(product, 5)), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Debit {
                source: DebitError::ZeroStockUnconfirmed { .. },
                ..
            }
        ));

        let mut req = request(&f, one_item(product, 5));
        req.override_zero_stock = true;
        let t = f.workflow.create(req, Utc::now()).await.unwrap();
        assert_eq!(t.status, TransferStatus::Pending);
    }

    #[tokio::test]
    async fn partial_application_keeps_applied_items_and_retries_the_rest() {
        let f = fixture();
        let good = ProductId::new(EntityId::new());
        let flaky = ProductId::new(EntityId::new());
        seed(&f, good, 10).await;
        seed(&f, flaky, 10).await;

        let t = f
            .workflow
            .create(
                request(
                    &f,
                    vec![
                        NewTransferItem {
                            product_id: good,
                            requested: 4,
                            unit_cost: 100,
                        },
                        NewTransferItem {
                            product_id: flaky,
                            requested: 6,
                            unit_cost: 100,
                        },
                    ],
                ),
                Utc::now(),
            )
            .await
            .unwrap();

        f.stock.fail_writes_for(flaky);
        let err = f
            .workflow
            .approve(f.org, t.id, &f.admin, Utc::now())
            .await
            .unwrap_err();

        match err {
            WorkflowError::PartialApplication {
                applied,
                attempted,
                outcomes,
                ..
            } => {
                assert_eq!(applied, 1);
                assert_eq!(attempted, 2);
                assert!(outcomes.iter().any(|o| o.product_id == good && o.ok()));
                assert!(outcomes.iter().any(|o| o.product_id == flaky && !o.ok()));
            }
            other => panic!("expected PartialApplication, got {other:?}"),
        }

        // The good item's debit stuck; the transfer is still pending.
        assert_eq!(f.ledger.quantity(f.org, f.source, good).await.unwrap(), 6);
        assert_eq!(f.ledger.quantity(f.org, f.source, flaky).await.unwrap(), 10);
        let stored = f.workflow.get(f.org, t.id).await.unwrap();
        assert_eq!(stored.status, TransferStatus::Pending);
        assert!(stored.items.iter().any(|i| i.product_id == good && i.debited));

        // Retry applies only the remainder: no double debit of `good`.
        f.stock.heal();
        let update = f
            .workflow
            .approve(f.org, t.id, &f.admin, Utc::now())
            .await
            .unwrap();
        assert_eq!(update.transfer.status, TransferStatus::Approved);
        assert_eq!(update.outcomes.len(), 1);
        assert_eq!(update.outcomes[0].product_id, flaky);
        assert_eq!(f.ledger.quantity(f.org, f.source, good).await.unwrap(), 6);
        assert_eq!(f.ledger.quantity(f.org, f.source, flaky).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn role_gates_are_enforced_per_transition() {
        let f = fixture();
        let product = ProductId::new(EntityId::new());
        seed(&f, product, 20).await;

        let t = f
            .workflow
            .create(request(&f, one_item(product, 5)), Utc::now())
            .await
            .unwrap();

        let cashier = Actor::new(UserId::new(), ActorRole::Cashier, vec![f.destination]);
        let err = f
            .workflow
            .approve(f.org, t.id, &cashier, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Domain(DomainError::Unauthorized)));

        let dest_manager = Actor::new(UserId::new(), ActorRole::Manager, vec![f.destination]);
        f.workflow
            .approve(f.org, t.id, &dest_manager, Utc::now())
            .await
            .unwrap();

        // Managers cannot mark in transit; that needs owner/admin.
        let err = f
            .workflow
            .mark_in_transit(f.org, t.id, &dest_manager, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Domain(DomainError::Unauthorized)));
    }

    #[tokio::test]
    async fn transfers_are_invisible_across_orgs() {
        let f = fixture();
        let product = ProductId::new(EntityId::new());
        seed(&f, product, 20).await;

        let t = f
            .workflow
            .create(request(&f, one_item(product, 5)), Utc::now())
            .await
            .unwrap();

        let err = f.workflow.get(OrgId::new(), t.id).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Domain(DomainError::NotFound)));
    }
}
