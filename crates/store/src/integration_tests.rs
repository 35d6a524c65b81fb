//! Integration tests over the in-memory stores.
//!
//! Exercise the full path: ledger adjustments -> duplicate reconciliation ->
//! transfer workflow side effects, the way the HTTP layer drives them.

use std::sync::Arc;

use chrono::Utc;

use crossdock_access::{Actor, ActorRole};
use crossdock_core::{EntityId, OrgId, UserId};
use crossdock_ledger::{AdjustMode, StockLedger};
use crossdock_locations::LocationId;
use crossdock_products::ProductId;
use crossdock_transfers::{NewTransfer, NewTransferItem, TransferStatus, TransferWorkflow};

use crate::in_memory::{InMemoryStockStore, InMemoryTransferStore};

fn ids() -> (OrgId, LocationId, ProductId) {
    (
        OrgId::new(),
        LocationId::new(EntityId::new()),
        ProductId::new(EntityId::new()),
    )
}

fn admin() -> Actor {
    Actor::new(UserId::new(), ActorRole::Admin, vec![])
}

#[tokio::test]
async fn adjust_modes_compose_over_the_store() {
    let (org, loc, prod) = ids();
    let ledger = StockLedger::new(Arc::new(InMemoryStockStore::new()));

    assert_eq!(ledger.quantity(org, loc, prod).await.unwrap(), 0);

    ledger.adjust(org, loc, prod, 10, AdjustMode::Set, Utc::now()).await.unwrap();
    ledger.adjust(org, loc, prod, 4, AdjustMode::Add, Utc::now()).await.unwrap();
    let q = ledger
        .adjust(org, loc, prod, 6, AdjustMode::Subtract, Utc::now())
        .await
        .unwrap();

    assert_eq!(q, 8);
    assert_eq!(ledger.quantity(org, loc, prod).await.unwrap(), 8);

    let stock = ledger.location_stock(org, loc).await.unwrap();
    assert_eq!(stock.get(&prod), Some(&8));
}

#[tokio::test]
async fn cleanup_collapses_duplicates_without_changing_quantities() {
    let (org, loc, prod) = ids();
    let store = Arc::new(InMemoryStockStore::new());
    let ledger = StockLedger::new(store.clone());

    // Every adjustment appends a physical row.
    for amount in [5, 7, 9] {
        ledger.adjust(org, loc, prod, amount, AdjustMode::Set, Utc::now()).await.unwrap();
    }
    assert_eq!(store.row_count(), 3);

    let report = ledger.reconcile_duplicates(org, loc).await.unwrap();
    assert_eq!(report.deleted, 2);
    assert_eq!(report.written, 1);
    assert_eq!(store.row_count(), 1);
    assert_eq!(ledger.quantity(org, loc, prod).await.unwrap(), 9);

    // Idempotent.
    let report = ledger.reconcile_duplicates(org, loc).await.unwrap();
    assert_eq!(report.deleted, 0);
    assert_eq!(report.written, 0);
    assert_eq!(ledger.quantity(org, loc, prod).await.unwrap(), 9);
}

#[tokio::test]
async fn purge_product_removes_rows_across_locations() {
    let (org, loc_a, prod) = ids();
    let loc_b = LocationId::new(EntityId::new());
    let other = ProductId::new(EntityId::new());
    let store = Arc::new(InMemoryStockStore::new());
    let ledger = StockLedger::new(store.clone());

    ledger.adjust(org, loc_a, prod, 5, AdjustMode::Set, Utc::now()).await.unwrap();
    ledger.adjust(org, loc_b, prod, 3, AdjustMode::Set, Utc::now()).await.unwrap();
    ledger.adjust(org, loc_a, other, 2, AdjustMode::Set, Utc::now()).await.unwrap();

    let deleted = ledger.purge_product(org, prod).await.unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(ledger.quantity(org, loc_a, prod).await.unwrap(), 0);
    assert_eq!(ledger.quantity(org, loc_b, prod).await.unwrap(), 0);
    assert_eq!(ledger.quantity(org, loc_a, other).await.unwrap(), 2);
}

#[tokio::test]
async fn stock_reads_are_org_scoped() {
    let (org, loc, prod) = ids();
    let ledger = StockLedger::new(Arc::new(InMemoryStockStore::new()));

    ledger.adjust(org, loc, prod, 12, AdjustMode::Set, Utc::now()).await.unwrap();

    assert_eq!(ledger.quantity(OrgId::new(), loc, prod).await.unwrap(), 0);
    assert!(ledger.location_stock(OrgId::new(), loc).await.unwrap().is_empty());
}

#[tokio::test]
async fn transfer_lifecycle_over_shared_stores() {
    let (org, source, prod) = ids();
    let destination = LocationId::new(EntityId::new());

    let stock = Arc::new(InMemoryStockStore::new());
    let transfers = Arc::new(InMemoryTransferStore::new());
    let ledger = StockLedger::new(stock.clone());
    let workflow = TransferWorkflow::new(stock.clone(), transfers);

    ledger.adjust(org, source, prod, 20, AdjustMode::Set, Utc::now()).await.unwrap();

    let transfer = workflow
        .create(
            NewTransfer {
                org_id: org,
                source,
                destination,
                items: vec![NewTransferItem {
                    product_id: prod,
                    requested: 5,
                    unit_cost: 250,
                }],
                reason: Some("rebalance".to_string()),
                requires_approval: true,
                override_zero_stock: false,
            },
            Utc::now(),
        )
        .await
        .unwrap();

    let actor = admin();
    workflow.approve(org, transfer.id, &actor, Utc::now()).await.unwrap();
    workflow.mark_in_transit(org, transfer.id, &actor, Utc::now()).await.unwrap();
    let update = workflow
        .receive(org, transfer.id, &actor, vec![], None, Utc::now())
        .await
        .unwrap();

    assert_eq!(update.transfer.status, TransferStatus::Received);
    assert_eq!(ledger.quantity(org, source, prod).await.unwrap(), 15);
    assert_eq!(ledger.quantity(org, destination, prod).await.unwrap(), 5);

    // Adjustments piled up duplicate rows at the source; cleanup collapses
    // them and the quantities hold.
    ledger.reconcile_duplicates(org, source).await.unwrap();
    ledger.reconcile_duplicates(org, destination).await.unwrap();
    assert_eq!(ledger.quantity(org, source, prod).await.unwrap(), 15);
    assert_eq!(ledger.quantity(org, destination, prod).await.unwrap(), 5);

    // Both listings see the transfer from their own location.
    let at_source = workflow.list(org, Some(source)).await.unwrap();
    let at_destination = workflow.list(org, Some(destination)).await.unwrap();
    assert_eq!(at_source.len(), 1);
    assert_eq!(at_destination.len(), 1);
}

#[tokio::test]
async fn transfer_listing_is_ordered_by_creation() {
    let (org, source, prod) = ids();
    let destination = LocationId::new(EntityId::new());

    let stock = Arc::new(InMemoryStockStore::new());
    let transfers = Arc::new(InMemoryTransferStore::new());
    let ledger = StockLedger::new(stock.clone());
    let workflow = TransferWorkflow::new(stock, transfers);

    ledger.adjust(org, source, prod, 50, AdjustMode::Set, Utc::now()).await.unwrap();

    let mut created = Vec::new();
    for i in 1..=3 {
        let t = workflow
            .create(
                NewTransfer {
                    org_id: org,
                    source,
                    destination,
                    items: vec![NewTransferItem {
                        product_id: prod,
                        requested: i,
                        unit_cost: 100,
                    }],
                    reason: None,
                    requires_approval: false,
                    override_zero_stock: false,
                },
                Utc::now(),
            )
            .await
            .unwrap();
        created.push(t.id);
    }

    let listed: Vec<_> = workflow.list(org, None).await.unwrap().iter().map(|t| t.id).collect();
    assert_eq!(listed, created);
}
