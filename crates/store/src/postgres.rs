//! Postgres-backed stores.
//!
//! Expected schema:
//!
//! ```sql
//! CREATE TABLE stock_rows (
//!     row_id       UUID PRIMARY KEY,
//!     org_id       UUID NOT NULL,
//!     location_id  UUID NOT NULL,
//!     product_id   UUID NOT NULL,
//!     quantity     BIGINT NOT NULL,
//!     last_updated TIMESTAMPTZ NOT NULL
//! );
//! CREATE INDEX stock_rows_key ON stock_rows (org_id, location_id, product_id);
//! CREATE INDEX stock_rows_product ON stock_rows (org_id, product_id);
//!
//! CREATE TABLE transfers (
//!     id          UUID PRIMARY KEY,
//!     org_id      UUID NOT NULL,
//!     source      UUID NOT NULL,
//!     destination UUID NOT NULL,
//!     status      TEXT NOT NULL,
//!     document    JSONB NOT NULL,
//!     created_at  TIMESTAMPTZ NOT NULL,
//!     updated_at  TIMESTAMPTZ NOT NULL
//! );
//! CREATE INDEX transfers_org ON transfers (org_id, created_at);
//! ```
//!
//! There is deliberately no unique constraint on the stock logical key
//! `(org_id, location_id, product_id)`: duplicate rows are tolerated and
//! collapsed by read-side reconciliation and the cleanup endpoint.
//!
//! The transfer document is the serialized [`Transfer`]; `status`, `source`
//! and `destination` are denormalized for filtering only.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use crossdock_core::OrgId;
use crossdock_ledger::{StockKey, StockRow, StockStore, StoreError};
use crossdock_locations::LocationId;
use crossdock_products::ProductId;
use crossdock_transfers::{Transfer, TransferId, TransferStore};

/// Stock rows in Postgres. Insert-heavy; reads always fetch whole key or
/// location slices for reconciliation.
#[derive(Debug, Clone)]
pub struct PostgresStockStore {
    pool: Arc<PgPool>,
}

impl PostgresStockStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl StockStore for PostgresStockStore {
    #[instrument(skip(self, row), fields(org_id = %row.org_id), err)]
    async fn insert(&self, row: StockRow) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO stock_rows (row_id, org_id, location_id, product_id, quantity, last_updated)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(row.row_id)
        .bind(Uuid::from(row.org_id))
        .bind(Uuid::from(row.location_id.0))
        .bind(Uuid::from(row.product_id.0))
        .bind(row.quantity)
        .bind(row.last_updated)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_stock_row", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(org_id = %org_id), err)]
    async fn rows_for_key(&self, org_id: OrgId, key: StockKey) -> Result<Vec<StockRow>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT row_id, org_id, location_id, product_id, quantity, last_updated
            FROM stock_rows
            WHERE org_id = $1 AND location_id = $2 AND product_id = $3
            "#,
        )
        .bind(Uuid::from(org_id))
        .bind(Uuid::from(key.location_id.0))
        .bind(Uuid::from(key.product_id.0))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("rows_for_key", e))?;

        rows.iter().map(read_stock_row).collect()
    }

    #[instrument(skip(self), fields(org_id = %org_id, location_id = %location_id), err)]
    async fn rows_for_location(
        &self,
        org_id: OrgId,
        location_id: LocationId,
    ) -> Result<Vec<StockRow>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT row_id, org_id, location_id, product_id, quantity, last_updated
            FROM stock_rows
            WHERE org_id = $1 AND location_id = $2
            "#,
        )
        .bind(Uuid::from(org_id))
        .bind(Uuid::from(location_id.0))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("rows_for_location", e))?;

        rows.iter().map(read_stock_row).collect()
    }

    #[instrument(skip(self), fields(org_id = %org_id, product_id = %product_id), err)]
    async fn rows_for_product(
        &self,
        org_id: OrgId,
        product_id: ProductId,
    ) -> Result<Vec<StockRow>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT row_id, org_id, location_id, product_id, quantity, last_updated
            FROM stock_rows
            WHERE org_id = $1 AND product_id = $2
            "#,
        )
        .bind(Uuid::from(org_id))
        .bind(Uuid::from(product_id.0))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("rows_for_product", e))?;

        rows.iter().map(read_stock_row).collect()
    }

    #[instrument(skip(self, row_ids), fields(org_id = %org_id, count = row_ids.len()), err)]
    async fn delete_rows(&self, org_id: OrgId, row_ids: &[Uuid]) -> Result<usize, StoreError> {
        if row_ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("DELETE FROM stock_rows WHERE org_id = $1 AND row_id = ANY($2)")
            .bind(Uuid::from(org_id))
            .bind(row_ids)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_stock_rows", e))?;
        Ok(result.rows_affected() as usize)
    }
}

fn read_stock_row(row: &sqlx::postgres::PgRow) -> Result<StockRow, StoreError> {
    let read = |e: sqlx::Error| StoreError::backend(format!("malformed stock row: {e}"));

    let row_id: Uuid = row.try_get("row_id").map_err(read)?;
    let org_id: Uuid = row.try_get("org_id").map_err(read)?;
    let location_id: Uuid = row.try_get("location_id").map_err(read)?;
    let product_id: Uuid = row.try_get("product_id").map_err(read)?;
    let quantity: i64 = row.try_get("quantity").map_err(read)?;
    let last_updated: DateTime<Utc> = row.try_get("last_updated").map_err(read)?;

    Ok(StockRow {
        row_id,
        org_id: OrgId::from_uuid(org_id),
        location_id: LocationId::new(location_id.into()),
        product_id: ProductId::new(product_id.into()),
        quantity,
        last_updated,
    })
}

/// Transfers in Postgres: the entity is stored whole as JSONB, with a few
/// columns denormalized for filtering.
#[derive(Debug, Clone)]
pub struct PostgresTransferStore {
    pool: Arc<PgPool>,
}

impl PostgresTransferStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl TransferStore for PostgresTransferStore {
    #[instrument(skip(self, transfer), fields(transfer_id = %transfer.id), err)]
    async fn insert(&self, transfer: Transfer) -> Result<(), StoreError> {
        let document = serde_json::to_value(&transfer)
            .map_err(|e| StoreError::backend(format!("serialize transfer: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO transfers (id, org_id, source, destination, status, document, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(Uuid::from(transfer.id.0))
        .bind(Uuid::from(transfer.org_id))
        .bind(Uuid::from(transfer.source.0))
        .bind(Uuid::from(transfer.destination.0))
        .bind(transfer.status.as_str())
        .bind(document)
        .bind(transfer.created_at)
        .bind(transfer.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_transfer", e))?;
        Ok(())
    }

    #[instrument(skip(self, transfer), fields(transfer_id = %transfer.id), err)]
    async fn update(&self, transfer: Transfer) -> Result<(), StoreError> {
        let document = serde_json::to_value(&transfer)
            .map_err(|e| StoreError::backend(format!("serialize transfer: {e}")))?;

        let result = sqlx::query(
            r#"
            UPDATE transfers
            SET status = $3, document = $4, updated_at = $5
            WHERE org_id = $1 AND id = $2
            "#,
        )
        .bind(Uuid::from(transfer.org_id))
        .bind(Uuid::from(transfer.id.0))
        .bind(transfer.status.as_str())
        .bind(document)
        .bind(transfer.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_transfer", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::backend("update of unknown transfer"));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(org_id = %org_id, transfer_id = %id), err)]
    async fn get(&self, org_id: OrgId, id: TransferId) -> Result<Option<Transfer>, StoreError> {
        let row = sqlx::query("SELECT document FROM transfers WHERE org_id = $1 AND id = $2")
            .bind(Uuid::from(org_id))
            .bind(Uuid::from(id.0))
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_transfer", e))?;

        row.map(|r| read_transfer(&r)).transpose()
    }

    #[instrument(skip(self), fields(org_id = %org_id), err)]
    async fn list(
        &self,
        org_id: OrgId,
        location: Option<LocationId>,
    ) -> Result<Vec<Transfer>, StoreError> {
        let location: Option<Uuid> = location.map(|l| Uuid::from(l.0));
        let rows = sqlx::query(
            r#"
            SELECT document
            FROM transfers
            WHERE org_id = $1
                AND ($2::uuid IS NULL OR source = $2 OR destination = $2)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(Uuid::from(org_id))
        .bind(location)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_transfers", e))?;

        rows.iter().map(read_transfer).collect()
    }
}

fn read_transfer(row: &sqlx::postgres::PgRow) -> Result<Transfer, StoreError> {
    let document: serde_json::Value = row
        .try_get("document")
        .map_err(|e| StoreError::backend(format!("malformed transfer row: {e}")))?;
    serde_json::from_value(document)
        .map_err(|e| StoreError::backend(format!("deserialize transfer: {e}")))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("connection pool unavailable in {operation}"))
        }
        sqlx::Error::Io(e) => StoreError::Unavailable(format!("io error in {operation}: {e}")),
        sqlx::Error::Database(db_err) => {
            StoreError::backend(format!("database error in {operation}: {}", db_err.message()))
        }
        other => StoreError::backend(format!("sqlx error in {operation}: {other}")),
    }
}
