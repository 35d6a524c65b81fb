//! `crossdock-ledger` — the stock ledger.
//!
//! Single source of truth for "how many units of product P exist at location L",
//! tolerant of a storage layer that does not enforce one row per logical key.
//! Every read path reconciles duplicate rows (latest `last_updated` wins); all
//! mutation goes through [`StockLedger::adjust`].

pub mod ledger;
pub mod record;
pub mod store;

pub use ledger::{AdjustMode, CleanupReport, StockLedger};
pub use record::{reconcile, StockKey, StockRow};
pub use store::{StockStore, StoreError};
