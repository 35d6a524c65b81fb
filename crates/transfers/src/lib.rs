//! `crossdock-transfers` — inter-location stock transfers.
//!
//! A transfer moves stock between two locations in two irreversible steps:
//! debit the source on approval, credit the destination on receipt. The
//! [`Transfer`] entity owns the five-state transition table and role gates;
//! [`TransferWorkflow`] drives transitions and applies ledger side effects
//! item by item.

pub mod store;
pub mod transfer;
pub mod workflow;

pub use store::TransferStore;
pub use transfer::{Transfer, TransferId, TransferItem, TransferStatus};
pub use workflow::{
    ItemOutcome, NewTransfer, NewTransferItem, ReceivedItem, TransferUpdate, TransferWorkflow,
    WorkflowError,
};
