//! `crossdock-availability` — the availability guard.
//!
//! A pure decision layer over the stock ledger: answers "can N units of P be
//! removed from L right now" without ever mutating state. Session reservations
//! (quantities already in an in-memory cart) are supplied by the caller; the
//! ledger does not track reservations.

pub mod guard;

pub use guard::{AvailabilityGuard, DebitDecision, DebitError};
